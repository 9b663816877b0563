//! Error types for implore-plotter
//!
//! Only failures that make a plotter unusable are errors. Per-record problems
//! (a missing projection, an unknown category, a stale selection entry) are
//! recovered where they occur and never surface here.

use thiserror::Error;

/// Main error type for plotter operations
#[derive(Error, Debug)]
pub enum PlotterError {
    /// The rendering engine failed to initialize; the plotter is unusable
    #[error("Rendering engine failed to initialize: {0}")]
    EngineInitFailed(#[from] EngineError),

    /// Scheduler misuse (wrong lifecycle state)
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Errors reported by the rendering engine collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No drawing surface could be acquired
    #[error("No drawing surface available")]
    NoSurface,

    /// Backend setup failed (context creation, shader compilation, ...)
    #[error("Engine setup failed: {message}")]
    Setup { message: String },
}

/// Errors related to the update scheduler lifecycle
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    /// Initialization was started twice
    #[error("Engine initialization already started")]
    AlreadyInitializing,

    /// A completion arrived without a matching start
    #[error("No engine initialization in progress")]
    NotInitializing,

    /// The camera was reset before any dataset was accepted
    #[error("Camera bounds are not available yet")]
    BoundsUnavailable,

    /// The engine failed earlier; the plotter is terminal
    #[error("Plotter is in a terminal failure state: {reason}")]
    Terminal { reason: String },
}

/// Errors related to configuration loading and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// A palette entry is not a `#RRGGBB` color
    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failure
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization failure
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type alias for plotter operations
pub type PlotterResult<T> = Result<T, PlotterError>;
