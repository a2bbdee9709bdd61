//! Error handling for sdrvis-rs
//!
//! This module defines the crate-wide error type and a Result alias. Graph
//! level failures live in [`crate::pipeline::PipelineError`] and convert into
//! [`SdrError::Pipeline`].

use crate::pipeline::PipelineError;
use thiserror::Error;

/// Main error type for sdrvis-rs operations
#[derive(Error, Debug)]
pub enum SdrError {
    /// The front-end reported no gain stages
    #[error("Device not found: the front-end reported no gain stages")]
    DeviceNotFound,

    /// The audio sink could not be opened
    #[error("Audio error: {0}")]
    AudioSink(String),

    /// A rate was zero when ratio or offset math was attempted
    #[error("Degenerate rate: {numerator}/{denominator}")]
    DegenerateRate { numerator: u64, denominator: u64 },

    /// A mode name that does not match any demodulation mode
    #[error("Unrecognized mode: {0:?}")]
    UnrecognizedMode(String),

    /// A user entry that could not be parsed as a number
    #[error("Invalid entry: {0:?}")]
    InvalidEntry(String),

    /// Front-end control failures
    #[error("Front-end error: {0}")]
    FrontEnd(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from the stage graph
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SdrError>,
    },
}

impl SdrError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SdrError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error should be shown to the user as a blocking notification.
    ///
    /// Arithmetic guards are handled locally and never surface.
    pub fn is_user_facing(&self) -> bool {
        match self {
            SdrError::DeviceNotFound | SdrError::AudioSink(_) | SdrError::FrontEnd(_) => true,
            SdrError::WithContext { source, .. } => source.is_user_facing(),
            _ => false,
        }
    }

    /// An error of the same kind and message, for reporting a stored failure again.
    pub fn replay(&self) -> SdrError {
        match self {
            SdrError::DeviceNotFound => SdrError::DeviceNotFound,
            SdrError::AudioSink(msg) => SdrError::AudioSink(msg.clone()),
            SdrError::DegenerateRate {
                numerator,
                denominator,
            } => SdrError::DegenerateRate {
                numerator: *numerator,
                denominator: *denominator,
            },
            SdrError::UnrecognizedMode(name) => SdrError::UnrecognizedMode(name.clone()),
            SdrError::InvalidEntry(text) => SdrError::InvalidEntry(text.clone()),
            SdrError::FrontEnd(msg) => SdrError::FrontEnd(msg.clone()),
            SdrError::Config(msg) => SdrError::Config(msg.clone()),
            SdrError::Pipeline(e) => SdrError::Pipeline(e.clone()),
            SdrError::Io(e) => SdrError::Io(std::io::Error::new(e.kind(), e.to_string())),
            SdrError::Serialization(msg) => SdrError::Serialization(msg.clone()),
            SdrError::WithContext { context, source } => SdrError::WithContext {
                context: context.clone(),
                source: Box::new(source.replay()),
            },
        }
    }
}

/// Result type alias for sdrvis-rs operations
pub type Result<T> = std::result::Result<T, SdrError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
