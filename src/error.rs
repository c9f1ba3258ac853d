//! Error types for tickloop
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in tickloop
#[derive(Debug, Error)]
pub enum LoopError {
    /// Interval or tick rate is zero, negative, or not finite
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Start was called outside of a tokio runtime
    #[error("No tokio runtime available to spawn the ticking task")]
    NoRuntime,

    /// The ticking task was terminated by a panic in the update callback
    #[error("Update callback panicked: {0}")]
    CallbackPanicked(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for tickloop operations
pub type Result<T> = std::result::Result<T, LoopError>;
