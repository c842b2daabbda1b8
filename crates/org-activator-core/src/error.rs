//! Error types for configuration loading and activation runs.

use std::time::Duration;

use org_activator_model::{ModelError, RemoteError};

/// Configuration could not be loaded from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable holds a value that cannot be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },

    /// A variable holds an identifier the model rejects.
    #[error("invalid value for {key}: {source}")]
    Model {
        /// Variable name.
        key: &'static str,
        /// Validation failure.
        #[source]
        source: ModelError,
    },
}

/// An activation run did not complete.
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    /// Cold-start initialization failed; no handler ran.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// A remote call failed with an unrecoverable error.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The handler did not finish before the invocation deadline.
    #[error("handler timed out after {0:?}")]
    TimedOut(Duration),
}

/// Convenience result type for activation runs.
pub type ActivationResult<T> = Result<T, ActivationError>;
