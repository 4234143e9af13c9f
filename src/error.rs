//! Error types for the crate

use thiserror::Error;

/// Main error type
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A hyperparameter or discretization setting is out of range
    #[error("invalid configuration for `{parameter}` = {value}: {reason}")]
    Configuration {
        parameter: String,
        value: String,
        reason: String,
    },

    /// A call arrived in a lifecycle state that cannot accept it
    #[error("orchestrator protocol violation: expected {expected}, but episode is {found}")]
    OrchestratorState {
        expected: &'static str,
        found: &'static str,
    },

    #[error("no training session has been recorded")]
    NoSession,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn configuration(
        parameter: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::Configuration {
            parameter: parameter.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
