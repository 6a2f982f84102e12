//! Error types for the toolbox engine.

use thiserror::Error;

/// Why an action could not be turned into a command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Parameter '{name}' has disallowed value '{value}'")]
    InvalidParameter { name: String, value: String },
}

impl ResolveError {
    /// Short machine-readable code for front ends
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::UnknownAction(_) => "unknown_action",
            ResolveError::MissingParameter(_) => "missing_parameter",
            ResolveError::InvalidParameter { .. } => "invalid_parameter",
        }
    }
}
