//! Engine error types

use thiserror::Error;

/// Errors surfaced by engine operations
///
/// Blocked advances and per-artifact generation failures are not errors;
/// they come back as structured responses (an `AdvanceResponse` with
/// `success: false`, a `GenerationWarning`).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Channel error")]
    ChannelError,
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Build a configuration error from anything displayable
    pub fn config(msg: impl std::fmt::Display) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// Remediation hints shown alongside the error message
    pub fn recommendations(&self) -> Vec<String> {
        match self {
            Self::Configuration(_) => vec![
                "Fix the session or constraint configuration and start the session again".to_string(),
                "Constraint configuration must be a list of constraint definitions".to_string(),
            ],
            Self::NotFound(_) => vec!["Start a new session".to_string()],
            Self::InvalidTransition(_) => vec!["Check the session status before retrying".to_string()],
            Self::ChannelError => vec!["Restart the session manager".to_string()],
        }
    }

    /// Whether the caller can recover without restarting the process
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ChannelError)
    }

    /// Convert into the uniform failure shape
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            kind: self.kind().to_string(),
            message: self.to_string(),
            recommendations: self.recommendations(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::NotFound(_) => "not-found",
            Self::InvalidTransition(_) => "invalid-transition",
            Self::ChannelError => "channel",
        }
    }
}

/// Serializable failure returned to callers
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
    pub recommendations: Vec<String>,
}
