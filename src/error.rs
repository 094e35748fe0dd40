//! Error types for the evaluation client.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, RagEvalError>;

/// Errors that can occur while driving the evaluation service.
///
/// Cloneable so a single hydration outcome can be handed to every caller
/// waiting on the same request.
#[derive(Error, Debug, Clone)]
pub enum RagEvalError {
    /// A required identifier or field is missing or invalid. Detected before
    /// any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The session or entity does not exist on the server.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service answered with a non-success status.
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The file was refused by the local type check. No request was sent.
    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    /// The request never produced a response.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// A success response whose body could not be decoded.
    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),

    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Error during serialization/deserialization of local state.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The response arrived after a newer session operation and was dropped.
    #[error("Discarded stale response: {0}")]
    Superseded(String),

    /// The workflow is not in a state that allows the requested action.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl RagEvalError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for errors that mean "the thing is gone", as opposed to a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for errors raised locally without contacting the service.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::UploadRejected(_) | Self::InvalidState(_)
        )
    }
}

impl From<reqwest::Error> for RagEvalError {
    fn from(err: reqwest::Error) -> Self {
        RagEvalError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for RagEvalError {
    fn from(err: serde_json::Error) -> Self {
        RagEvalError::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_errors() {
        assert!(RagEvalError::validation("missing id").is_local());
        assert!(RagEvalError::UploadRejected("notes.txt".into()).is_local());
        assert!(
            !RagEvalError::Service {
                status: 500,
                message: "boom".into()
            }
            .is_local()
        );
    }

    #[test]
    fn test_service_error_display() {
        let err = RagEvalError::Service {
            status: 422,
            message: "num_chunks must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "Service error (422): num_chunks must be positive"
        );
    }

    #[test]
    fn test_io_error_is_clone() {
        let err = RagEvalError::io(
            "/tmp/session.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let copy = err.clone();
        assert!(copy.to_string().contains("/tmp/session.json"));
    }
}
