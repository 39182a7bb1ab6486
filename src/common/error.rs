//! # Pipeline Errors
//!
//! Every stage of the checker returns [`PipelineError`] instead of aborting the
//! process. The HTTP layer maps each kind to a response status so a failing
//! upload only ends its own request.
//!
//! | Kind       | Raised by                                   | Status |
//! |------------|---------------------------------------------|--------|
//! | `Input`    | bad filename, non-PNG upload                | 400    |
//! | `Config`   | missing or invalid settings                 | 500    |
//! | `Remote`   | classification / storage transport failures | 502    |
//! | `Parse`    | unexpected classification response shape    | 500    |
//! | `Artifact` | temporary file I/O                          | 500    |

use axum::http::StatusCode;
use thiserror::Error;

/// Tagged failure of one pipeline invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed upload, wrong format or unusable filename.
    #[error("invalid upload: {0}")]
    Input(String),

    /// A required setting is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failure or non-success reply from a remote collaborator.
    #[error("{service} request failed: {reason}")]
    Remote {
        /// Which collaborator failed ("classification" or "storage")
        service: &'static str,
        reason: String,
    },

    /// The classification service replied with an unexpected shape.
    #[error("unexpected classification response: {0}")]
    Parse(String),

    /// The temporary artifact could not be written or read back.
    #[error("temporary artifact error: {0}")]
    Artifact(#[from] std::io::Error),
}

impl PipelineError {
    pub fn remote(service: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::Remote {
            service,
            reason: reason.into(),
        }
    }

    /// Short machine-readable name used in error response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Input(_) => "input",
            PipelineError::Config(_) => "config",
            PipelineError::Remote { .. } => "remote",
            PipelineError::Parse(_) => "parse",
            PipelineError::Artifact(_) => "artifact",
        }
    }

    /// HTTP status returned to the uploader for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Input(_) => StatusCode::BAD_REQUEST,
            PipelineError::Remote { .. } => StatusCode::BAD_GATEWAY,
            PipelineError::Config(_) | PipelineError::Parse(_) | PipelineError::Artifact(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            PipelineError::Input("jpeg".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PipelineError::remote("storage", "connection refused").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            PipelineError::Parse("no responses".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PipelineError::Config("missing key".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_remote_message_names_service() {
        let err = PipelineError::remote("classification", "status 403");
        assert_eq!(err.to_string(), "classification request failed: status 403");
        assert_eq!(err.kind(), "remote");
    }
}
