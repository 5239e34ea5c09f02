use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

// Response bodies
const INTERNAL_SERVER_ERROR_BODY: &str = "internal server error";

/// Errors raised while answering a single time request
#[derive(Debug, thiserror::Error)]
pub enum TimeServerError {
    #[error("timezone: {timezone:?} is invalid")]
    InvalidTimezone { timezone: String },
    #[error("failed to serialize time report: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TimeServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TimeServerError::InvalidTimezone { .. } => StatusCode::NOT_FOUND,
            TimeServerError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TimeServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            TimeServerError::InvalidTimezone { .. } => {
                tracing::warn!(error = %self, "rejecting request");
                (status, self.to_string()).into_response()
            }
            TimeServerError::Serialization(ref source) => {
                tracing::error!(error = %source, "failed to encode response");
                (status, INTERNAL_SERVER_ERROR_BODY).into_response()
            }
        }
    }
}

/// Process-level errors: configuration, listener and lifecycle failures
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid base path: {path:?}. Expected a prefix such as '/api'")]
    InvalidBasePath { path: String },
    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
    #[error("Shutdown did not complete within {timeout:?}, {remaining} connection(s) aborted")]
    DrainTimeout { timeout: Duration, remaining: usize },
    #[error("Server stopped without a shutdown request")]
    Stopped,
    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    /// Logging initialization failed
    #[error("Logging initialization failed: {0}")]
    LoggingInitialization(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type TimeServerResult<T> = Result<T, TimeServerError>;
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_timezone_maps_to_not_found() {
        let error = TimeServerError::InvalidTimezone {
            timezone: "Invalid/Zone".to_string(),
        };

        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), r#"timezone: "Invalid/Zone" is invalid"#);

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_serialization_error_hides_detail() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = TimeServerError::from(source);

        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_serialization_error_body_is_generic() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let response = TimeServerError::from(source).into_response();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], INTERNAL_SERVER_ERROR_BODY.as_bytes());
    }

    #[test]
    fn test_drain_timeout_message() {
        let error = ServiceError::DrainTimeout {
            timeout: Duration::from_secs(30),
            remaining: 2,
        };
        assert!(error.to_string().contains("30s"));
        assert!(error.to_string().contains("2 connection(s)"));
    }
}
