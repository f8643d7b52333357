//! Error taxonomy shared by the selection, recording and stats paths.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for storage collaborators
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or malformed required field; nothing was recorded
    #[error("{0}")]
    Validation(String),

    /// No eligible character, or unknown character id
    #[error("{0}")]
    NotFound(String),

    /// Storage could not be reached; the caller may retry
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl CoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Failures raised by storage backends
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("unknown character {0}")]
    UnknownCharacter(crate::types::CharacterId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid data: {0}")]
    Invalid(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownCharacter(id) => {
                CoreError::NotFound(format!("Character {} not found", id))
            }
            StoreError::Invalid(msg) => CoreError::Validation(msg),
            other => CoreError::StorageUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            CoreError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CoreError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CoreError::StorageUnavailable("x".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let err: CoreError = StoreError::UnknownCharacter(9).into();
        assert!(matches!(err, CoreError::NotFound(_)));

        let err: CoreError = StoreError::Unavailable("down".into()).into();
        assert!(matches!(err, CoreError::StorageUnavailable(_)));
        assert!(err.to_string().contains("down"));
    }
}
