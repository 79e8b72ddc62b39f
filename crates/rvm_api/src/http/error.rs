use axum::response::{IntoResponse, Response};
use axum::Json;
use common::domain::DomainError;
use http::StatusCode;
use serde_json::json;
use tracing::error;

/// Domain error carried out of a handler
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApiError(error)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            DomainError::DeviceNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::RepositoryError(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match &self.0 {
            DomainError::DeviceNotFound(_) => "NOT_FOUND",
            DomainError::RepositoryError(_) => "STORE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Store internals stay in the logs, not in the response body
        let message = match &self.0 {
            DomainError::RepositoryError(err) => {
                error!("device store failure: {:#}", err);
                "Device store unavailable".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "code": code, "message": message }))).into_response()
    }
}
