// ABOUTME: Shared API response types and error handling
// ABOUTME: Provides consistent response format across all API endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
};
use serde::Serialize;
use tracing::error;

use taskhive_core::DomainError;
use taskhive_storage::StorageError;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Handler error carrying the domain taxonomy to the HTTP boundary.
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError(DomainError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self.0 {
            DomainError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            DomainError::Forbidden(_) => (StatusCode::FORBIDDEN, self.0.to_string()),
            DomainError::Validation(_) | DomainError::InvalidState(_) => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            DomainError::Internal(detail) => {
                // Logged once here; the client only sees a generic message.
                error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, ResponseJson(ApiResponse::<()>::error(message))).into_response()
    }
}
