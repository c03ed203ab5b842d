use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::application::AppError;

/// An error answered to an HTTP client as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Wallet not found")
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidAmount(_) => Self::bad_request("Invalid amount"),
            AppError::InvalidCurrency(_) => {
                Self::bad_request("Currency must be a 3-letter ISO code")
            }
            AppError::InsufficientFunds { .. } => Self::bad_request("Insufficient funds"),
            AppError::WalletNotFound(_) => Self::not_found(),
            AppError::DuplicateWalletId(_) | AppError::Storage(_) => {
                tracing::error!(error = %err, retryable = err.is_retryable(), "storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
