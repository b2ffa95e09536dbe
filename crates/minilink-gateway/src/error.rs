use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use minilink_core::CoreError;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures a handler turns into an HTTP response.
#[derive(Debug)]
pub enum AppError {
    MissingUrl,
    InvalidUrl,
    InvalidExpiry(i64),
    BadRequest(String),
    NotFound,
    Expired,
    /// Backend failure. Details are logged where they occur and never sent.
    Internal(CoreError),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidUrl(_) => Self::InvalidUrl,
            other => Self::Internal(other),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl | Self::InvalidUrl | Self::InvalidExpiry(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Expired => StatusCode::GONE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MissingUrl => "URL is required".to_string(),
            Self::InvalidUrl => "Invalid URL format".to_string(),
            Self::InvalidExpiry(value) => {
                format!("expires_in must be a non-negative integer, got {value}")
            }
            Self::BadRequest(message) => message.clone(),
            Self::NotFound => "URL not found".to_string(),
            Self::Expired => "URL has expired".to_string(),
            Self::Internal(_) => "An unexpected error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
