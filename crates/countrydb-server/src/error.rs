//! Server-wide error type for handlers outside the feature slices

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::store::StoreError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Store(ref e) => {
                tracing::error!("Store error: {}", e);
                ErrorResponse::internal().into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
            AppError::NotFound(message) => {
                ErrorResponse::new(message).into_response_with(StatusCode::NOT_FOUND)
            },
            AppError::Unavailable(message) => {
                tracing::warn!("Service unavailable: {}", message);
                ErrorResponse::with_details("Service unavailable", message)
                    .into_response_with(StatusCode::SERVICE_UNAVAILABLE)
            },
        }
    }
}
