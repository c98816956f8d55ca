//! API response types
//!
//! Every error leaves the server as `{"error": "...", "details": ...}`;
//! `details` is omitted when there is nothing to add.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
pub const VALIDATION_FAILED: &str = "Validation failed";

/// Standard error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<serde_json::Value>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }

    /// Field name -> message map under the "Validation failed" envelope
    pub fn validation(fields: &BTreeMap<String, String>) -> Self {
        let details = fields
            .iter()
            .map(|(field, message)| (field.clone(), serde_json::Value::from(message.as_str())))
            .collect::<serde_json::Map<_, _>>();
        Self::with_details(VALIDATION_FAILED, details)
    }

    /// Generic 500 body; the cause is only logged
    pub fn internal() -> Self {
        Self::new(INTERNAL_SERVER_ERROR)
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
