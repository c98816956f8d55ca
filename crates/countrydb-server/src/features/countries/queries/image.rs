use mediator::Request;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

/// Query for the most recently published summary image
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GetSummaryImageQuery;

#[derive(Debug, thiserror::Error)]
pub enum GetSummaryImageError {
    #[error("Summary image not found")]
    NotFound,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Request<Result<Vec<u8>, GetSummaryImageError>> for GetSummaryImageQuery {}

/// Read the published summary image at `path`
#[tracing::instrument]
pub async fn handle(
    path: &Path,
    _query: GetSummaryImageQuery,
) -> Result<Vec<u8>, GetSummaryImageError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(GetSummaryImageError::NotFound),
        Err(e) => Err(e.into()),
    }
}
