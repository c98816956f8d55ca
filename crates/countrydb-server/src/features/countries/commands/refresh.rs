//! Refresh countries command
//!
//! Runs one full refresh cycle: both upstream sources, the store upsert and
//! the summary image, committed together.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::refresh::{RefreshEngine, RefreshError, RefreshSummary};

pub const REFRESH_SUCCESS_MESSAGE: &str = "Refresh successful";

/// Command to run one refresh cycle; the cycle takes no parameters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RefreshCountriesCommand;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshCountriesResponse {
    pub message: String,
    pub total_countries: i64,
    pub last_refreshed_at: DateTime<Utc>,
}

impl From<RefreshSummary> for RefreshCountriesResponse {
    fn from(summary: RefreshSummary) -> Self {
        Self {
            message: REFRESH_SUCCESS_MESSAGE.to_string(),
            total_countries: summary.total_countries,
            last_refreshed_at: summary.last_refreshed_at,
        }
    }
}

impl Request<Result<RefreshCountriesResponse, RefreshError>> for RefreshCountriesCommand {}

#[tracing::instrument(skip(engine))]
pub async fn handle(
    engine: &RefreshEngine,
    _command: RefreshCountriesCommand,
) -> Result<RefreshCountriesResponse, RefreshError> {
    let summary = engine.refresh_all().await?;
    Ok(summary.into())
}
