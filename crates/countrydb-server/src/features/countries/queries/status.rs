use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::{CountryStore, StoreError};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GetStatusQuery;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub total_countries: i64,
    /// Most recent refresh across all rows; `null` before the first refresh
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<StatusResponse, StatusError>> for GetStatusQuery {}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: Arc<dyn CountryStore>,
    _query: GetStatusQuery,
) -> Result<StatusResponse, StatusError> {
    let total_countries = store.count().await?;
    let last_refreshed_at = store.latest_refresh().await?;

    Ok(StatusResponse {
        total_countries,
        last_refreshed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCountryStore;

    #[tokio::test]
    async fn test_empty_store_status() {
        let store: Arc<dyn CountryStore> = Arc::new(MemoryCountryStore::new());
        let status = handle(store, GetStatusQuery).await.unwrap();

        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({"total_countries": 0, "last_refreshed_at": null})
        );
    }
}
