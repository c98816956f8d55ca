use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::Country;
use crate::store::{CountryStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCountryQuery {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetCountryError {
    #[error("Country '{0}' not found")]
    NotFound(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<Country, GetCountryError>> for GetCountryQuery {}

/// Look a country up by name, ignoring case
#[tracing::instrument(skip(store))]
pub async fn handle(
    store: Arc<dyn CountryStore>,
    query: GetCountryQuery,
) -> Result<Country, GetCountryError> {
    store
        .find_by_name(&query.name)
        .await?
        .ok_or(GetCountryError::NotFound(query.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCountry;
    use crate::store::MemoryCountryStore;

    #[tokio::test]
    async fn test_handle_ignores_case() {
        let store: Arc<dyn CountryStore> = Arc::new(MemoryCountryStore::new());
        store
            .create(NewCountry {
                name: "Nigeria".to_string(),
                capital: Some("Abuja".to_string()),
                region: Some("Africa".to_string()),
                population: 206_139_589,
                currency_code: Some("NGN".to_string()),
                flag_url: None,
            })
            .await
            .unwrap();

        let found = handle(
            store.clone(),
            GetCountryQuery {
                name: "nIgErIa".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(found.capital.as_deref(), Some("Abuja"));

        let missing = handle(
            store,
            GetCountryQuery {
                name: "Niger".to_string(),
            },
        )
        .await;
        assert!(matches!(missing, Err(GetCountryError::NotFound(_))));
    }
}
