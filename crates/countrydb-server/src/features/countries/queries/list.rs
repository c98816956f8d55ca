use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::Country;
use crate::store::{CountryFilter, CountryOrder, CountryStore, StoreError};

/// Query string of `GET /countries`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCountriesQuery {
    pub region: Option<String>,
    /// Currency code
    pub currency: Option<String>,
    /// `gdp_desc` or `gdp_asc`; anything else keeps id order
    pub sort: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListCountriesError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ListCountriesQuery {
    pub fn filter(&self) -> CountryFilter {
        fn non_empty(value: &Option<String>) -> Option<String> {
            value.clone().filter(|v| !v.trim().is_empty())
        }

        CountryFilter {
            region: non_empty(&self.region),
            currency_code: non_empty(&self.currency),
            order: CountryOrder::from_param(self.sort.as_deref()),
        }
    }
}

impl Request<Result<Vec<Country>, ListCountriesError>> for ListCountriesQuery {}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: Arc<dyn CountryStore>,
    query: ListCountriesQuery,
) -> Result<Vec<Country>, ListCountriesError> {
    Ok(store.list(&query.filter()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_query() {
        let query = ListCountriesQuery {
            region: Some("Africa".to_string()),
            currency: Some("".to_string()),
            sort: Some("gdp_desc".to_string()),
        };
        let filter = query.filter();

        assert_eq!(filter.region.as_deref(), Some("Africa"));
        assert_eq!(filter.currency_code, None);
        assert_eq!(filter.order, CountryOrder::GdpDesc);
    }

    #[test]
    fn test_default_query_lists_everything_by_id() {
        let filter = ListCountriesQuery::default().filter();
        assert_eq!(filter.region, None);
        assert_eq!(filter.order, CountryOrder::Id);
    }
}
