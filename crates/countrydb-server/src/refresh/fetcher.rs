// Upstream HTTP client for country facts and exchange rates

use reqwest::{Client, Response};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::RefreshConfig;
use crate::refresh::{RefreshError, Result};

const COUNTRIES_SOURCE: &str = "Countries API";
const EXCHANGE_RATES_SOURCE: &str = "Exchange Rates API";

/// One entry of the country-facts response; every key is optional upstream
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCountry {
    pub name: Option<String>,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: Option<u64>,
    pub flag: Option<String>,
    pub currencies: Option<Vec<RawCurrency>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCurrency {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExchangeRatesResponse {
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
}

/// Client for both upstream sources
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    countries_url: String,
    exchange_rates_url: String,
}

impl UpstreamClient {
    /// Create a client whose requests are bounded by the configured timeout
    pub fn new(config: &RefreshConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("countrydb/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RefreshError::Client)?;

        Ok(Self {
            client,
            countries_url: config.countries_url.clone(),
            exchange_rates_url: config.exchange_rates_url.clone(),
        })
    }

    /// Fetch every country entry
    #[tracing::instrument(skip(self), fields(url = %self.countries_url))]
    pub async fn fetch_countries(&self) -> Result<Vec<RawCountry>> {
        let response = self.get(&self.countries_url, COUNTRIES_SOURCE).await?;
        let countries: Vec<RawCountry> = response.json().await.map_err(RefreshError::Decode)?;

        debug!(count = countries.len(), "Fetched countries");
        Ok(countries)
    }

    /// Fetch the currency code -> rate table (USD base)
    ///
    /// A successful response without a `rates` object yields an empty table.
    #[tracing::instrument(skip(self), fields(url = %self.exchange_rates_url))]
    pub async fn fetch_exchange_rates(&self) -> Result<HashMap<String, f64>> {
        let response = self.get(&self.exchange_rates_url, EXCHANGE_RATES_SOURCE).await?;
        let body: ExchangeRatesResponse = response.json().await.map_err(RefreshError::Decode)?;
        let rates = body.rates.unwrap_or_default();

        debug!(count = rates.len(), "Fetched exchange rates");
        Ok(rates)
    }

    async fn get(&self, url: &str, source: &str) -> Result<Response> {
        let unavailable = || RefreshError::ExternalSource(format!("Could not fetch data from {}", source));

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, source, "Upstream request failed");
            unavailable()
        })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), source, "Upstream returned non-success status");
            return Err(unavailable());
        }

        Ok(response)
    }
}
