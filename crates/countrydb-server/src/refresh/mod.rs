// Country refresh pipeline
//
// Pulls country facts and USD exchange rates from two upstream sources,
// joins them by currency code, upserts the result into the country store
// and renders the summary image, all inside one unit of work.
//
// Architecture:
// - fetcher: HTTP client for both upstream sources (pure I/O)
// - builder: raw entry + rate table -> normalized record (estimated GDP lives here)
// - summary: fixed-layout PNG of the refreshed catalog
// - engine: orchestration, single-flight guard, commit/rollback
//
// Upstream sources:
// - Countries: https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies
// - Exchange rates: https://open.er-api.com/v6/latest/USD

pub mod builder;
pub mod engine;
pub mod fetcher;
pub mod summary;

pub use builder::{build_record, estimate_gdp, GDP_MULTIPLIER_RANGE};
pub use engine::{RefreshEngine, RefreshSummary};
pub use fetcher::{RawCountry, RawCurrency, UpstreamClient};
pub use summary::{PendingArtifact, SummaryArtifact, SummaryError};

use crate::store::StoreError;

/// Number of countries ranked in the summary image
pub const TOP_COUNTRIES: usize = 5;

/// Result type for refresh operations
pub type Result<T> = std::result::Result<T, RefreshError>;

/// Error types for the refresh pipeline
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// An upstream source answered with a non-success status or could not be reached
    #[error("{0}")]
    ExternalSource(String),

    /// Another refresh cycle currently holds the refresh lock
    #[error("A refresh is already in progress")]
    InProgress,

    #[error("Malformed country entry: {0}")]
    MalformedEntry(String),

    #[error("Could not decode upstream response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Summary image error: {0}")]
    Summary(#[from] SummaryError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl RefreshError {
    /// True when the failure should be reported as "service unavailable"
    pub fn is_external(&self) -> bool {
        matches!(self, RefreshError::ExternalSource(_))
    }
}
