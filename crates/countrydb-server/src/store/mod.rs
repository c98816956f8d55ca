//! Country persistence
//!
//! The refresh pipeline and the HTTP features talk to storage through
//! [`CountryStore`]. Writes made by a refresh cycle go through a
//! [`CountryUnitOfWork`] so the whole cycle commits or rolls back as one.
//!
//! Two implementations ship with the server:
//! - [`PgCountryStore`]: PostgreSQL via SQLx, one database transaction per unit of work
//! - [`MemoryCountryStore`]: snapshot-and-swap over an in-process table, one writer at a time

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Country, CountryRecord, NewCountry};

pub mod memory;
pub mod postgres;

pub use memory::MemoryCountryStore;
pub use postgres::PgCountryStore;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A country with the same name (ignoring case) already exists
    #[error("Country '{0}' already exists")]
    Duplicate(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ordering for country listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountryOrder {
    /// Insertion order (by id)
    #[default]
    Id,
    GdpAsc,
    GdpDesc,
}

impl CountryOrder {
    /// Parse the `sort` query parameter; unknown values keep the default order
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("gdp_desc") => CountryOrder::GdpDesc,
            Some("gdp_asc") => CountryOrder::GdpAsc,
            _ => CountryOrder::Id,
        }
    }
}

/// Listing filter; string filters match exactly, ignoring case
#[derive(Debug, Clone, Default)]
pub struct CountryFilter {
    pub region: Option<String>,
    pub currency_code: Option<String>,
    pub order: CountryOrder,
}

impl CountryFilter {
    pub fn matches(&self, country: &Country) -> bool {
        fn eq_ignore_case(value: &Option<String>, wanted: &Option<String>) -> bool {
            match wanted {
                None => true,
                Some(wanted) => value
                    .as_deref()
                    .is_some_and(|v| v.to_lowercase() == wanted.to_lowercase()),
            }
        }

        eq_ignore_case(&country.region, &self.region)
            && eq_ignore_case(&country.currency_code, &self.currency_code)
    }
}

/// Transactional batch of refresh writes
///
/// Reads see the writes already made through the same unit of work.
/// Dropping a unit of work without calling [`commit`](Self::commit)
/// discards every write.
#[async_trait]
pub trait CountryUnitOfWork: Send {
    /// Case-insensitive lookup by name
    async fn find_by_name(&mut self, name: &str) -> StoreResult<Option<Country>>;

    async fn insert(
        &mut self,
        record: &CountryRecord,
        refreshed_at: DateTime<Utc>,
    ) -> StoreResult<Country>;

    /// Overwrite every refreshable field of the row with `id`
    async fn update(
        &mut self,
        id: i64,
        record: &CountryRecord,
        refreshed_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Highest `estimated_gdp` first; rows without a value rank last, ties by id
    async fn top_by_estimated_gdp(&mut self, limit: usize) -> StoreResult<Vec<Country>>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Country storage backend
#[async_trait]
pub trait CountryStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn CountryUnitOfWork>>;

    /// Case-insensitive lookup by name
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Country>>;

    async fn list(&self, filter: &CountryFilter) -> StoreResult<Vec<Country>>;

    /// Insert a manually entered country; fails with [`StoreError::Duplicate`]
    /// when the name is already taken
    async fn create(&self, country: NewCountry) -> StoreResult<Country>;

    /// Returns false when no country matched
    async fn delete_by_name(&self, name: &str) -> StoreResult<bool>;

    async fn count(&self) -> StoreResult<i64>;

    /// Most recent `last_refreshed_at` across all rows
    async fn latest_refresh(&self) -> StoreResult<Option<DateTime<Utc>>>;

    async fn health_check(&self) -> StoreResult<()>;
}

/// Sort `countries` the way [`CountryUnitOfWork::top_by_estimated_gdp`] ranks them
pub(crate) fn rank_by_estimated_gdp(countries: &mut [Country]) {
    countries.sort_by(|a, b| match (a.estimated_gdp, b.estimated_gdp) {
        (Some(x), Some(y)) => y.total_cmp(&x).then(a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
}
