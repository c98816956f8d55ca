//! In-process country store
//!
//! Used by the test suites and for running the server without a database
//! (`COUNTRYDB_STORE=memory`). A unit of work clones the table, applies its
//! writes to the copy and swaps the copy in on commit. It holds the store's
//! writer lock until it ends, so manual creates and deletes wait for it
//! instead of being overwritten by the swap.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::{
    rank_by_estimated_gdp, CountryFilter, CountryOrder, CountryStore, CountryUnitOfWork,
    StoreError, StoreResult,
};
use crate::models::{Country, CountryRecord, NewCountry};

#[derive(Debug, Default, Clone)]
struct Table {
    rows: Vec<Country>,
    next_id: i64,
}

impl Table {
    fn find(&self, name: &str) -> Option<&Country> {
        self.rows.iter().find(|c| c.matches_name(name))
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared in-memory table; clones share the same data
#[derive(Debug, Default, Clone)]
pub struct MemoryCountryStore {
    table: Arc<Mutex<Table>>,
    writer: Arc<AsyncMutex<()>>,
}

impl MemoryCountryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every row in id order
    pub fn rows(&self) -> Vec<Country> {
        self.lock().rows.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        // A poisoned table still holds consistent rows: writers only swap whole tables
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct MemoryUnitOfWork {
    store: MemoryCountryStore,
    working: Table,
    _writer: OwnedMutexGuard<()>,
}

#[async_trait]
impl CountryUnitOfWork for MemoryUnitOfWork {
    async fn find_by_name(&mut self, name: &str) -> StoreResult<Option<Country>> {
        Ok(self.working.find(name).cloned())
    }

    async fn insert(
        &mut self,
        record: &CountryRecord,
        refreshed_at: DateTime<Utc>,
    ) -> StoreResult<Country> {
        if self.working.find(&record.name).is_some() {
            return Err(StoreError::Duplicate(record.name.clone()));
        }
        let id = self.working.allocate_id();
        let country = Country::from_record(id, record, refreshed_at);
        self.working.rows.push(country.clone());
        Ok(country)
    }

    async fn update(
        &mut self,
        id: i64,
        record: &CountryRecord,
        refreshed_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        if let Some(country) = self.working.rows.iter_mut().find(|c| c.id == id) {
            country.apply(record, refreshed_at);
        }
        Ok(())
    }

    async fn top_by_estimated_gdp(&mut self, limit: usize) -> StoreResult<Vec<Country>> {
        let mut ranked = self.working.rows.clone();
        rank_by_estimated_gdp(&mut ranked);
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryUnitOfWork { store, working, _writer } = *self;
        *store.lock() = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CountryStore for MemoryCountryStore {
    async fn begin(&self) -> StoreResult<Box<dyn CountryUnitOfWork>> {
        let writer = self.writer.clone().lock_owned().await;
        let working = self.lock().clone();
        Ok(Box::new(MemoryUnitOfWork {
            store: self.clone(),
            working,
            _writer: writer,
        }))
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Country>> {
        Ok(self.lock().find(name).cloned())
    }

    async fn list(&self, filter: &CountryFilter) -> StoreResult<Vec<Country>> {
        let mut countries: Vec<Country> = self
            .lock()
            .rows
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();

        match filter.order {
            CountryOrder::Id => countries.sort_by_key(|c| c.id),
            CountryOrder::GdpDesc => rank_by_estimated_gdp(&mut countries),
            CountryOrder::GdpAsc => countries.sort_by(|a, b| match (a.estimated_gdp, b.estimated_gdp) {
                (Some(x), Some(y)) => x.total_cmp(&y).then(a.id.cmp(&b.id)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.id.cmp(&b.id),
            }),
        }

        Ok(countries)
    }

    async fn create(&self, country: NewCountry) -> StoreResult<Country> {
        let _writer = self.writer.lock().await;
        let mut table = self.lock();
        if table.find(&country.name).is_some() {
            return Err(StoreError::Duplicate(country.name));
        }
        let id = table.allocate_id();
        let created = Country::from_new(id, country);
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn delete_by_name(&self, name: &str) -> StoreResult<bool> {
        let _writer = self.writer.lock().await;
        let mut table = self.lock();
        let before = table.rows.len();
        table.rows.retain(|c| !c.matches_name(name));
        Ok(table.rows.len() != before)
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.lock().rows.len() as i64)
    }

    async fn latest_refresh(&self) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self.lock().rows.iter().filter_map(|c| c.last_refreshed_at).max())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
