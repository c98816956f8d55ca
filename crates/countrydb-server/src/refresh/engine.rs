// Refresh orchestration: fetch, build, upsert, render, commit

use chrono::{DateTime, SubsecRound, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::RefreshConfig;
use crate::models::CountryRecord;
use crate::refresh::{
    build_record, PendingArtifact, RefreshError, Result, SummaryArtifact, UpstreamClient,
    TOP_COUNTRIES,
};
use crate::store::{CountryStore, CountryUnitOfWork};

/// Outcome of a successful refresh cycle
///
/// `total_countries` counts the entries processed by the cycle, not the rows
/// in the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub total_countries: i64,
    pub last_refreshed_at: DateTime<Utc>,
}

/// Runs refresh cycles against one store
///
/// At most one cycle runs at a time. The lock also owns the RNG used for
/// GDP estimates so draws never interleave between cycles.
pub struct RefreshEngine {
    store: Arc<dyn CountryStore>,
    upstream: UpstreamClient,
    artifact: SummaryArtifact,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl RefreshEngine {
    /// Create an engine with an entropy-seeded RNG
    pub fn new(store: Arc<dyn CountryStore>, config: &RefreshConfig) -> Result<Self> {
        Self::with_rng(store, config, Box::new(StdRng::from_entropy()))
    }

    /// Create an engine drawing GDP multipliers from `rng`
    pub fn with_rng(
        store: Arc<dyn CountryStore>,
        config: &RefreshConfig,
        rng: Box<dyn RngCore + Send>,
    ) -> Result<Self> {
        Ok(Self {
            store,
            upstream: UpstreamClient::new(config)?,
            artifact: SummaryArtifact::new(config.summary_image_path()),
            rng: Mutex::new(rng),
        })
    }

    pub fn summary_image_path(&self) -> &Path {
        self.artifact.path()
    }

    /// Run one full refresh cycle
    ///
    /// Nothing is written unless both sources answer. Every store write and
    /// the rendered image are staged first, and a failure while staging
    /// leaves both exactly as they were.
    ///
    /// Publishing commits the store, then renames the image into place. The
    /// rename is the one step that can fail after the rows are committed; the
    /// previous image stays published and the cycle reports the I/O error.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_all(&self) -> Result<RefreshSummary> {
        let mut rng = self.rng.try_lock().map_err(|_| RefreshError::InProgress)?;

        info!("Starting refresh cycle");

        let raw_countries = self.upstream.fetch_countries().await?;
        let rates = self.upstream.fetch_exchange_rates().await?;

        // Postgres keeps microseconds; truncating keeps the stored value equal to the returned one
        let refreshed_at = Utc::now().trunc_subsecs(6);

        let records = raw_countries
            .iter()
            .map(|raw| build_record(raw, &rates, &mut *rng))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            countries = records.len(),
            rates = rates.len(),
            "Built country records"
        );

        let mut uow = self.store.begin().await?;
        let staged = match self.stage(uow.as_mut(), &records, refreshed_at).await {
            Ok(staged) => staged,
            Err(e) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed refresh also failed");
                }
                return Err(e);
            },
        };

        let (total_countries, pending) = staged;
        uow.commit().await?;
        if let Err(e) = pending.commit() {
            error!(
                error = %e,
                total_countries,
                last_refreshed_at = %refreshed_at,
                "Store committed but summary image was not published"
            );
            return Err(e.into());
        }

        info!(
            total_countries,
            last_refreshed_at = %refreshed_at,
            "Refresh cycle completed"
        );

        Ok(RefreshSummary {
            total_countries,
            last_refreshed_at: refreshed_at,
        })
    }

    /// Apply every record and render the summary image without publishing either
    async fn stage(
        &self,
        uow: &mut dyn CountryUnitOfWork,
        records: &[CountryRecord],
        refreshed_at: DateTime<Utc>,
    ) -> Result<(i64, PendingArtifact)> {
        let mut inserted = 0usize;
        let mut updated = 0usize;

        for record in records {
            match uow.find_by_name(&record.name).await? {
                Some(existing) => {
                    uow.update(existing.id, record, refreshed_at).await?;
                    updated += 1;
                },
                None => {
                    uow.insert(record, refreshed_at).await?;
                    inserted += 1;
                },
            }
        }

        debug!(inserted, updated, "Upserted country records");

        let total = i64::try_from(records.len()).unwrap_or(i64::MAX);
        let top = uow.top_by_estimated_gdp(TOP_COUNTRIES).await?;

        let artifact = self.artifact.clone();
        let pending =
            tokio::task::spawn_blocking(move || artifact.generate(total, &top, refreshed_at))
                .await??;

        Ok((total, pending))
    }
}
