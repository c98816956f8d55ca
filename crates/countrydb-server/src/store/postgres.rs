//! PostgreSQL country store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::{
    CountryFilter, CountryOrder, CountryStore, CountryUnitOfWork, StoreError, StoreResult,
};
use crate::models::{Country, CountryRecord, NewCountry};

const SELECT_COUNTRIES: &str = r#"
    SELECT id, name, capital, region, population, currency_code,
           exchange_rate, estimated_gdp, flag_url, last_refreshed_at
    FROM countries
"#;

/// Country store backed by the `countries` table
#[derive(Clone)]
pub struct PgCountryStore {
    pool: PgPool,
}

impl PgCountryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One database transaction
struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CountryUnitOfWork for PgUnitOfWork {
    async fn find_by_name(&mut self, name: &str) -> StoreResult<Option<Country>> {
        let country = sqlx::query_as::<_, Country>(&format!(
            "{} WHERE LOWER(name) = LOWER($1) ORDER BY id LIMIT 1",
            SELECT_COUNTRIES
        ))
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(country)
    }

    async fn insert(
        &mut self,
        record: &CountryRecord,
        refreshed_at: DateTime<Utc>,
    ) -> StoreResult<Country> {
        let country = sqlx::query_as::<_, Country>(
            r#"
            INSERT INTO countries (
                name, capital, region, population, currency_code,
                exchange_rate, estimated_gdp, flag_url, last_refreshed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, capital, region, population, currency_code,
                      exchange_rate, estimated_gdp, flag_url, last_refreshed_at
            "#,
        )
        .bind(&record.name)
        .bind(&record.capital)
        .bind(&record.region)
        .bind(record.population)
        .bind(&record.currency_code)
        .bind(record.exchange_rate)
        .bind(record.estimated_gdp)
        .bind(&record.flag_url)
        .bind(refreshed_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(country)
    }

    async fn update(
        &mut self,
        id: i64,
        record: &CountryRecord,
        refreshed_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE countries
            SET capital = $2,
                region = $3,
                population = $4,
                currency_code = $5,
                exchange_rate = $6,
                estimated_gdp = $7,
                flag_url = $8,
                last_refreshed_at = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&record.capital)
        .bind(&record.region)
        .bind(record.population)
        .bind(&record.currency_code)
        .bind(record.exchange_rate)
        .bind(record.estimated_gdp)
        .bind(&record.flag_url)
        .bind(refreshed_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn top_by_estimated_gdp(&mut self, limit: usize) -> StoreResult<Vec<Country>> {
        let countries = sqlx::query_as::<_, Country>(&format!(
            "{} ORDER BY estimated_gdp DESC NULLS LAST, id LIMIT $1",
            SELECT_COUNTRIES
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(countries)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl CountryStore for PgCountryStore {
    async fn begin(&self) -> StoreResult<Box<dyn CountryUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Country>> {
        let country = sqlx::query_as::<_, Country>(&format!(
            "{} WHERE LOWER(name) = LOWER($1) ORDER BY id LIMIT 1",
            SELECT_COUNTRIES
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(country)
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, filter: &CountryFilter) -> StoreResult<Vec<Country>> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_COUNTRIES);
        query.push(" WHERE TRUE");

        if let Some(ref region) = filter.region {
            query.push(" AND LOWER(region) = LOWER(");
            query.push_bind(region.clone());
            query.push(")");
        }

        if let Some(ref currency_code) = filter.currency_code {
            query.push(" AND LOWER(currency_code) = LOWER(");
            query.push_bind(currency_code.clone());
            query.push(")");
        }

        query.push(match filter.order {
            CountryOrder::Id => " ORDER BY id",
            CountryOrder::GdpAsc => " ORDER BY estimated_gdp ASC NULLS LAST, id",
            CountryOrder::GdpDesc => " ORDER BY estimated_gdp DESC NULLS LAST, id",
        });

        let countries = query
            .build_query_as::<Country>()
            .fetch_all(&self.pool)
            .await?;

        Ok(countries)
    }

    #[tracing::instrument(skip(self, country), fields(name = %country.name))]
    async fn create(&self, country: NewCountry) -> StoreResult<Country> {
        let name = country.name.clone();

        sqlx::query_as::<_, Country>(
            r#"
            INSERT INTO countries (name, capital, region, population, currency_code, flag_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, capital, region, population, currency_code,
                      exchange_rate, estimated_gdp, flag_url, last_refreshed_at
            "#,
        )
        .bind(country.name)
        .bind(country.capital)
        .bind(country.region)
        .bind(country.population)
        .bind(country.currency_code)
        .bind(country.flag_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return StoreError::Duplicate(name);
                }
            }
            StoreError::Sqlx(e)
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_name(&self, name: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM countries WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn latest_refresh(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let latest: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(last_refreshed_at) FROM countries")
                .fetch_one(&self.pool)
                .await?;

        Ok(latest)
    }

    async fn health_check(&self) -> StoreResult<()> {
        crate::db::health_check(&self.pool).await
    }
}
