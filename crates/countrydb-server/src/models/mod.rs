//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Persisted country row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// Normalized country produced by the refresh pipeline
///
/// Holds every field a refresh overwrites. The id and timestamp are assigned
/// by the store when the record is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
}

/// Manually entered country
///
/// Derived fields (`exchange_rate`, `estimated_gdp`, `last_refreshed_at`)
/// are never accepted from clients and stay empty until a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCountry {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub flag_url: Option<String>,
}

impl Country {
    /// Returns true when `name` refers to this country, ignoring case
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// Overwrite every refreshable field from `record`
    pub fn apply(&mut self, record: &CountryRecord, refreshed_at: DateTime<Utc>) {
        self.capital = record.capital.clone();
        self.region = record.region.clone();
        self.population = record.population;
        self.currency_code = record.currency_code.clone();
        self.exchange_rate = record.exchange_rate;
        self.estimated_gdp = record.estimated_gdp;
        self.flag_url = record.flag_url.clone();
        self.last_refreshed_at = Some(refreshed_at);
    }

    /// Build a fresh row from a refreshed record
    pub fn from_record(id: i64, record: &CountryRecord, refreshed_at: DateTime<Utc>) -> Self {
        let mut country = Self::from_new(
            id,
            NewCountry {
                name: record.name.clone(),
                capital: None,
                region: None,
                population: 0,
                currency_code: None,
                flag_url: None,
            },
        );
        country.apply(record, refreshed_at);
        country
    }

    /// Build a fresh row from a manual entry
    pub fn from_new(id: i64, new: NewCountry) -> Self {
        Self {
            id,
            name: new.name,
            capital: new.capital,
            region: new.region,
            population: new.population,
            currency_code: new.currency_code,
            exchange_rate: None,
            estimated_gdp: None,
            flag_url: new.flag_url,
            last_refreshed_at: None,
        }
    }
}
