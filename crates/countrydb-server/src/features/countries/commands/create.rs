//! Create country command
//!
//! Manual entry of a country. Derived fields (`exchange_rate`,
//! `estimated_gdp`, `last_refreshed_at`) are not accepted here and stay empty
//! until the next refresh fills them in.

use mediator::Request;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{Country, NewCountry};
use crate::store::{CountryStore, StoreError};

/// Command to create a new country
///
/// Every field is optional at the wire level so that validation can report
/// all missing fields at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCountryCommand {
    pub name: Option<String>,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: Option<i64>,
    pub currency_code: Option<String>,
    pub flag_url: Option<String>,
}

/// Errors that can occur when creating a country
#[derive(Debug, thiserror::Error)]
pub enum CreateCountryError {
    /// Field name -> message for every failed check
    #[error("Validation failed: {0:?}")]
    Validation(BTreeMap<String, String>),
    #[error("Country '{0}' already exists")]
    Duplicate(String),
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CreateCountryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(name) => Self::Duplicate(name),
            other => Self::Store(other),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl CreateCountryCommand {
    /// Validates the command, collecting every failure
    ///
    /// # Errors
    ///
    /// - `Validation` - `name` blank or missing, `population` missing or
    ///   negative, `currency_code` blank or missing
    pub fn validate(&self) -> Result<NewCountry, CreateCountryError> {
        let mut errors = BTreeMap::new();

        let name = non_blank(&self.name);
        if name.is_none() {
            errors.insert("name".to_string(), "is required".to_string());
        }

        match self.population {
            None => {
                errors.insert("population".to_string(), "is required".to_string());
            },
            Some(p) if p < 0 => {
                errors.insert("population".to_string(), "must not be negative".to_string());
            },
            Some(_) => {},
        }

        let currency_code = non_blank(&self.currency_code);
        if currency_code.is_none() {
            errors.insert("currency_code".to_string(), "is required".to_string());
        }

        match (name, self.population) {
            (Some(name), Some(population)) if errors.is_empty() => Ok(NewCountry {
                name,
                capital: self.capital.clone(),
                region: self.region.clone(),
                population,
                currency_code,
                flag_url: self.flag_url.clone(),
            }),
            _ => Err(CreateCountryError::Validation(errors)),
        }
    }
}

impl Request<Result<Country, CreateCountryError>> for CreateCountryCommand {}

/// Handles the create country command
///
/// # Errors
///
/// - `Validation` - see [`CreateCountryCommand::validate`]
/// - `Duplicate` - a country with the same name (ignoring case) exists
/// - `Store` - the store failed
#[tracing::instrument(skip(store))]
pub async fn handle(
    store: Arc<dyn CountryStore>,
    command: CreateCountryCommand,
) -> Result<Country, CreateCountryError> {
    let new = command.validate()?;
    Ok(store.create(new).await?)
}
