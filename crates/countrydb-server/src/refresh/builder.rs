// Record builder: raw country + exchange-rate table -> normalized record

use rand::Rng;
use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::models::CountryRecord;
use crate::refresh::{RawCountry, RefreshError, Result};

/// Multiplier drawn per country per refresh when estimating GDP
pub const GDP_MULTIPLIER_RANGE: RangeInclusive<i64> = 1000..=2000;

/// Estimated GDP: `population * multiplier / exchange_rate`
///
/// The multiplier is drawn uniformly from [`GDP_MULTIPLIER_RANGE`], so the
/// result differs between calls with identical input. Returns `None` when the
/// rate is unknown or exactly zero.
pub fn estimate_gdp<R: Rng>(population: i64, exchange_rate: Option<f64>, rng: &mut R) -> Option<f64> {
    let rate = exchange_rate.filter(|rate| *rate != 0.0)?;
    let multiplier = rng.gen_range(GDP_MULTIPLIER_RANGE);
    Some(population as f64 * multiplier as f64 / rate)
}

/// Normalize one upstream entry against the rate table
///
/// Currency handling:
/// - no currency (empty list, missing list, or first entry without a code):
///   no rate, estimated GDP fixed at 0
/// - currency without a matching rate: no rate, no estimated GDP
/// - currency with a rate: estimated GDP per [`estimate_gdp`]
pub fn build_record<R: Rng>(
    raw: &RawCountry,
    rates: &HashMap<String, f64>,
    rng: &mut R,
) -> Result<CountryRecord> {
    let name = raw
        .name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| RefreshError::MalformedEntry("country entry has no name".to_string()))?
        .to_string();

    let population = raw
        .population
        .map(|p| i64::try_from(p).unwrap_or(i64::MAX))
        .unwrap_or(0);

    let currency_code = raw
        .currencies
        .as_ref()
        .and_then(|currencies| currencies.first())
        .and_then(|currency| currency.code.as_deref())
        .filter(|code| !code.is_empty())
        .map(str::to_string);

    let (exchange_rate, estimated_gdp) = match currency_code {
        Some(ref code) => {
            let rate = rates.get(code).copied();
            (rate, estimate_gdp(population, rate, rng))
        },
        None => (None, Some(0.0)),
    };

    Ok(CountryRecord {
        name,
        capital: raw.capital.clone(),
        region: raw.region.clone(),
        population,
        currency_code,
        exchange_rate,
        estimated_gdp,
        flag_url: raw.flag.clone(),
    })
}
