//! Refresh pipeline integration tests
//!
//! Coverage includes:
//! - Joining countries with exchange rates and estimating GDP
//! - Case-insensitive upsert of existing rows
//! - Upstream failures leaving store and summary image untouched
//! - Image failures after the upserts rolling the store back
//! - Image publish failures after the store commit
//! - Missing currencies and missing rate tables
//! - Rejection of overlapping refresh cycles

use serde_json::json;
use std::time::Duration;

use countrydb_server::{
    refresh::RefreshError,
    store::{CountryFilter, CountryStore},
};

mod common;

use common::{country, rates, TestEnv, COUNTRIES_PATH, RATES_PATH};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

#[tokio::test]
async fn test_refresh_joins_rates_and_publishes_image() {
    let env = TestEnv::start().await;
    env.mount_countries(json!([country("Wakanda", "Africa", 1000, Some("WKD"))]))
        .await;
    env.mount_rates(rates(&[("WKD", 10.0)])).await;

    let summary = env.engine.refresh_all().await.unwrap();
    assert_eq!(summary.total_countries, 1);

    let rows = env.store.rows();
    assert_eq!(rows.len(), 1);
    let wakanda = &rows[0];
    assert_eq!(wakanda.name, "Wakanda");
    assert_eq!(wakanda.capital.as_deref(), Some("Wakanda City"));
    assert_eq!(wakanda.currency_code.as_deref(), Some("WKD"));
    assert_eq!(wakanda.exchange_rate, Some(10.0));
    assert_eq!(wakanda.flag_url.as_deref(), Some("https://flagcdn.com/wakanda.svg"));
    assert_eq!(wakanda.last_refreshed_at, Some(summary.last_refreshed_at));

    let gdp = wakanda.estimated_gdp.unwrap();
    assert!((100_000.0..=200_000.0).contains(&gdp), "gdp {} out of range", gdp);

    let image = std::fs::read(env.engine.summary_image_path()).unwrap();
    assert!(image.starts_with(PNG_SIGNATURE));
}

#[tokio::test]
async fn test_refresh_updates_existing_row_ignoring_case() {
    let env = TestEnv::start().await;
    env.seed("chile", "Americas", 1, "CLP").await;
    let seeded_id = env.store.rows()[0].id;

    env.mount_countries(json!([country("Chile", "Americas", 19_116_209, Some("CLP"))]))
        .await;
    env.mount_rates(rates(&[("CLP", 950.0)])).await;

    let summary = env.engine.refresh_all().await.unwrap();
    assert_eq!(summary.total_countries, 1);

    let rows = env.store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, seeded_id);
    assert_eq!(rows[0].name, "chile");
    assert_eq!(rows[0].population, 19_116_209);
    assert_eq!(rows[0].exchange_rate, Some(950.0));
    assert!(rows[0].estimated_gdp.is_some());
}

#[tokio::test]
async fn test_total_counts_processed_entries_only() {
    let env = TestEnv::start().await;
    env.seed("Atlantis", "Oceans", 10, "ATL").await;

    env.mount_countries(json!([
        country("France", "Europe", 67_000_000, Some("EUR")),
        country("Germany", "Europe", 83_000_000, Some("EUR")),
    ]))
    .await;
    env.mount_rates(rates(&[("EUR", 0.92)])).await;

    let summary = env.engine.refresh_all().await.unwrap();
    assert_eq!(summary.total_countries, 2);
    assert_eq!(env.store.count().await.unwrap(), 3);

    let atlantis = env.store.find_by_name("atlantis").await.unwrap().unwrap();
    assert_eq!(atlantis.last_refreshed_at, None);
}

#[tokio::test]
async fn test_repeated_refresh_keeps_row_count() {
    let env = TestEnv::start().await;
    env.mount_countries(json!([
        country("Peru", "Americas", 33_000_000, Some("PEN")),
        country("Japan", "Asia", 125_000_000, Some("JPY")),
    ]))
    .await;
    env.mount_rates(rates(&[("PEN", 3.7), ("JPY", 150.0)])).await;

    let first = env.engine.refresh_all().await.unwrap();
    let second = env.engine.refresh_all().await.unwrap();

    assert_eq!(first.total_countries, 2);
    assert_eq!(second.total_countries, 2);
    assert!(second.last_refreshed_at >= first.last_refreshed_at);
    assert!(env
        .store
        .rows()
        .iter()
        .all(|c| c.last_refreshed_at == Some(second.last_refreshed_at)));
}

#[tokio::test]
async fn test_rates_failure_leaves_everything_untouched() {
    let env = TestEnv::start().await;
    env.seed("Norway", "Europe", 5_400_000, "NOK").await;
    let before = env.store.rows();

    env.mount_countries(json!([country("Sweden", "Europe", 10_000_000, Some("SEK"))]))
        .await;
    env.mount_status(RATES_PATH, 500).await;

    let err = env.engine.refresh_all().await.unwrap_err();
    match err {
        RefreshError::ExternalSource(message) => {
            assert_eq!(message, "Could not fetch data from Exchange Rates API");
        },
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(env.store.rows(), before);
    assert!(!env.engine.summary_image_path().exists());
}

#[tokio::test]
async fn test_countries_failure_is_external() {
    let env = TestEnv::start().await;
    env.mount_status(COUNTRIES_PATH, 503).await;
    env.mount_rates(rates(&[("USD", 1.0)])).await;

    let err = env.engine.refresh_all().await.unwrap_err();
    assert!(err.is_external());
    assert_eq!(err.to_string(), "Could not fetch data from Countries API");
    assert_eq!(env.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_cycle_keeps_previous_image() {
    let env = TestEnv::start().await;
    env.mount_countries(json!([country("Kenya", "Africa", 54_000_000, Some("KES"))]))
        .await;
    env.mount_rates(rates(&[("KES", 129.0)])).await;
    env.engine.refresh_all().await.unwrap();

    let published = std::fs::read(env.engine.summary_image_path()).unwrap();
    let rows = env.store.rows();

    env.upstream.reset().await;
    env.mount_countries(json!([
        country("Kenya", "Africa", 1, Some("KES")),
        {"population": 10, "region": "Nowhere"}
    ]))
    .await;
    env.mount_rates(rates(&[("KES", 1.0)])).await;

    let err = env.engine.refresh_all().await.unwrap_err();
    assert!(matches!(err, RefreshError::MalformedEntry(_)));

    assert_eq!(env.store.rows(), rows);
    assert_eq!(std::fs::read(env.engine.summary_image_path()).unwrap(), published);
}

#[tokio::test]
async fn test_image_failure_rolls_back_upserts() {
    // A regular file where the media directory should be makes the render step fail
    let env = TestEnv::start_with_media_root(|media| {
        let blocker = media.join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        blocker.join("cache")
    })
    .await;
    env.seed("Chile", "Americas", 1, "CLP").await;
    let before = env.store.rows();

    env.mount_countries(json!([
        country("Chile", "Americas", 19_116_209, Some("CLP")),
        country("Peru", "Americas", 33_000_000, Some("PEN")),
    ]))
    .await;
    env.mount_rates(rates(&[("CLP", 950.0), ("PEN", 3.7)])).await;

    let err = env.engine.refresh_all().await.unwrap_err();
    assert!(matches!(err, RefreshError::Summary(_)), "unexpected error: {:?}", err);
    assert!(!err.is_external());

    assert_eq!(env.store.rows(), before);
    assert!(env.store.find_by_name("peru").await.unwrap().is_none());

    // The writer lock is released with the failed unit of work
    env.seed("Bolivia", "Americas", 1, "BOB").await;
    assert_eq!(env.store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_publish_failure_after_store_commit() {
    let env = TestEnv::start().await;
    // A non-empty directory at the image path makes the final rename fail
    let occupied = env.engine.summary_image_path().join("occupied");
    std::fs::create_dir_all(&occupied).unwrap();

    env.mount_countries(json!([country("Kenya", "Africa", 54_000_000, Some("KES"))]))
        .await;
    env.mount_rates(rates(&[("KES", 129.0)])).await;

    let err = env.engine.refresh_all().await.unwrap_err();
    assert!(matches!(err, RefreshError::Summary(_)), "unexpected error: {:?}", err);
    assert!(!err.is_external());

    let kenya = env.store.find_by_name("kenya").await.unwrap().unwrap();
    assert!(kenya.last_refreshed_at.is_some());
    assert!(env.engine.summary_image_path().is_dir());
}

#[tokio::test]
async fn test_missing_currency_and_missing_rate_table() {
    let env = TestEnv::start().await;
    env.mount_countries(json!([
        country("Antarctica", "Polar", 1_000, None),
        country("Ghana", "Africa", 31_000_000, Some("GHS")),
    ]))
    .await;
    env.mount_rates(json!({"result": "success"})).await;

    let summary = env.engine.refresh_all().await.unwrap();
    assert_eq!(summary.total_countries, 2);

    let antarctica = env.store.find_by_name("Antarctica").await.unwrap().unwrap();
    assert_eq!(antarctica.currency_code, None);
    assert_eq!(antarctica.exchange_rate, None);
    assert_eq!(antarctica.estimated_gdp, Some(0.0));

    let ghana = env.store.find_by_name("ghana").await.unwrap().unwrap();
    assert_eq!(ghana.currency_code.as_deref(), Some("GHS"));
    assert_eq!(ghana.exchange_rate, None);
    assert_eq!(ghana.estimated_gdp, None);
}

#[tokio::test]
async fn test_overlapping_refresh_is_rejected() {
    let env = TestEnv::start().await;
    env.mount_slow_countries(
        json!([country("Chad", "Africa", 16_000_000, Some("XAF"))]),
        Duration::from_millis(300),
    )
    .await;
    env.mount_rates(rates(&[("XAF", 600.0)])).await;

    let (first, second) = tokio::join!(env.engine.refresh_all(), env.engine.refresh_all());

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(RefreshError::InProgress))));

    let listed = env.store.list(&CountryFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);

    // The lock is released once the first cycle finishes
    assert!(env.engine.refresh_all().await.is_ok());
}
