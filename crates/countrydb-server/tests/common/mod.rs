//! Common test utilities for countrydb integration tests
//!
//! Both upstream sources are served by a `wiremock` server and the catalog
//! lives in a [`MemoryCountryStore`], so no network access or database is
//! needed.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestEnv;
//!
//! #[tokio::test]
//! async fn test_refresh() {
//!     let env = TestEnv::start().await;
//!     env.mount_countries(serde_json::json!([])).await;
//!     env.mount_rates(serde_json::json!({"rates": {}})).await;
//!
//!     env.engine.refresh_all().await.unwrap();
//! }
//! ```

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use countrydb_server::{
    api::create_router,
    config::{CorsConfig, RefreshConfig},
    features::FeatureState,
    models::NewCountry,
    refresh::RefreshEngine,
    store::{CountryStore, MemoryCountryStore},
};

pub const COUNTRIES_PATH: &str = "/v2/all";
pub const RATES_PATH: &str = "/v6/latest/USD";

/// Upstream mocks, store, engine and media directory for one test
pub struct TestEnv {
    pub upstream: MockServer,
    pub store: Arc<MemoryCountryStore>,
    pub engine: Arc<RefreshEngine>,
    pub media: TempDir,
}

impl TestEnv {
    pub async fn start() -> Self {
        Self::start_with_media_root(|media| media.join("cache")).await
    }

    /// Start with the summary image directory chosen inside the temp dir
    pub async fn start_with_media_root(media_root: impl FnOnce(&Path) -> PathBuf) -> Self {
        let upstream = MockServer::start().await;
        let media = tempfile::tempdir().expect("Failed to create media dir");

        let config = RefreshConfig {
            countries_url: format!(
                "{}{}?fields=name,capital,region,population,flag,currencies",
                upstream.uri(),
                COUNTRIES_PATH
            ),
            exchange_rates_url: format!("{}{}", upstream.uri(), RATES_PATH),
            timeout_secs: 5,
            media_root: media_root(media.path()),
        };

        let store = Arc::new(MemoryCountryStore::new());
        let engine = RefreshEngine::with_rng(
            store.clone(),
            &config,
            Box::new(ChaCha8Rng::seed_from_u64(2024)),
        )
        .expect("Failed to build refresh engine");

        Self {
            upstream,
            store,
            engine: Arc::new(engine),
            media,
        }
    }

    pub async fn mount_countries(&self, body: Value) {
        self.mount_json(COUNTRIES_PATH, 200, body).await;
    }

    pub async fn mount_rates(&self, body: Value) {
        self.mount_json(RATES_PATH, 200, body).await;
    }

    pub async fn mount_json(&self, route: &str, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.upstream)
            .await;
    }

    pub async fn mount_status(&self, route: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.upstream)
            .await;
    }

    pub async fn mount_slow_countries(&self, body: Value, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(COUNTRIES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
            .mount(&self.upstream)
            .await;
    }

    /// Seed a manually entered country straight into the store
    pub async fn seed(&self, name: &str, region: &str, population: i64, currency: &str) {
        self.store
            .create(NewCountry {
                name: name.to_string(),
                capital: None,
                region: Some(region.to_string()),
                population,
                currency_code: Some(currency.to_string()),
                flag_url: None,
            })
            .await
            .expect("Failed to seed country");
    }

    pub fn app(&self) -> Router {
        let state = FeatureState {
            store: self.store.clone(),
            engine: self.engine.clone(),
        };
        let cors = CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allow_credentials: false,
        };
        create_router(state, &cors)
    }
}

/// Upstream country entry
pub fn country(name: &str, region: &str, population: u64, currency: Option<&str>) -> Value {
    let currencies = match currency {
        Some(code) => json!([{"code": code, "name": code, "symbol": "$"}]),
        None => json!([]),
    };
    json!({
        "name": name,
        "capital": format!("{} City", name),
        "region": region,
        "population": population,
        "flag": format!("https://flagcdn.com/{}.svg", name.to_lowercase()),
        "currencies": currencies,
        "independent": true
    })
}

/// Upstream rate table
pub fn rates(entries: &[(&str, f64)]) -> Value {
    let rates: serde_json::Map<String, Value> = entries
        .iter()
        .map(|(code, rate)| (code.to_string(), json!(rate)))
        .collect();
    json!({"result": "success", "base_code": "USD", "rates": rates})
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<String>) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header(header::CONTENT_TYPE, "application/json");
    }
    let request = request
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> TestResponse {
    send(app, Method::POST, uri, Some(body.to_string())).await
}

pub async fn delete(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::DELETE, uri, None).await
}
