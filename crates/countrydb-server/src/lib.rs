//! countrydb server library
//!
//! HTTP service that keeps a catalog of countries in sync with two public
//! sources: a country-facts API and a USD exchange-rate API.
//!
//! # Overview
//!
//! - **Refresh**: pulls both sources, joins them by currency code, estimates
//!   GDP and upserts every country in one unit of work, then publishes a
//!   summary PNG of the top countries by estimated GDP
//! - **Catalog API**: list with filters and GDP ordering, lookup and delete
//!   by name, manual create with field validation
//! - **Storage**: PostgreSQL via SQLx, or an in-process store for tests and
//!   database-less runs
//! - **Configuration**: environment-based, see [`config::Config::load`]
//!
//! # Architecture
//!
//! Features are vertical slices split into **commands** (create, delete,
//! refresh) and **queries** (get, list, status, image). Handlers receive the
//! [`store::CountryStore`] or the [`refresh::RefreshEngine`] directly.
//!
//! ## Framework Stack
//!
//! - **Axum**: HTTP routing and extraction
//! - **SQLx**: PostgreSQL access and embedded migrations
//! - **Tower**: Middleware (CORS, tracing, compression)
//! - **Reqwest**: upstream HTTP client
//!
//! # Example
//!
//! ```no_run
//! use countrydb_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     api::serve(config).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;
pub mod refresh;
pub mod store;

// Re-export commonly used types
pub use error::AppError;
