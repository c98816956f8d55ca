//! Feature modules implementing the country API
//!
//! Each feature is a vertical slice with its own commands, queries and routes.
//!
//! # Features
//!
//! - **countries**: catalog reads, manual create/delete, refresh from the
//!   upstream sources, summary image and status
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations (create, delete, refresh)
//! - `queries/` - Read operations (get, list, status, image)
//! - `routes.rs` - HTTP route definitions and error-to-response mapping
//!
//! Commands and queries implement `mediator::Request` with their handler's
//! result type. Handlers are plain `handle` functions taking the
//! collaborators they need, so they can be tested without the HTTP layer.

pub mod countries;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::refresh::RefreshEngine;
use crate::store::CountryStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Country storage backend
    pub store: Arc<dyn CountryStore>,
    /// Refresh pipeline; also knows where the summary image lives
    pub engine: Arc<RefreshEngine>,
}

/// Creates the API router with all feature routes mounted
///
/// - `/countries` - catalog, refresh and summary image
/// - `/status` - catalog size and last refresh time
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/countries", countries::countries_routes())
        .route("/status", get(countries::routes::get_status))
        .with_state(state)
}
