//! countrydb common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Ambient infrastructure shared by the countrydb workspace members. At the
//! moment that is the tracing subscriber setup used by the server binary.
//!
//! # Example
//!
//! ```no_run
//! use countrydb_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig};
