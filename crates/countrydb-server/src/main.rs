//! countrydb server - main entry point

use anyhow::Result;
use countrydb_common::logging::{init_logging, LogConfig};
use tracing::info;

use countrydb_server::{api, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("countrydb-server")
        .filter_directives("countrydb_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    // Keeps the file appender flushing until shutdown
    let _log_guard = init_logging(&log_config)?;

    info!("Starting countrydb server");

    let config = Config::load()?;
    info!(
        store = ?config.store,
        "Configuration loaded - server will bind to {}:{}",
        config.server.host,
        config.server.port
    );

    api::serve(config).await
}
