//! `compass server`: wires configuration, the database, the venue reference
//! file and the result cache into the web dashboard.

use anyhow::Result;
use clap::Args;
use compass_core::ConfigLoader;
use compass_data::{CachedDashboardSource, DatabaseClient, VenueReference};
use compass_web_api::{ApiServer, DashboardSettings, ViewController};
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Listen address; overrides `server.host`/`server.port` from the config
    #[arg(short, long)]
    pub addr: Option<String>,

    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,
}

/// Runs the dashboard until Ctrl-C, then closes the pool.
///
/// # Errors
/// Returns an error if configuration, the venue file or the database
/// connection cannot be loaded, or if the server fails to bind.
pub async fn run_server(args: ServerArgs) -> Result<()> {
    let config = ConfigLoader::load(&args.config)?;
    let addr = args.addr.unwrap_or_else(|| config.server.addr());

    let venues = VenueReference::from_path(&config.dashboard.venue_file)?;

    let client = DatabaseClient::connect(&config.database).await?;
    let source = CachedDashboardSource::new(client.dashboard_source(), &config.cache);

    let controller = ViewController::new(
        Arc::new(source),
        Arc::new(venues),
        DashboardSettings {
            reporting_date: config.dashboard.reporting_date,
            histogram_bins: config.dashboard.histogram_bins,
            default_country: config.dashboard.default_country.clone(),
        },
    );

    let server = ApiServer::new(Arc::new(controller)).with_health(client.pool().clone());
    let served = server.serve(&addr, shutdown_signal()).await;

    client.close().await;
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
