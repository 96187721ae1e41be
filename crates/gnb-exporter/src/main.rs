//! gNB log exporter - Entry Point
//!
//! Serves metrics extracted from the gNB L1, MAC and RRC statistics logs on a
//! Prometheus scrape endpoint.

use anyhow::Result;
use clap::Parser;
use gnb_exporter::config::DEFAULT_CONFIG_PATH;
use tracing::info;

/// Prometheus exporter for OpenAirInterface gNB statistics logs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via GNB_EXPORTER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen port, overrides the configuration file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    gnb_telemetry::init_logging()?;

    info!("Starting gNB exporter v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > GNB_EXPORTER_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("GNB_EXPORTER_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = gnb_exporter::AppConfig::load_or_default(&config_path)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!(
        port = config.server.port,
        l1 = %config.logs.l1.display(),
        mac = %config.logs.mac.display(),
        rrc = %config.logs.rrc.display(),
        "Configuration loaded"
    );

    let app = gnb_exporter::Application::new(config)?;
    app.run().await?;

    Ok(())
}
