//! Main application orchestration.
//!
//! Builds the long-lived pieces once at startup:
//! - Metric registry (shared by parsers and the endpoint)
//! - Collector over the configured log paths
//! - Scrape endpoint with graceful shutdown on Ctrl+C

use std::sync::Arc;

use gnb_parser::{Collector, LogPaths, LogStream};
use gnb_telemetry::MetricRegistry;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;

/// Main application.
pub struct Application {
    config: AppConfig,
    collector: Arc<Collector>,
}

impl Application {
    /// Create a new application.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let registry = Arc::new(MetricRegistry::new());
        let paths: LogPaths = config.logs.clone().into();
        let collector = Arc::new(Collector::new(paths, registry)?);

        Ok(Self { config, collector })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn collector(&self) -> &Arc<Collector> {
        &self.collector
    }

    /// Serve scrapes until Ctrl+C.
    pub async fn run(self) -> AppResult<()> {
        for stream in LogStream::ALL {
            let path = self.collector.paths().path(stream);
            if !path.is_file() {
                warn!(
                    %stream,
                    path = %path.display(),
                    "Log file not found, stream is skipped until it appears"
                );
            }
        }

        gnb_server::run_server(self.collector, self.config.server, shutdown_signal()).await?;

        info!("Shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_application_uses_configured_paths() {
        let mut config = AppConfig::default();
        config.logs.l1 = "/tmp/does-not-exist/l1.log".into();

        let app = Application::new(config).unwrap();
        assert_eq!(
            app.collector().paths().path(LogStream::L1),
            std::path::Path::new("/tmp/does-not-exist/l1.log")
        );
        assert_eq!(app.config().server.port, 9090);
    }
}
