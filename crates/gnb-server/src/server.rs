//! HTTP server implementation using axum.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use gnb_parser::Collector;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    collector: Arc<Collector>,
    scrape_timeout: Duration,
}

impl AppState {
    pub fn new(collector: Arc<Collector>, config: &ServerConfig) -> Self {
        Self {
            collector,
            scrape_timeout: config.scrape_timeout(),
        }
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .fallback(not_found)
        .with_state(state)
}

/// Run an extraction pass and render the registry.
///
/// Always answers 200: a failed, skipped or slow pass only means some values
/// are stale.
async fn get_metrics(State(state): State<AppState>) -> Response {
    let collector = state.collector.clone();
    let pass = tokio::task::spawn_blocking(move || collector.collect());

    match tokio::time::timeout(state.scrape_timeout, pass).await {
        Ok(Ok(Some(report))) => {
            let failed = report.failed();
            if failed > 0 {
                warn!(failed_streams = failed, "Extraction pass finished with errors");
            } else {
                debug!("Extraction pass finished");
            }
        }
        Ok(Ok(None)) => {
            debug!("Previous extraction pass still running, serving current values");
        }
        Ok(Err(e)) => {
            error!(error = %e, "Extraction task failed");
        }
        Err(_) => {
            warn!(
                timeout_ms = state.scrape_timeout.as_millis() as u64,
                "Extraction pass timed out, serving current values"
            );
        }
    }

    let body = match state.collector.registry().encode_text() {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            String::new()
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        body,
    )
        .into_response()
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Run the scrape endpoint until `shutdown` resolves.
pub async fn run_server<F>(
    collector: Arc<Collector>,
    config: ServerConfig,
    shutdown: F,
) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.socket_addr()?;
    let app = create_router(AppState::new(collector, &config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "Starting metrics server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Metrics server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use gnb_parser::LogPaths;
    use gnb_telemetry::MetricRegistry;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn collector_for(dir: &TempDir) -> Arc<Collector> {
        let paths = LogPaths {
            l1: dir.path().join("nrL1_stats.log"),
            mac: dir.path().join("nrMAC_stats.log"),
            rrc: dir.path().join("nrRRC_stats.log"),
        };
        Arc::new(Collector::new(paths, Arc::new(MetricRegistry::new())).unwrap())
    }

    fn router_with_logs(dir: &TempDir) -> Router {
        create_router(AppState::new(collector_for(dir), &ServerConfig::default()))
    }

    async fn send(router: Router, method: Method, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_parsed_logs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("nrL1_stats.log"),
            "PRACH I0 = 12.5 dB\nDLSCH RNTI 4601: current_Qm 2, total_bytes TX 77\n",
        )
        .unwrap();

        let (status, body) = send(router_with_logs(&dir), Method::GET, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("oai_gnb_l1_prach_i0_db 12.5"));
        assert!(body.contains("oai_gnb_l1_dlsch_tx_bytes{rnti=\"4601\"} 77"));
        assert!(body.contains("oai_gnb_exporter_scrapes_total 1"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_without_logs() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(router_with_logs(&dir), Method::GET, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("oai_gnb_l1_"));
    }

    #[tokio::test]
    async fn test_broken_log_still_returns_ok() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("nrMAC_stats.log"), b"\xff\xfe\xfd\n").unwrap();

        let (status, body) = send(router_with_logs(&dir), Method::GET, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("oai_gnb_exporter_stream_errors_total{stream=\"mac\"} 1"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (status, _) = send(router_with_logs(&dir), Method::GET, "/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(router_with_logs(&dir), Method::GET, "/metrics/extra").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let dir = TempDir::new().unwrap();
        let (status, _) = send(router_with_logs(&dir), Method::POST, "/metrics").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_timed_out_scrape_serves_current_values() {
        let dir = TempDir::new().unwrap();
        let mut log = String::from("PRACH I0 = 12.5 dB\n");
        for _ in 0..200_000 {
            log.push_str("[PHY] gNB stats tick, nothing to report\n");
        }
        std::fs::write(dir.path().join("nrL1_stats.log"), log).unwrap();

        let collector = collector_for(&dir);
        assert!(collector.collect().is_some());

        let config = ServerConfig {
            scrape_timeout_ms: 0,
            ..Default::default()
        };
        let router = create_router(AppState::new(collector, &config));
        let (status, body) = send(router, Method::GET, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("oai_gnb_l1_prach_i0_db 12.5"));
    }
}
