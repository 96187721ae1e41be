//! gnb-server - Prometheus scrape endpoint for the gNB exporter.
//!
//! Every scrape re-parses the gNB statistics logs and then renders the whole
//! registry, so the response always reflects the logs as they are on disk at
//! request time.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      gnb-exporter process                     │
//! │                                                               │
//! │  GET /metrics                                                 │
//! │      │                                                        │
//! │      ▼                                                        │
//! │  ┌─────────────┐  spawn_blocking  ┌─────────────────────────┐ │
//! │  │ axum router │ ───────────────▶ │ Collector (L1/MAC/RRC)  │ │
//! │  │ (port 9090) │   + timeout      └────────────┬────────────┘ │
//! │  └──────┬──────┘                               │ set()        │
//! │         │ encode_text()                        ▼              │
//! │         │                         ┌─────────────────────────┐ │
//! │         └───────────────────────▶ │ MetricRegistry (Arc<>)  │ │
//! │                                   └─────────────────────────┘ │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gnb_server::{run_server, ServerConfig};
//!
//! let collector = Arc::new(Collector::new(LogPaths::default(), registry)?);
//! run_server(collector, ServerConfig::default(), shutdown_signal()).await?;
//! ```

mod config;
mod error;
mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{create_router, run_server, AppState};
