//! gNB statistics log exporter.
//!
//! Wires the pieces together:
//! - Configuration file and CLI overrides
//! - Metric registry shared by parsers and the HTTP endpoint
//! - Extraction of L1/MAC/RRC log metrics on every scrape
//! - Prometheus scrape endpoint

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, LogsConfig};
pub use error::{AppError, AppResult};
