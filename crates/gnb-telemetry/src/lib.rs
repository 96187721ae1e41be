//! Metric registry and structured logging for the gNB exporter.
//!
//! - A get-or-create gauge registry that log parsers write into
//! - Prometheus text exposition of everything registered
//! - Self-observability metrics for scrape passes
//! - Structured logging with tracing

pub mod error;
pub mod logging;
pub mod metrics;
pub mod registry;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogFormat};
pub use metrics::ExporterMetrics;
pub use registry::{GaugeDef, MetricHandle, MetricRegistry};
