//! Self-observability metrics for the exporter.
//!
//! These describe the scrape passes themselves (how many ran, how long each
//! stream took, which streams failed) and live in the same registry as the
//! gauges extracted from the gNB logs.

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts};

use crate::error::TelemetryResult;
use crate::registry::MetricRegistry;

/// Scrape-pass metrics facade.
#[derive(Clone)]
pub struct ExporterMetrics {
    scrapes_total: IntCounter,
    stream_errors_total: IntCounterVec,
    stream_lines: IntGaugeVec,
    parse_duration_seconds: HistogramVec,
}

impl ExporterMetrics {
    /// Create the metrics and register them with `registry`.
    ///
    /// Fails if they were already registered there.
    pub fn register(registry: &MetricRegistry) -> TelemetryResult<Self> {
        let scrapes_total = IntCounter::new(
            "oai_gnb_exporter_scrapes_total",
            "Total extraction passes run by the exporter",
        )?;

        let stream_errors_total = IntCounterVec::new(
            Opts::new(
                "oai_gnb_exporter_stream_errors_total",
                "Total extraction passes aborted by an error, per log stream",
            ),
            &["stream"],
        )?;

        let stream_lines = IntGaugeVec::new(
            Opts::new(
                "oai_gnb_exporter_stream_lines",
                "Lines read from each log stream during the last pass",
            ),
            &["stream"],
        )?;

        let parse_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "oai_gnb_exporter_parse_duration_seconds",
                "Time spent parsing each log stream",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["stream"],
        )?;

        registry.register_collector(Box::new(scrapes_total.clone()))?;
        registry.register_collector(Box::new(stream_errors_total.clone()))?;
        registry.register_collector(Box::new(stream_lines.clone()))?;
        registry.register_collector(Box::new(parse_duration_seconds.clone()))?;

        Ok(Self {
            scrapes_total,
            stream_errors_total,
            stream_lines,
            parse_duration_seconds,
        })
    }

    /// Record the start of an extraction pass.
    pub fn scrape_started(&self) {
        self.scrapes_total.inc();
    }

    /// Record a stream whose pass was aborted.
    pub fn stream_failed(&self, stream: &str) {
        self.stream_errors_total.with_label_values(&[stream]).inc();
    }

    /// Record the number of lines read from a stream.
    pub fn stream_lines(&self, stream: &str, lines: usize) {
        self.stream_lines
            .with_label_values(&[stream])
            .set(i64::try_from(lines).unwrap_or(i64::MAX));
    }

    /// Record how long a stream took to parse.
    pub fn parse_duration(&self, stream: &str, seconds: f64) {
        self.parse_duration_seconds
            .with_label_values(&[stream])
            .observe(seconds);
    }
}
