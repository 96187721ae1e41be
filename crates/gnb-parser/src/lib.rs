//! Log-to-metric extraction for gNB statistics logs.
//!
//! The gNB periodically rewrites three plaintext statistics files (L1, MAC
//! and RRC). Each stream has its own parser that walks the file line by line,
//! carries the cross-line state the format needs (current UE, noise matrix
//! block) and writes gauges into a shared [`MetricRegistry`].
//!
//! [`Collector`] runs all three parsers for one scrape and keeps a failure in
//! one stream from affecting the others.
//!
//! [`MetricRegistry`]: gnb_telemetry::MetricRegistry

pub mod coerce;
pub mod collector;
pub mod error;
pub mod l1;
pub mod mac;
pub mod rrc;
pub mod stream;

pub use collector::{CollectReport, Collector, LogPaths, StreamOutcome};
pub use error::{ParseError, ParseResult};
pub use stream::{LogStream, ParseStats, Recorder};
