//! Extraction orchestrator.
//!
//! One [`Collector::collect`] call is one scrape's worth of parsing: every
//! configured log is re-read from the start and its gauges are overwritten in
//! the shared registry. Streams are isolated from each other. A missing file
//! is skipped, and an error or panic inside one stream is logged and counted
//! without touching the others. Gauges written before a failure keep their
//! new values.

use std::any::Any;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use gnb_telemetry::{ExporterMetrics, MetricRegistry};
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::error::ParseResult;
use crate::stream::{LogStream, ParseStats, Recorder};
use crate::{l1, mac, rrc};

/// Filesystem location of each statistics log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    pub l1: PathBuf,
    pub mac: PathBuf,
    pub rrc: PathBuf,
}

impl LogPaths {
    pub fn path(&self, stream: LogStream) -> &Path {
        match stream {
            LogStream::L1 => &self.l1,
            LogStream::Mac => &self.mac,
            LogStream::Rrc => &self.rrc,
        }
    }
}

impl Default for LogPaths {
    fn default() -> Self {
        Self {
            l1: PathBuf::from("/oai-gnb-logs/nrL1_stats.log"),
            mac: PathBuf::from("/oai-gnb-logs/nrMAC_stats.log"),
            rrc: PathBuf::from("/oai-gnb-logs/nrRRC_stats.log"),
        }
    }
}

/// What happened to one stream during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The log file does not exist.
    Missing,
    Parsed(ParseStats),
    /// The pass was aborted; the message describes the cause.
    Failed(String),
}

/// Per-stream outcomes of one pass, in collection order.
#[derive(Debug, Clone, Default)]
pub struct CollectReport {
    pub outcomes: Vec<(LogStream, StreamOutcome)>,
}

impl CollectReport {
    pub fn outcome(&self, stream: LogStream) -> Option<&StreamOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| *s == stream)
            .map(|(_, outcome)| outcome)
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, StreamOutcome::Failed(_)))
            .count()
    }
}

/// Runs the stream parsers against the shared registry.
pub struct Collector {
    paths: LogPaths,
    registry: Arc<MetricRegistry>,
    metrics: ExporterMetrics,
    // Held for the duration of a pass. Callers that find it taken skip their pass.
    pass_lock: Mutex<()>,
}

impl Collector {
    /// Create a collector and register its self-metrics in `registry`.
    pub fn new(paths: LogPaths, registry: Arc<MetricRegistry>) -> ParseResult<Self> {
        let metrics = ExporterMetrics::register(&registry)?;
        Ok(Self {
            paths,
            registry,
            metrics,
            pass_lock: Mutex::new(()),
        })
    }

    pub fn paths(&self) -> &LogPaths {
        &self.paths
    }

    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    /// Run one extraction pass over every stream.
    ///
    /// Returns `None` without touching any log if another pass is still
    /// running, e.g. one left behind by a timed-out scrape.
    pub fn collect(&self) -> Option<CollectReport> {
        let Some(_guard) = self.pass_lock.try_lock() else {
            debug!("Extraction pass already running, skipping");
            return None;
        };
        self.metrics.scrape_started();

        let mut report = CollectReport::default();
        for stream in LogStream::ALL {
            let outcome = self.collect_stream(stream);
            report.outcomes.push((stream, outcome));
        }
        Some(report)
    }

    fn collect_stream(&self, stream: LogStream) -> StreamOutcome {
        let path = self.paths.path(stream);
        if !path.is_file() {
            debug!(%stream, path = %path.display(), "Log file not present, skipping");
            return StreamOutcome::Missing;
        }

        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.parse_file(stream, path)));
        self.metrics
            .parse_duration(stream.as_str(), started.elapsed().as_secs_f64());

        match result {
            Ok(Ok(Some(stats))) => {
                self.metrics.stream_lines(stream.as_str(), stats.lines);
                debug!(
                    %stream,
                    lines = stats.lines,
                    updates = stats.updates,
                    "Parsed log"
                );
                StreamOutcome::Parsed(stats)
            }
            // Removed between the existence check and the open
            Ok(Ok(None)) => StreamOutcome::Missing,
            Ok(Err(e)) => {
                self.metrics.stream_failed(stream.as_str());
                error!(%stream, path = %path.display(), error = %e, "Log parsing failed");
                StreamOutcome::Failed(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.metrics.stream_failed(stream.as_str());
                error!(%stream, path = %path.display(), panic = %message, "Log parser panicked");
                StreamOutcome::Failed(message)
            }
        }
    }

    fn parse_file(&self, stream: LogStream, path: &Path) -> ParseResult<Option<ParseStats>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(%stream, path = %path.display(), "Log file disappeared before open");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let reader = BufReader::new(file);
        let mut recorder = Recorder::new(&self.registry);

        let lines = match stream {
            LogStream::L1 => l1::parse(reader, &mut recorder)?,
            LogStream::Mac => mac::parse(reader, &mut recorder)?,
            LogStream::Rrc => rrc::parse(reader, &mut recorder)?,
        };

        Ok(Some(ParseStats {
            lines,
            updates: recorder.updates(),
        }))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
