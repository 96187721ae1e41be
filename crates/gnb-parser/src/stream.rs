//! Shared types for the per-stream parsers.

use std::fmt;

use gnb_telemetry::{GaugeDef, MetricRegistry};

use crate::error::ParseResult;

/// The three gNB statistics logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStream {
    L1,
    Mac,
    Rrc,
}

impl LogStream {
    /// Order in which streams are collected.
    pub const ALL: [LogStream; 3] = [LogStream::L1, LogStream::Mac, LogStream::Rrc];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogStream::L1 => "l1",
            LogStream::Mac => "mac",
            LogStream::Rrc => "rrc",
        }
    }
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a completed stream pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines read from the log.
    pub lines: usize,
    /// Gauge writes issued.
    pub updates: usize,
}

/// Write-side view of the registry for one stream pass.
///
/// Counts every gauge write so the collector can report it.
pub struct Recorder<'a> {
    registry: &'a MetricRegistry,
    updates: usize,
}

impl<'a> Recorder<'a> {
    pub fn new(registry: &'a MetricRegistry) -> Self {
        Self {
            registry,
            updates: 0,
        }
    }

    pub fn set(&mut self, def: &GaugeDef, label_values: &[&str], value: f64) -> ParseResult<()> {
        self.registry.gauge(def)?.set(label_values, value)?;
        self.updates += 1;
        Ok(())
    }

    pub fn updates(&self) -> usize {
        self.updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_names() {
        assert_eq!(LogStream::L1.to_string(), "l1");
        assert_eq!(LogStream::Mac.to_string(), "mac");
        assert_eq!(LogStream::Rrc.to_string(), "rrc");
    }

    #[test]
    fn test_recorder_counts_updates() {
        const DEF: GaugeDef = GaugeDef::new("test_recorder_gauge", "Recorder test", &["rnti"]);
        let registry = MetricRegistry::new();
        let mut recorder = Recorder::new(&registry);

        recorder.set(&DEF, &["1"], 1.0).unwrap();
        recorder.set(&DEF, &["1"], 2.0).unwrap();
        assert!(recorder.set(&DEF, &[], 2.0).is_err());

        assert_eq!(recorder.updates(), 2);
        assert_eq!(registry.sample(DEF.name, &[("rnti", "1")]), Some(2.0));
    }
}
