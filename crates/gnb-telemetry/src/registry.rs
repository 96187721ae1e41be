//! Get-or-create gauge registry.
//!
//! Log parsers re-run on every scrape and touch the same metric names each
//! time. Prometheus rejects a second registration of a name, so families are
//! memoized here: the first registration of a name wins and every later call
//! gets a handle onto the same `GaugeVec`.
//!
//! The registry owns its own `prometheus::Registry` instead of using the
//! process-wide default one, so tests can build as many as they like.

use std::collections::HashMap;

use parking_lot::Mutex;
use prometheus::core::Collector;
use prometheus::proto::{MetricFamily, MetricType};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::error::{TelemetryError, TelemetryResult};

/// Compile-time description of a gauge family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaugeDef {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

impl GaugeDef {
    pub const fn new(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self { name, help, labels }
    }
}

/// Handle onto a registered gauge family.
#[derive(Clone)]
pub struct MetricHandle {
    name: String,
    label_count: usize,
    gauge: GaugeVec,
}

impl MetricHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overwrite the value of one series, creating it on first use.
    pub fn set(&self, label_values: &[&str], value: f64) -> TelemetryResult<()> {
        if label_values.len() != self.label_count {
            return Err(TelemetryError::LabelMismatch {
                metric: self.name.clone(),
                expected: self.label_count,
                actual: label_values.len(),
            });
        }
        self.gauge
            .get_metric_with_label_values(label_values)?
            .set(value);
        Ok(())
    }
}

impl std::fmt::Debug for MetricHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricHandle")
            .field("name", &self.name)
            .field("label_count", &self.label_count)
            .finish()
    }
}

/// Process-wide gauge table backed by a dedicated prometheus registry.
pub struct MetricRegistry {
    registry: Registry,
    gauges: Mutex<HashMap<String, MetricHandle>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            gauges: Mutex::new(HashMap::new()),
        }
    }

    /// Return the gauge family called `name`, registering it on first use.
    ///
    /// `help` and `label_names` are only read on first registration.
    pub fn get_or_create(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> TelemetryResult<MetricHandle> {
        let mut gauges = self.gauges.lock();
        if let Some(handle) = gauges.get(name) {
            return Ok(handle.clone());
        }

        let gauge = GaugeVec::new(Opts::new(name, help), label_names)?;
        self.registry.register(Box::new(gauge.clone()))?;
        debug!(metric = name, labels = ?label_names, "Registered gauge");

        let handle = MetricHandle {
            name: name.to_string(),
            label_count: label_names.len(),
            gauge,
        };
        gauges.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    pub fn gauge(&self, def: &GaugeDef) -> TelemetryResult<MetricHandle> {
        self.get_or_create(def.name, def.help, def.labels)
    }

    /// Register a collector that is not a memoized gauge (self-metrics).
    pub fn register_collector(&self, collector: Box<dyn Collector>) -> TelemetryResult<()> {
        self.registry.register(collector)?;
        Ok(())
    }

    /// Number of gauge families created so far.
    pub fn gauge_count(&self) -> usize {
        self.gauges.lock().len()
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Current value of the series `name{labels}`, if it exists.
    ///
    /// Label order does not matter. Gauges and counters are supported.
    pub fn sample(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let families = self.registry.gather();
        let family = families.iter().find(|mf| mf.get_name() == name)?;

        family
            .get_metric()
            .iter()
            .find(|m| {
                let pairs = m.get_label();
                pairs.len() == labels.len()
                    && labels.iter().all(|(k, v)| {
                        pairs
                            .iter()
                            .any(|p| p.get_name() == *k && p.get_value() == *v)
                    })
            })
            .and_then(|m| match family.get_field_type() {
                MetricType::GAUGE => Some(m.get_gauge().get_value()),
                MetricType::COUNTER => Some(m.get_counter().get_value()),
                _ => None,
            })
    }

    /// Encode every registered family in the Prometheus text format.
    pub fn encode_text(&self) -> TelemetryResult<String> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const RNTI_GAUGE: GaugeDef = GaugeDef::new("test_rnti_gauge", "Per-RNTI test gauge", &["rnti"]);

    #[test]
    fn test_get_or_create_twice_returns_same_series() {
        let registry = MetricRegistry::new();

        let first = registry
            .get_or_create("test_gauge", "A gauge", &["rnti"])
            .unwrap();
        let second = registry
            .get_or_create("test_gauge", "Different help", &["rnti"])
            .unwrap();

        first.set(&["4601"], 3.0).unwrap();
        assert_eq!(registry.sample("test_gauge", &[("rnti", "4601")]), Some(3.0));

        second.set(&["4601"], 7.0).unwrap();
        assert_eq!(registry.sample("test_gauge", &[("rnti", "4601")]), Some(7.0));
        assert_eq!(registry.gauge_count(), 1);
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = MetricRegistry::new();
        registry
            .get_or_create("test_first", "Original help", &[])
            .unwrap();
        let handle = registry
            .get_or_create("test_first", "Ignored help", &["rnti"])
            .unwrap();

        // Label names from the first registration still apply
        handle.set(&[], 1.0).unwrap();
        assert!(handle.set(&["4601"], 1.0).is_err());

        let text = registry.encode_text().unwrap();
        assert!(text.contains("# HELP test_first Original help"));
        assert!(!text.contains("Ignored help"));
    }

    #[test]
    fn test_label_mismatch_is_an_error() {
        let registry = MetricRegistry::new();
        let handle = registry.gauge(&RNTI_GAUGE).unwrap();

        let err = handle.set(&[], 1.0).unwrap_err();
        assert!(matches!(
            err,
            TelemetryError::LabelMismatch {
                expected: 1,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_set_is_last_write_wins() {
        let registry = MetricRegistry::new();
        let handle = registry.gauge(&RNTI_GAUGE).unwrap();

        handle.set(&["1"], 10.0).unwrap();
        handle.set(&["1"], -4.5).unwrap();
        handle.set(&["2"], 2.0).unwrap();

        assert_eq!(registry.sample(RNTI_GAUGE.name, &[("rnti", "1")]), Some(-4.5));
        assert_eq!(registry.sample(RNTI_GAUGE.name, &[("rnti", "2")]), Some(2.0));
        assert_eq!(registry.sample(RNTI_GAUGE.name, &[("rnti", "3")]), None);
    }

    #[test]
    fn test_sample_ignores_label_order() {
        let registry = MetricRegistry::new();
        let handle = registry
            .get_or_create("test_two_labels", "Two labels", &["rnti", "lcid"])
            .unwrap();
        handle.set(&["4601", "4"], 12.0).unwrap();

        assert_eq!(
            registry.sample("test_two_labels", &[("lcid", "4"), ("rnti", "4601")]),
            Some(12.0)
        );
        assert_eq!(registry.sample("test_two_labels", &[("rnti", "4601")]), None);
    }

    #[test]
    fn test_encode_text_renders_labels() {
        let registry = MetricRegistry::new();
        registry
            .gauge(&RNTI_GAUGE)
            .unwrap()
            .set(&["abcd"], 42.0)
            .unwrap();
        registry
            .get_or_create("test_plain", "No labels", &[])
            .unwrap()
            .set(&[], 1.5)
            .unwrap();

        let text = registry.encode_text().unwrap();
        assert!(text.contains("test_rnti_gauge{rnti=\"abcd\"} 42"));
        assert!(text.contains("test_plain 1.5"));
        assert!(text.contains("# TYPE test_plain gauge"));
    }

    #[test]
    fn test_concurrent_first_registration() {
        let registry = Arc::new(MetricRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let worker = i.to_string();
                    registry
                        .get_or_create("test_concurrent", "Raced gauge", &["worker"])
                        .unwrap()
                        .set(&[worker.as_str()], i as f64)
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.gauge_count(), 1);
        assert_eq!(
            registry.sample("test_concurrent", &[("worker", "7")]),
            Some(7.0)
        );
    }

    #[test]
    fn test_invalid_metric_name_is_rejected() {
        let registry = MetricRegistry::new();
        assert!(registry.get_or_create("bad name", "x", &[]).is_err());
        assert_eq!(registry.gauge_count(), 0);
    }
}
