//! RRC statistics (`nrRRC_stats.log`).
//!
//! Two kinds of records share the file. Cell parameters (SSB ARFCN, carrier
//! ARFCN and subcarrier spacing) are global and may appear anywhere, often
//! before the first UE. UE records follow a line carrying `RNTI <id>` and are
//! attributed to that RNTI until the next one.
//!
//! Both kinds are matched in one pass. Cell records are checked before the
//! RNTI gate so a missing UE context never hides them.
//!
//! # Panics
//!
//! The patterns are compiled lazily with `unwrap()`. They are constants, so a
//! failure is a programming error caught by the first test run.

use std::io::BufRead;

use gnb_telemetry::GaugeDef;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::coerce::{parse_float, parse_int};
use crate::error::ParseResult;
use crate::stream::Recorder;

const RNTI: &[&str] = &["rnti"];

pub const LAST_ACTIVITY_SECS: GaugeDef = GaugeDef::new(
    "oai_gnb_rrc_last_activity_secs",
    "Last RRC Activity",
    RNTI,
);
pub const RSRP: GaugeDef = GaugeDef::new("oai_gnb_rrc_rsrp", "RSRP in dBm", RNTI);
pub const RSRQ: GaugeDef = GaugeDef::new("oai_gnb_rrc_rsrq", "RSRQ in dB", RNTI);
pub const SINR: GaugeDef = GaugeDef::new("oai_gnb_rrc_sinr", "SINR in dB", RNTI);
pub const SSB_ARFCN: GaugeDef = GaugeDef::new("oai_gnb_rrc_ssb_arfcn", "SSB ARFCN", &[]);
pub const ARFCN: GaugeDef = GaugeDef::new("oai_gnb_rrc_arfcn", "ARFCN", &[]);
pub const SCS_KHZ: GaugeDef =
    GaugeDef::new("oai_gnb_rrc_scs_khz", "Subcarrier Spacing (kHz)", &[]);

static RNTI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"RNTI (\w+)").unwrap());

static LAST_ACTIVITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"last RRC activity: ([0-9]+) seconds").unwrap());

static SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"resultSSB:RSRP (-?[0-9]+) dBm RSRQ (-?[0-9]+\.[0-9]+) dB SINR (-?[0-9]+\.[0-9]+) dB").unwrap()
});

static SSB_ARFCN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"SSB ARFCN ([0-9]+)").unwrap());

static ARFCN_SCS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ARFCN ([0-9]+) SCS ([0-9]+) \(kHz\)").unwrap());

/// Cross-line state of one RRC pass.
#[derive(Debug, Default)]
pub struct RrcCursor {
    /// RNTI of the last line that named one.
    pub rnti: Option<String>,
}

/// Parse a whole RRC log, returning the number of lines read.
pub fn parse<R: BufRead>(reader: R, recorder: &mut Recorder<'_>) -> ParseResult<usize> {
    let mut cursor = RrcCursor::default();
    let mut lines = 0;

    for line in reader.lines() {
        let line = line?;
        lines += 1;
        process_line(&line, &mut cursor, recorder)?;
    }

    Ok(lines)
}

pub fn process_line(
    line: &str,
    cursor: &mut RrcCursor,
    recorder: &mut Recorder<'_>,
) -> ParseResult<()> {
    record_cell(line, recorder)?;

    if let Some(caps) = RNTI_RE.captures(line) {
        cursor.rnti = Some(caps[1].to_string());
    }
    let Some(rnti) = cursor.rnti.as_deref() else {
        return Ok(());
    };

    if let Some(caps) = LAST_ACTIVITY_RE.captures(line) {
        recorder.set(&LAST_ACTIVITY_SECS, &[rnti], parse_int(&caps[1])? as f64)?;
    }

    if let Some(caps) = SIGNAL_RE.captures(line) {
        recorder.set(&RSRP, &[rnti], parse_int(&caps[1])? as f64)?;
        recorder.set(&RSRQ, &[rnti], parse_float(&caps[2])?)?;
        recorder.set(&SINR, &[rnti], parse_float(&caps[3])?)?;
    }

    Ok(())
}

fn record_cell(line: &str, recorder: &mut Recorder<'_>) -> ParseResult<()> {
    if let Some(caps) = SSB_ARFCN_RE.captures(line) {
        recorder.set(&SSB_ARFCN, &[], parse_int(&caps[1])? as f64)?;
    }

    if let Some(caps) = ARFCN_SCS_RE.captures(line) {
        recorder.set(&ARFCN, &[], parse_int(&caps[1])? as f64)?;
        recorder.set(&SCS_KHZ, &[], parse_int(&caps[2])? as f64)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnb_telemetry::MetricRegistry;

    fn run(log: &str) -> MetricRegistry {
        let registry = MetricRegistry::new();
        {
            let mut recorder = Recorder::new(&registry);
            parse(log.as_bytes(), &mut recorder).unwrap();
        }
        registry
    }

    #[test]
    fn test_ue_records() {
        let log = "\
UE 0 CU UE ID 1 DU UE ID 4601 RNTI 4601 random identity 3f2a
    last RRC activity: 5 seconds
    PDU session 0 ID 1 status established
    resultSSB:RSRP -44 dBm RSRQ -10.5 dB SINR 20.0 dB
UE 1 CU UE ID 2 DU UE ID 51a1 RNTI 51a1 random identity 77ee
    last RRC activity: 12 seconds
";
        let registry = run(log);

        assert_eq!(
            registry.sample(LAST_ACTIVITY_SECS.name, &[("rnti", "4601")]),
            Some(5.0)
        );
        assert_eq!(registry.sample(RSRP.name, &[("rnti", "4601")]), Some(-44.0));
        assert_eq!(registry.sample(RSRQ.name, &[("rnti", "4601")]), Some(-10.5));
        assert_eq!(registry.sample(SINR.name, &[("rnti", "4601")]), Some(20.0));
        assert_eq!(
            registry.sample(LAST_ACTIVITY_SECS.name, &[("rnti", "51a1")]),
            Some(12.0)
        );
        assert_eq!(registry.sample(RSRP.name, &[("rnti", "51a1")]), None);
    }

    #[test]
    fn test_ue_records_before_any_rnti_are_skipped() {
        let log = "    last RRC activity: 9 seconds\n";
        let registry = run(log);
        assert_eq!(registry.gauge_count(), 0);
    }

    #[test]
    fn test_cell_parameters_before_ue_blocks() {
        let log = "\
CU cell 0: SSB ARFCN 641280
DU cell 0: ARFCN 640008 SCS 30 (kHz) PCI 0
UE 0 CU UE ID 1 DU UE ID 4601 RNTI 4601 random identity 3f2a
    last RRC activity: 1 seconds
";
        let registry = run(log);

        assert_eq!(registry.sample(SSB_ARFCN.name, &[]), Some(641280.0));
        assert_eq!(registry.sample(ARFCN.name, &[]), Some(640008.0));
        assert_eq!(registry.sample(SCS_KHZ.name, &[]), Some(30.0));
        assert_eq!(
            registry.sample(LAST_ACTIVITY_SECS.name, &[("rnti", "4601")]),
            Some(1.0)
        );
    }

    #[test]
    fn test_cell_parameters_without_ue() {
        let registry = run("SSB ARFCN 632628 ARFCN 632628 SCS 30 (kHz)\n");

        assert_eq!(registry.sample(SSB_ARFCN.name, &[]), Some(632628.0));
        assert_eq!(registry.sample(ARFCN.name, &[]), Some(632628.0));
        assert_eq!(registry.sample(SCS_KHZ.name, &[]), Some(30.0));
        assert_eq!(registry.gauge_count(), 3);
    }
}
