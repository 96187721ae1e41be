//! MAC scheduler statistics (`nrMAC_stats.log`).
//!
//! The log is a sequence of per-UE blocks. Each block opens with an identity
//! line and continues with lines that only name the UE implicitly:
//!
//! ```text
//! UE RNTI 4601 CU-UE-ID 1 in-sync PH 28 dB PCMAX 20 dBm, average RSRP -44 (16 meas)
//! UE 4601: dlsch_rounds 8/0/0/0, dlsch_errors 0, pucch0_DTX 0, BLER 0.00000 MCS (0) 9
//! UE 4601: ulsch_rounds 33/0/0/0, ulsch_errors 0, ulsch_DTX 0, BLER 0.00000 MCS (0) 9 (Qm 2 deltaMCS 0 dB) NPRB 5  SNR 30.0 dB
//! UE 4601: MAC:    TX            561 RX           1270 bytes
//! UE 4601: LCID 1: TX            240 RX            315 bytes
//! ```
//!
//! A UE without a CU-side identity is printed as `CU-UE-ID (none)`; its block
//! is skipped until the next identity line.
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
const RNTI_LCID: &[&str] = &["rnti", "lcid"];

pub const CU_UE_ID: GaugeDef = GaugeDef::new("oai_gnb_mac_cu_ue_id", "CU UE ID of the RNTI", RNTI);
pub const PH: GaugeDef = GaugeDef::new("oai_gnb_mac_ph", "Power Headroom", RNTI);
pub const PCMAX: GaugeDef = GaugeDef::new("oai_gnb_mac_pcmax", "PCMAX", RNTI);
pub const AVG_RSRP: GaugeDef = GaugeDef::new("oai_gnb_mac_avg_rsrp", "Average RSRP", RNTI);

pub const DLSCH_ROUNDS: [GaugeDef; 4] = [
    GaugeDef::new("oai_gnb_mac_dlsch_rounds_a", "DLSCH HARQ Round A", RNTI),
    GaugeDef::new("oai_gnb_mac_dlsch_rounds_b", "DLSCH HARQ Round B", RNTI),
    GaugeDef::new("oai_gnb_mac_dlsch_rounds_c", "DLSCH HARQ Round C", RNTI),
    GaugeDef::new("oai_gnb_mac_dlsch_rounds_d", "DLSCH HARQ Round D", RNTI),
];
pub const DLSCH_ERRORS: GaugeDef = GaugeDef::new("oai_gnb_mac_dlsch_errors", "DLSCH Errors", RNTI);
pub const PUCCH0_DTX: GaugeDef = GaugeDef::new("oai_gnb_mac_pucch0_dtx", "PUCCH0 DTX", RNTI);
pub const DL_BLER: GaugeDef = GaugeDef::new("oai_gnb_mac_dl_bler", "DLSCH BLER", RNTI);
pub const DL_MCS: GaugeDef = GaugeDef::new("oai_gnb_mac_dl_mcs", "DLSCH MCS", RNTI);

pub const ULSCH_ROUNDS: [GaugeDef; 4] = [
    GaugeDef::new("oai_gnb_mac_ulsch_rounds_a", "ULSCH HARQ Round A", RNTI),
    GaugeDef::new("oai_gnb_mac_ulsch_rounds_b", "ULSCH HARQ Round B", RNTI),
    GaugeDef::new("oai_gnb_mac_ulsch_rounds_c", "ULSCH HARQ Round C", RNTI),
    GaugeDef::new("oai_gnb_mac_ulsch_rounds_d", "ULSCH HARQ Round D", RNTI),
];
pub const ULSCH_ERRORS: GaugeDef = GaugeDef::new("oai_gnb_mac_ulsch_errors", "ULSCH Errors", RNTI);
pub const ULSCH_DTX: GaugeDef = GaugeDef::new("oai_gnb_mac_ulsch_dtx", "ULSCH DTX", RNTI);
pub const UL_BLER: GaugeDef = GaugeDef::new("oai_gnb_mac_ul_bler", "ULSCH BLER", RNTI);
pub const UL_MCS: GaugeDef = GaugeDef::new("oai_gnb_mac_ul_mcs", "ULSCH MCS", RNTI);
pub const QM: GaugeDef = GaugeDef::new("oai_gnb_mac_qm", "Modulation Order Qm", RNTI);
pub const DELTA_MCS: GaugeDef = GaugeDef::new("oai_gnb_mac_delta_mcs", "Delta MCS dB", RNTI);
pub const NPRB: GaugeDef = GaugeDef::new("oai_gnb_mac_nprb", "Number of PRBs", RNTI);
pub const SNR: GaugeDef = GaugeDef::new("oai_gnb_mac_snr", "ULSCH SNR", RNTI);

pub const TX_BYTES: GaugeDef = GaugeDef::new("oai_gnb_mac_tx_bytes", "MAC TX Bytes", RNTI);
pub const RX_BYTES: GaugeDef = GaugeDef::new("oai_gnb_mac_rx_bytes", "MAC RX Bytes", RNTI);
pub const LCID_TX_BYTES: GaugeDef =
    GaugeDef::new("oai_gnb_mac_lcid_tx_bytes", "LCID TX Bytes", RNTI_LCID);
pub const LCID_RX_BYTES: GaugeDef =
    GaugeDef::new("oai_gnb_mac_lcid_rx_bytes", "LCID RX Bytes", RNTI_LCID);

static NO_IDENTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"CU-UE-ID \(none\)").unwrap());

static IDENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"UE RNTI (\w+) CU-UE-ID ([0-9]+).*?PH (-?[0-9]+) dB.*?PCMAX (-?[0-9]+) dBm.*?average RSRP (-?[0-9]+)",
    )
    .unwrap()
});

static DLSCH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"UE .*?dlsch_rounds ([0-9]+)/([0-9]+)/([0-9]+)/([0-9]+), dlsch_errors ([0-9]+), pucch0_DTX ([0-9]+), BLER ([0-9.]+) MCS \([0-9]+\) ([0-9]+)",
    )
    .unwrap()
});

static ULSCH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"UE .*?ulsch_rounds ([0-9]+)/([0-9]+)/([0-9]+)/([0-9]+), ulsch_errors ([0-9]+), ulsch_DTX ([0-9]+), BLER ([0-9.]+) MCS \([0-9]+\) ([0-9]+) \(Qm ([0-9]+) deltaMCS ([0-9.-]+) dB\) NPRB ([0-9]+)\s+SNR ([0-9.]+)",
    )
    .unwrap()
});

static MAC_BYTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"MAC:\s+TX\s+([0-9]+)\s+RX\s+([0-9]+)").unwrap());

static LCID_BYTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"LCID ([0-9]+): TX\s+([0-9]+)\s+RX\s+([0-9]+)").unwrap());

/// Which UE the current line belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UeContext {
    /// Before the first identity line, or after a `CU-UE-ID (none)` marker.
    #[default]
    Detached,
    Attached { rnti: String },
}

/// Parse a whole MAC log, returning the number of lines read.
pub fn parse<R: BufRead>(reader: R, recorder: &mut Recorder<'_>) -> ParseResult<usize> {
    let mut context = UeContext::default();
    let mut lines = 0;

    for line in reader.lines() {
        let line = line?;
        lines += 1;
        process_line(&line, &mut context, recorder)?;
    }

    Ok(lines)
}

/// Apply one line to the UE context and the registry.
pub fn process_line(
    line: &str,
    context: &mut UeContext,
    recorder: &mut Recorder<'_>,
) -> ParseResult<()> {
    if NO_IDENTITY_RE.is_match(line) {
        *context = UeContext::Detached;
        return Ok(());
    }

    if let Some(caps) = IDENTITY_RE.captures(line) {
        let rnti = [&caps[1]];
        recorder.set(&CU_UE_ID, &rnti, parse_int(&caps[2])? as f64)?;
        recorder.set(&PH, &rnti, parse_int(&caps[3])? as f64)?;
        recorder.set(&PCMAX, &rnti, parse_int(&caps[4])? as f64)?;
        recorder.set(&AVG_RSRP, &rnti, parse_int(&caps[5])? as f64)?;
        *context = UeContext::Attached {
            rnti: caps[1].to_string(),
        };
    }

    let UeContext::Attached { rnti } = context else {
        return Ok(());
    };
    let rnti = [rnti.as_str()];

    if let Some(caps) = DLSCH_RE.captures(line) {
        for (def, idx) in DLSCH_ROUNDS.iter().zip(1usize..) {
            recorder.set(def, &rnti, parse_int(&caps[idx])? as f64)?;
        }
        recorder.set(&DLSCH_ERRORS, &rnti, parse_int(&caps[5])? as f64)?;
        recorder.set(&PUCCH0_DTX, &rnti, parse_int(&caps[6])? as f64)?;
        recorder.set(&DL_BLER, &rnti, parse_float(&caps[7])?)?;
        recorder.set(&DL_MCS, &rnti, parse_int(&caps[8])? as f64)?;
    }

    if let Some(caps) = ULSCH_RE.captures(line) {
        for (def, idx) in ULSCH_ROUNDS.iter().zip(1usize..) {
            recorder.set(def, &rnti, parse_int(&caps[idx])? as f64)?;
        }
        recorder.set(&ULSCH_ERRORS, &rnti, parse_int(&caps[5])? as f64)?;
        recorder.set(&ULSCH_DTX, &rnti, parse_int(&caps[6])? as f64)?;
        recorder.set(&UL_BLER, &rnti, parse_float(&caps[7])?)?;
        recorder.set(&UL_MCS, &rnti, parse_int(&caps[8])? as f64)?;
        recorder.set(&QM, &rnti, parse_int(&caps[9])? as f64)?;
        recorder.set(&DELTA_MCS, &rnti, parse_float(&caps[10])?)?;
        recorder.set(&NPRB, &rnti, parse_int(&caps[11])? as f64)?;
        recorder.set(&SNR, &rnti, parse_float(&caps[12])?)?;
    }

    if let Some(caps) = MAC_BYTES_RE.captures(line) {
        recorder.set(&TX_BYTES, &rnti, parse_int(&caps[1])? as f64)?;
        recorder.set(&RX_BYTES, &rnti, parse_int(&caps[2])? as f64)?;
    }

    if let Some(caps) = LCID_BYTES_RE.captures(line) {
        let labels = [rnti[0], &caps[1]];
        recorder.set(&LCID_TX_BYTES, &labels, parse_int(&caps[2])? as f64)?;
        recorder.set(&LCID_RX_BYTES, &labels, parse_int(&caps[3])? as f64)?;
    }

    Ok(())
}
