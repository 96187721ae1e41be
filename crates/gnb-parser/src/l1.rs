//! Physical-layer statistics (`nrL1_stats.log`).
//!
//! Besides single-line records for DLSCH/ULSCH/PRACH, the L1 log dumps a
//! per-PRB noise matrix spread over a variable number of lines:
//!
//! ```text
//! Blacklisted PRBs 0/106
//!   0   1  -1   0 ...
//!   2   0   0 ...
//! max_IO = 35 (60), min_I0 = 0 (3), avg_I0 = 1 dB(1.2.1.1)
//! ```
//!
//! The `Blacklisted PRBs` line opens the block and the `max_IO` summary closes
//! it. Every integer of every unrecognized line in between is a noise offset;
//! its position in the block is its PRB index.
//!
//! # Panics
//!
//! The patterns are compiled lazily with `unwrap()`. They are constants, so a
//! failure is a programming error caught by the first test run.

use std::io::BufRead;

use gnb_telemetry::GaugeDef;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::coerce::{join_decimal, parse_float, parse_int, ratio};
use crate::error::ParseResult;
use crate::stream::Recorder;

const RNTI: &[&str] = &["rnti"];

pub const TOTAL_PRBS: GaugeDef = GaugeDef::new("oai_gnb_l1_total_prbs", "Total number of PRBs", &[]);
pub const BLACKLISTED_PRBS: GaugeDef = GaugeDef::new(
    "oai_gnb_l1_blacklisted_prbs_total",
    "Number of blacklisted PRBs",
    &[],
);
pub const BLACKLISTED_RATIO: GaugeDef = GaugeDef::new(
    "oai_gnb_l1_blacklisted_prbs_ratio",
    "Ratio of blacklisted PRBs",
    &[],
);
pub const DLSCH_TX_BYTES: GaugeDef =
    GaugeDef::new("oai_gnb_l1_dlsch_tx_bytes", "DLSCH TX Bytes", RNTI);
pub const ULSCH_POWER: GaugeDef = GaugeDef::new("oai_gnb_l1_ulsch_power", "ULSCH Power", RNTI);
pub const ULSCH_NOISE_POWER: GaugeDef = GaugeDef::new(
    "oai_gnb_l1_ulsch_noise_power",
    "ULSCH Noise Power",
    RNTI,
);
pub const ULSCH_RX_BYTES: GaugeDef =
    GaugeDef::new("oai_gnb_l1_ulsch_rx_bytes", "ULSCH RX Bytes", RNTI);
pub const ULSCH_SCHED_BYTES: GaugeDef = GaugeDef::new(
    "oai_gnb_l1_ulsch_sched_bytes",
    "ULSCH Scheduled Bytes",
    RNTI,
);
pub const I0_MAX: GaugeDef = GaugeDef::new("oai_gnb_l1_i0_max_db", "Max subband I0 (dB)", &[]);
pub const I0_MIN: GaugeDef = GaugeDef::new("oai_gnb_l1_i0_min_db", "Min subband I0 (dB)", &[]);
pub const I0_AVG: GaugeDef = GaugeDef::new(
    "oai_gnb_l1_i0_avg_db",
    "Average I0 across subbands (dB)",
    &[],
);
pub const PRACH_I0: GaugeDef =
    GaugeDef::new("oai_gnb_l1_prach_i0_db", "PRACH I0 value (dB)", &[]);
pub const NOISE_OFFSET: GaugeDef = GaugeDef::new(
    "oai_gnb_l1_i0_noise_offset_db",
    "PRB I0 noise deviation from average in dB",
    &["prb"],
);

static BLACKLISTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Blacklisted PRBs ([0-9]+)/([0-9]+)").unwrap());

static DLSCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"DLSCH RNTI (\w+): .*?total_bytes TX ([0-9]+)").unwrap());

static ULSCH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"ULSCH RNTI (\w+), [0-9]+: .*?ulsch_power\[0\] ([0-9,]+).*?ulsch_noise_power\[0\] ([0-9.]+).*?total_bytes RX/SCHED ([0-9]+)/([0-9]+)",
    )
    .unwrap()
});

// The gNB prints `max_IO` with a letter O.
static I0_SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"max_I[O0] = (-?[0-9]+) \(([0-9]+)\), min_I0 = (-?[0-9]+) \(([0-9]+)\), avg_I0 = (-?[0-9]+)",
    )
    .unwrap()
});

static PRACH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"PRACH I0 = ([0-9]+)\.([0-9]+) dB").unwrap());

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?[0-9]+").unwrap());

/// Noise matrix block state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixState {
    #[default]
    Idle,
    Collecting,
}

/// Cross-line state of one L1 pass.
#[derive(Debug, Default)]
pub struct L1Cursor {
    pub state: MatrixState,
    /// Noise offsets in log order; the position is the PRB index.
    pub noise_offsets: Vec<i64>,
}

/// Parse a whole L1 log, returning the number of lines read.
///
/// Noise offsets are only written once the end of the log is reached.
pub fn parse<R: BufRead>(reader: R, recorder: &mut Recorder<'_>) -> ParseResult<usize> {
    let mut cursor = L1Cursor::default();
    let mut lines = 0;

    for line in reader.lines() {
        let line = line?;
        lines += 1;
        process_line(&line, &mut cursor, recorder)?;
    }

    for (prb, offset) in cursor.noise_offsets.iter().enumerate() {
        let prb = prb.to_string();
        recorder.set(&NOISE_OFFSET, &[prb.as_str()], *offset as f64)?;
    }

    Ok(lines)
}

/// Apply one line. The first matching line kind wins.
pub fn process_line(
    line: &str,
    cursor: &mut L1Cursor,
    recorder: &mut Recorder<'_>,
) -> ParseResult<()> {
    if let Some(caps) = BLACKLISTED_RE.captures(line) {
        let blacklisted = parse_int(&caps[1])?;
        let total = parse_int(&caps[2])?;
        recorder.set(&TOTAL_PRBS, &[], total as f64)?;
        recorder.set(&BLACKLISTED_PRBS, &[], blacklisted as f64)?;
        recorder.set(&BLACKLISTED_RATIO, &[], ratio(blacklisted, total))?;
        cursor.state = MatrixState::Collecting;
    } else if let Some(caps) = DLSCH_RE.captures(line) {
        let rnti = &caps[1];
        recorder.set(&DLSCH_TX_BYTES, &[rnti], parse_int(&caps[2])? as f64)?;
    } else if let Some(caps) = ULSCH_RE.captures(line) {
        let rnti = &caps[1];
        recorder.set(&ULSCH_POWER, &[rnti], parse_float(&caps[2])?)?;
        recorder.set(&ULSCH_NOISE_POWER, &[rnti], parse_float(&caps[3])?)?;
        recorder.set(&ULSCH_RX_BYTES, &[rnti], parse_int(&caps[4])? as f64)?;
        recorder.set(&ULSCH_SCHED_BYTES, &[rnti], parse_int(&caps[5])? as f64)?;
    } else if let Some(caps) = I0_SUMMARY_RE.captures(line) {
        cursor.state = MatrixState::Idle;
        recorder.set(&I0_MAX, &[], parse_int(&caps[1])? as f64)?;
        recorder.set(&I0_MIN, &[], parse_int(&caps[3])? as f64)?;
        recorder.set(&I0_AVG, &[], parse_int(&caps[5])? as f64)?;
    } else if let Some(caps) = PRACH_RE.captures(line) {
        recorder.set(&PRACH_I0, &[], join_decimal(&caps[1], &caps[2])?)?;
    } else if cursor.state == MatrixState::Collecting {
        for m in INTEGER_RE.find_iter(line) {
            cursor.noise_offsets.push(parse_int(m.as_str())?);
        }
    }
    Ok(())
}
