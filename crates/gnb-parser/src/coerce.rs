//! Conversions from matched log substrings to gauge values.
//!
//! Regex captures hand these functions digit runs that are well-formed by
//! construction, so the error paths only fire on a pattern bug. Such an error
//! aborts the current stream pass like any other parse failure.

use std::num::IntErrorKind;

use crate::error::{ParseError, ParseResult};

/// Parse a base-10 integer with optional sign.
///
/// Values outside the `i64` range saturate to `i64::MAX` / `i64::MIN`.
pub fn parse_int(input: &str) -> ParseResult<i64> {
    match input.parse::<i64>() {
        Ok(value) => Ok(value),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(invalid(input, e)),
        },
    }
}

/// Parse a float, accepting a comma as decimal separator.
pub fn parse_float(input: &str) -> ParseResult<f64> {
    let normalized = input.replace(',', ".");
    normalized.parse::<f64>().map_err(|e| invalid(input, e))
}

/// Rebuild `int_part.frac_part` from two separately captured digit runs.
///
/// The fractional digits are kept verbatim, so `("0", "05")` is 0.05.
pub fn join_decimal(int_part: &str, frac_part: &str) -> ParseResult<f64> {
    let joined = format!("{int_part}.{frac_part}");
    joined.parse::<f64>().map_err(|e| invalid(&joined, e))
}

/// `numerator / denominator`, or exactly 0.0 when the denominator is 0.
pub fn ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn invalid(input: &str, reason: impl std::fmt::Display) -> ParseError {
    ParseError::InvalidNumber {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}
