//! Parser error types.

use gnb_telemetry::TelemetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid number {input:?}: {reason}")]
    InvalidNumber { input: String, reason: String },

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

pub type ParseResult<T> = Result<T, ParseError>;
