//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parser error: {0}")]
    Parser(#[from] gnb_parser::ParseError),

    #[error("Server error: {0}")]
    Server(#[from] gnb_server::ServerError),
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_errors_convert() {
        let parse = gnb_parser::ParseError::InvalidNumber {
            input: "x".to_string(),
            reason: "bad".to_string(),
        };
        assert!(matches!(AppError::from(parse), AppError::Parser(_)));

        let server = gnb_server::ServerError::InvalidAddress("nowhere".to_string());
        let err = AppError::from(server);
        assert!(matches!(err, AppError::Server(_)));
        assert!(err.to_string().contains("nowhere"));
    }
}
