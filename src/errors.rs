use std::result::Result as StdResult;

use thiserror::Error;

/// Error type shared by the conversion, aggregation, duty and storage layers.
#[derive(Debug, Error)]
pub enum CustomsError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("Invalid declared value: {0}")]
    InvalidValue(String),
    #[error("Invalid duty rate: {0}")]
    InvalidRate(f64),
    #[error("Invalid exchange rate table: {0}")]
    InvalidRateTable(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Record not found: {0}")]
    RecordNotFound(String),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = StdResult<T, CustomsError>;

impl From<std::io::Error> for CustomsError {
    fn from(err: std::io::Error) -> Self {
        CustomsError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CustomsError {
    fn from(err: serde_json::Error) -> Self {
        CustomsError::Storage(err.to_string())
    }
}
