use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Invalid date '{0}': expected DD/MM/YYYY or YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid threshold for {ratio}: {details}")]
    InvalidThreshold { ratio: String, details: String },

    #[error("Invalid exchange rate for {currency} on {date}: rate must be positive, got {rate}")]
    InvalidRate {
        currency: String,
        date: String,
        rate: f64,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
