//! Crate-wide error types.

use thiserror::Error;

pub type ProfviewResult<T> = Result<T, ProfviewError>;

#[derive(Debug, Error)]
pub enum ProfviewError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("recorder error: {0}")]
    Recorder(String),
}
