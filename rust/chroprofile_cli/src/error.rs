use chroprofile::ChroProfileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Extraction(#[from] ChroProfileError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Boundary step failed: {0}")]
    Boundary(String),
}
