use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Training corpus is empty or has no usable terms")]
    EmptyCorpus,

    #[error("Dataset format error at line {line}: {reason}")]
    DatasetFormat { line: usize, reason: String },

    #[error("Dataset has no usable rows")]
    DatasetEmpty,

    #[error("Training error: {0}")]
    Training(String),

    #[error("Model not found at {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Corrupt model: {0}")]
    CorruptModel(String),

    #[error("Feature vector has no known terms")]
    EmptyVector,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed history: {0}")]
    MalformedHistory(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SpamError>;
