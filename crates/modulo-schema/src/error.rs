//! Error types for project schema handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("malformed project: {0}")]
    Malformed(String),

    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
