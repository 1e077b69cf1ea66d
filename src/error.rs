use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid clause: {0:?} (expected \"field:value\")")]
    InvalidClause(String),

    #[error("invalid sort direction for field '{field}': {value:?} (expected 1 or -1)")]
    InvalidSortDirection { field: String, value: String },

    #[error("result document is not a page envelope: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    #[error("aggregation failed: {0}")]
    Execution(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, Error>;
