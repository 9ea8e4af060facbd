//! Error taxonomy shared by the fusion engine, embedding providers and store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Bad fusion parameters or missing required settings.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Embedding backend unreachable or returned a server error.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Rate limited by provider, retry after {retry_after_ms:?}ms")]
    RateLimited {
        /// Suggested delay from the `retry-after` header, if any
        retry_after_ms: Option<u64>,
    },

    /// Provider payload that cannot be turned into vectors of the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A rank source returned an id with no row in the document table.
    #[error("Document {0} was ranked but is not stored")]
    MissingDocument(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
