//! Error types surfaced by API calls

use thiserror::Error;

use crate::cache::CacheError;
use crate::transport::TransportError;

/// Failure resolving an API call
///
/// Every stage of a call reports through this type, so callers can handle
/// cache-served and network-served failures the same way.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connectivity failure or non-success response
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Payload is not well-formed JSON
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[source] serde_json::Error),

    /// JSON parsed but does not match the requested shape
    #[error("Response does not match expected shape: {0}")]
    Schema(String),

    /// Fetched response could not be written to the cache
    #[error("Failed to write cache entry: {0}")]
    CacheWrite(#[from] CacheError),

    /// Request task ended without resolving its result
    #[error("Request task ended without producing a result")]
    Abandoned,

    /// The call was issued outside a tokio runtime
    #[error("No async runtime to run the request on: {0}")]
    NoRuntime(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Data => ApiError::Schema(err.to_string()),
            Category::Syntax | Category::Eof | Category::Io => ApiError::Parse(err),
        }
    }
}
