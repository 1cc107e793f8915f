//! Record store errors.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the record store.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    /// The HTTP client could not be constructed.
    #[error("failed to build record store client")]
    Client(#[source] reqwest::Error),

    /// The configured base URL is not usable.
    #[error("invalid record store url: {0}")]
    InvalidUrl(String),

    /// An HTTP transport error occurred.
    #[error("record store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-2xx status.
    #[error("record store returned {status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, as text.
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("unexpected record store response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request body could not be encoded.
    #[error("failed to encode record store request: {0}")]
    Encode(#[source] serde_json::Error),
}
