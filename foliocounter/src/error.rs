//! Error types for the counter store

/// Result type alias for counter operations
pub type Result<T> = std::result::Result<T, CounterError>;

/// Errors that can occur when talking to the counter store
#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    /// HTTP request failed (network, timeout, undecodable body)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reply from the store (`{"error": "..."}`)
    #[error("Store error: {0}")]
    Store(String),

    /// Reply that does not hold the expected value
    #[error("Unexpected store reply: {0}")]
    UnexpectedReply(String),
}
