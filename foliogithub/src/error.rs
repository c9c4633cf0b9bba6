//! Error types for the GitHub client

/// Result type alias for GitHub operations
pub type Result<T> = std::result::Result<T, GithubError>;

/// Errors that can occur when talking to GitHub
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}
