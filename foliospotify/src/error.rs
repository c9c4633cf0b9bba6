//! Error types for the Spotify client

/// Result type alias for Spotify operations
pub type Result<T> = std::result::Result<T, SpotifyError>;

/// Errors that can occur when talking to Spotify
#[derive(Debug, thiserror::Error)]
pub enum SpotifyError {
    /// HTTP request failed (network, timeout, undecodable body)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Missing or incomplete credentials
    #[error("Spotify configuration error: {0}")]
    Configuration(String),

    /// Error reported by the accounts service in its JSON body
    #[error("Spotify API error ({error}): {description}")]
    Api { error: String, description: String },
}

impl SpotifyError {
    /// Create a configuration error from a string
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
