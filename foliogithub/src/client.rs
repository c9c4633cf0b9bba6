//! Minimal GitHub client used to validate the site's access token

use crate::error::Result;
use crate::models::TokenCheck;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

/// Default GitHub API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// GitHub rejects requests without a User-Agent
pub const DEFAULT_USER_AGENT: &str = "foliogithub/0.1.0";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const VIEWER_QUERY: &str = "query { viewer { login } }";

/// GitHub client authenticated with a personal access token
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api_base: String,
    token: String,
}

impl GithubClient {
    /// Create a client for `token` with default settings
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::builder(token).build()
    }

    /// Create a builder for configuring the client
    pub fn builder(token: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Validate the token against the REST and the GraphQL APIs
    ///
    /// A rejected token gives an `Ok` report with `success: false`; only
    /// transport and decoding failures are errors.
    pub async fn check_token(&self) -> Result<TokenCheck> {
        let url = format!("{}/user", self.api_base);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "GitHub rejected the token");
            return Ok(TokenCheck::rejected(response.status().as_u16()));
        }

        let scopes = response
            .headers()
            .get("x-oauth-scopes")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let user: Value = serde_json::from_str(&response.text().await?)?;
        let login = user.get("login").and_then(Value::as_str).map(str::to_string);

        let graphql_url = format!("{}/graphql", self.api_base);
        debug!("POST {}", graphql_url);

        let graphql: Value = self
            .client
            .post(&graphql_url)
            .bearer_auth(&self.token)
            .json(&json!({ "query": VIEWER_QUERY }))
            .send()
            .await?
            .json()
            .await?;

        let graphql_works = graphql.get("errors").is_none_or(Value::is_null);
        Ok(TokenCheck::valid(login, scopes, graphql_works))
    }
}

/// Builder for configuring a GithubClient
#[derive(Debug)]
pub struct ClientBuilder {
    api_base: String,
    token: String,
    timeout: Duration,
}

impl ClientBuilder {
    /// Set the API base URL
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<GithubClient> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(self.timeout)
            .build()?;

        Ok(GithubClient {
            client,
            api_base: self.api_base,
            token: self.token,
        })
    }
}
