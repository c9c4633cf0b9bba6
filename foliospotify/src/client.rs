//! HTTP client for the Spotify accounts service and Web API

use crate::config_ext::SpotifyConfigExt;
use crate::error::{Result, SpotifyError};
use crate::models::{CurrentlyPlaying, PlaybackStatus, RecentlyPlayed, TokenResponse, Track};
use base64::Engine;
use folioconfig::Config;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default accounts service base URL (token exchange, authorization)
pub const DEFAULT_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Default Web API base URL
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com";

/// Default timeout for every request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "foliospotify/0.1.0";

/// Scopes needed by the now-playing widget
pub const SCOPES: &[&str] = &["user-read-currently-playing", "user-read-recently-played"];

/// Spotify client bound to one account
///
/// No access token is kept between calls: [`SpotifyClient::now_playing`]
/// exchanges the refresh credential on every invocation.
///
/// # Example
///
/// ```no_run
/// use foliospotify::SpotifyClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = SpotifyClient::builder()
///         .credentials("client-id", "client-secret")
///         .refresh_token("refresh-token")
///         .build()?;
///     let status = client.now_playing().await?;
///     println!("{}", serde_json::to_string(&status)?);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    client: Client,
    accounts_base: String,
    api_base: String,
    client_id: String,
    client_secret: String,
    refresh_token: Option<String>,
}

impl SpotifyClient {
    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from the `spotify` section of the configuration
    ///
    /// Fails with [`SpotifyError::Configuration`] when the client id, the
    /// secret or the refresh credential is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client_id = config
            .get_spotify_client_id()
            .ok_or_else(|| SpotifyError::configuration("client_id is not set"))?;
        let client_secret = config
            .get_spotify_client_secret()
            .ok_or_else(|| SpotifyError::configuration("client_secret is not set"))?;
        let refresh_token = config
            .get_spotify_refresh_token()
            .ok_or_else(|| SpotifyError::configuration("refresh_token is not set"))?;

        Self::builder()
            .credentials(client_id, client_secret)
            .refresh_token(refresh_token)
            .timeout(config.get_upstream_timeout())
            .build()
    }

    /// `Basic base64(client_id:client_secret)`
    fn basic_authorization(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        format!("Basic {}", encoded)
    }

    /// Exchange the stored refresh credential for a short-lived access token
    ///
    /// The body is returned as parsed, whatever the HTTP status: a rejected
    /// exchange yields a [`TokenResponse`] without `access_token`. Network
    /// errors and non-JSON bodies are errors.
    pub async fn refresh_access_token(&self) -> Result<TokenResponse> {
        let refresh_token = self
            .refresh_token
            .as_deref()
            .ok_or_else(|| SpotifyError::configuration("refresh_token is not set"))?;

        let url = format!("{}/api/token", self.accounts_base);
        debug!("POST {} (refresh_token grant)", url);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.basic_authorization())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&text)?;

        if token.access_token.is_none() {
            warn!(
                status = status.as_u16(),
                error = token.error.as_deref().unwrap_or("none"),
                "Token exchange returned no access_token"
            );
        }

        Ok(token)
    }

    /// Live playback of the account
    ///
    /// `Ok(None)` covers every non-200 answer (204 when nothing plays, rate
    /// limiting, ...) and a 200 without item.
    pub async fn currently_playing(&self, access_token: &str) -> Result<Option<PlaybackStatus>> {
        let url = format!("{}/v1/me/player/currently-playing", self.api_base);
        debug!("GET {}", url);

        let response = self.client.get(&url).bearer_auth(access_token).send().await?;

        if response.status() != StatusCode::OK {
            debug!(status = response.status().as_u16(), "No live playback");
            return Ok(None);
        }

        let payload: CurrentlyPlaying = response.json().await?;
        Ok(PlaybackStatus::from_live(payload))
    }

    /// Most recent entry of the listening history
    pub async fn recently_played(&self, access_token: &str, limit: u32) -> Result<Option<Track>> {
        let url = format!("{}/v1/me/player/recently-played", self.api_base);
        debug!("GET {} (limit={})", url, limit);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("limit", limit)])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            debug!(status = response.status().as_u16(), "No listening history");
            return Ok(None);
        }

        let payload: RecentlyPlayed = response.json().await?;
        Ok(payload.items.into_iter().next().map(|entry| entry.track))
    }

    /// Current playback status for the site
    ///
    /// Live playback first, then the last played track, then idle. Only a
    /// failed token exchange is an error; failures of the two lookups are
    /// logged and read as "no data".
    pub async fn now_playing(&self) -> Result<PlaybackStatus> {
        let token = self.refresh_access_token().await?;
        let Some(access_token) = token.access_token else {
            return Ok(PlaybackStatus::idle());
        };

        match self.currently_playing(&access_token).await {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => warn!("Currently-playing lookup failed: {}", e),
        }

        match self.recently_played(&access_token, 1).await {
            Ok(Some(track)) => Ok(PlaybackStatus::from_recent(&track)),
            Ok(None) => Ok(PlaybackStatus::idle()),
            Err(e) => {
                warn!("Recently-played lookup failed: {}", e);
                Ok(PlaybackStatus::idle())
            }
        }
    }

    /// URL of the consent page for the authorization-code flow
    pub fn authorize_url(&self, redirect_uri: &str) -> Result<Url> {
        let scope = SCOPES.join(" ");
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.accounts_base),
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", redirect_uri),
                ("scope", scope.as_str()),
            ],
        )?;
        Ok(url)
    }

    /// Exchange an authorization code for tokens (one-off setup)
    ///
    /// The returned response carries the long-lived `refresh_token` to store
    /// in the configuration.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        let url = format!("{}/api/token", self.accounts_base);
        debug!("POST {} (authorization_code grant)", url);

        let token: TokenResponse = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.basic_authorization())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = token.error.clone() {
            return Err(SpotifyError::Api {
                description: token.error_description.unwrap_or_else(|| error.clone()),
                error,
            });
        }

        Ok(token)
    }
}

/// Builder for configuring a SpotifyClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    accounts_base: String,
    api_base: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    timeout: Duration,
    user_agent: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            accounts_base: DEFAULT_ACCOUNTS_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            client_id: None,
            client_secret: None,
            refresh_token: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientBuilder {
    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the accounts service base URL
    pub fn accounts_base(mut self, url: impl Into<String>) -> Self {
        self.accounts_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the Web API base URL
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the application credentials
    pub fn credentials(mut self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Set the long-lived refresh credential
    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<SpotifyClient> {
        let client_id = self
            .client_id
            .ok_or_else(|| SpotifyError::configuration("client_id is not set"))?;
        let client_secret = self
            .client_secret
            .ok_or_else(|| SpotifyError::configuration("client_secret is not set"))?;

        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.timeout)
                .build()?,
        };

        Ok(SpotifyClient {
            client,
            accounts_base: self.accounts_base,
            api_base: self.api_base,
            client_id,
            client_secret,
            refresh_token: self.refresh_token,
        })
    }
}
