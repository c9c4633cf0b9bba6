//! Key/value stores holding the visitor count
//!
//! [`UpstashStore`] speaks the Upstash REST protocol: each command is a JSON
//! array posted to the database URL, the reply is `{"result": ...}` or
//! `{"error": "..."}`.

use crate::error::{CounterError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt::Debug;
use std::time::Duration;
use tracing::debug;

/// Store holding integer counters
///
/// `incr` must be atomic on the store side: it is the only synchronisation
/// between concurrent requests.
#[async_trait]
pub trait CounterStore: Debug + Send + Sync {
    /// Increments `key` and returns the new value (a missing key starts at 0)
    async fn incr(&self, key: &str) -> Result<u64>;

    /// Current value of `key`, `None` when the key does not exist
    async fn get(&self, key: &str) -> Result<Option<u64>>;
}

/// Reply envelope of the REST API
#[derive(Debug, Deserialize)]
struct UpstashReply {
    #[serde(default)]
    result: Value,
    error: Option<String>,
}

/// Upstash Redis REST store
#[derive(Debug, Clone)]
pub struct UpstashStore {
    client: Client,
    url: String,
    token: String,
}

impl UpstashStore {
    /// Create a store for the given database URL and access token
    pub fn new(url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url, token))
    }

    /// Create a store with a custom HTTP client
    pub fn with_client(client: Client, url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    async fn command(&self, args: &[&str]) -> Result<Value> {
        debug!("Upstash command {:?}", args.first());

        let reply: UpstashReply = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&json!(args))
            .send()
            .await?
            .json()
            .await?;

        match reply.error {
            Some(error) => Err(CounterError::Store(error)),
            None => Ok(reply.result),
        }
    }
}

/// Reads an integer reply, sent either as a number or as a string
fn parse_count(value: &Value) -> Result<Option<u64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| CounterError::UnexpectedReply(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| CounterError::UnexpectedReply(s.clone())),
        other => Err(CounterError::UnexpectedReply(other.to_string())),
    }
}

#[async_trait]
impl CounterStore for UpstashStore {
    async fn incr(&self, key: &str) -> Result<u64> {
        let result = self.command(&["INCR", key]).await?;
        parse_count(&result)?.ok_or_else(|| CounterError::UnexpectedReply("null".to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<u64>> {
        let result = self.command(&["GET", key]).await?;
        parse_count(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(&json!(42)).unwrap(), Some(42));
        assert_eq!(parse_count(&json!("17")).unwrap(), Some(17));
        assert_eq!(parse_count(&Value::Null).unwrap(), None);
        assert!(parse_count(&json!("abc")).is_err());
        assert!(parse_count(&json!(-1)).is_err());
        assert!(parse_count(&json!([1])).is_err());
    }

    #[test]
    fn test_url_is_normalized() {
        let store = UpstashStore::with_client(Client::new(), "https://db.upstash.io/", "t");
        assert_eq!(store.url, "https://db.upstash.io");
    }
}
