//! # Folio Configuration Module
//!
//! This module provides configuration management for the Folio server:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides (generic `FOLIO_CONFIG__A__B` form and the
//!   well-known variables of the site, such as `SPOTIFY_CLIENT_ID`)
//! - Type-safe getters for configuration values
//!
//! Unlike a process-wide singleton, a [`Config`] is loaded once by the binary
//! and handed to every component that needs it, usually behind an `Arc`.
//!
//! ## Usage
//!
//! ```no_run
//! use folioconfig::Config;
//!
//! let config = Config::load_config("")?;
//! let port = config.get_http_port();
//! println!("listening on {}", port);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{info, warn};

// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("folio.yaml");

const ENV_CONFIG_DIR: &str = "FOLIO_CONFIG";
const ENV_PREFIX: &str = "FOLIO_CONFIG__";

/// Environment variables historically used by the site, and their path in the tree
const WELL_KNOWN_ENV: &[(&str, &[&str])] = &[
    ("SPOTIFY_CLIENT_ID", &["spotify", "client_id"]),
    ("SPOTIFY_CLIENT_SECRET", &["spotify", "client_secret"]),
    ("SPOTIFY_REFRESH_TOKEN", &["spotify", "refresh_token"]),
    ("UPSTASH_REDIS_REST_URL", &["visitors", "store", "url"]),
    ("UPSTASH_REDIS_REST_TOKEN", &["visitors", "store", "token"]),
    ("GITHUB_TOKEN", &["github", "token"]),
    ("PORT", &["host", "http_port"]),
];

// Default values for configuration
const DEFAULT_SERVER_NAME: &str = "Folio";
const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_BASE_URL: &str = "http://localhost";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SECURE_COOKIES: bool = false;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_LOG_ADMIN_API: bool = false;

/// Macro to generate a getter for u64 values with default
macro_rules! impl_u64_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> u64 {
            match self.get_value($path) {
                Ok(Value::Number(n)) => n.as_u64().unwrap_or($default),
                Ok(Value::String(s)) => s.trim().parse().unwrap_or($default),
                _ => $default,
            }
        }
    };
}

/// Macro to generate a getter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => *b,
                _ => $default,
            }
        }
    };
}

/// Configuration manager for Folio
///
/// Holds the merged YAML tree (embedded defaults, then `config.yaml`, then the
/// environment). The tree is frozen once assembled and nothing is ever written
/// back to disk.
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    data: Value,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(".folio").exists() {
            return ".folio".to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(".folio");
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        ".folio".to_string()
    }

    /// Loads the configuration
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `FOLIO_CONFIG` environment variable
    /// 3. `.folio` in the current directory
    /// 4. `.folio` in the user's home directory
    ///
    /// A missing `config.yaml` is not an error: the embedded defaults and the
    /// environment are then the only sources.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let external = match fs::read_to_string(&config_file_path) {
            Ok(data) => {
                info!(config_file = %config_file_path.display(), "Loaded config file");
                Some(data)
            }
            Err(_) => {
                info!(
                    config_file = %config_file_path.display(),
                    "Config file not found, using default embedded config"
                );
                None
            }
        };

        Self::assemble(config_dir, external.as_deref(), env::vars())
    }

    /// Builds a configuration from a YAML document merged over the defaults
    ///
    /// The environment is ignored, which makes this the entry point for tests.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::assemble(".".to_string(), Some(yaml), std::iter::empty())
    }

    fn assemble<I>(config_dir: String, external: Option<&str>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        if let Some(yaml) = external {
            let external_value: Value = serde_yaml::from_str(yaml)?;
            // An empty file parses as Null and must not override anything
            if !external_value.is_null() {
                merge_yaml(&mut value, &lower_keys_value(external_value));
            }
        }

        let mut value = lower_keys_value(value);
        apply_env_overrides(&mut value, vars);

        Ok(Config {
            config_dir,
            data: value,
        })
    }

    /// Gets a configuration value at the specified path
    ///
    /// Keys are matched case-insensitively. Returns an error if the path
    /// doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<&Value> {
        get_value_internal(&self.data, path)
    }

    /// Gets a non-empty string value, trimmed
    ///
    /// Numbers are accepted and rendered as strings so that a numeric secret
    /// written unquoted in YAML is not silently lost.
    pub fn get_optional_string(&self, path: &[&str]) -> Option<String> {
        match self.get_value(path) {
            Ok(Value::String(s)) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Ok(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Gets the server name used in logs and `/api/info`
    pub fn get_server_name(&self) -> String {
        self.get_optional_string(&["host", "name"])
            .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string())
    }

    /// Gets the base URL for the HTTP server
    pub fn get_base_url(&self) -> String {
        match self.get_optional_string(&["host", "base_url"]) {
            Some(url) => url,
            None => {
                warn!("Base URL is not configured, using {}", DEFAULT_BASE_URL);
                DEFAULT_BASE_URL.to_string()
            }
        }
    }

    /// Gets the HTTP port from configuration
    ///
    /// Returns the configured HTTP port, or the default port (3000) if not
    /// configured or invalid.
    pub fn get_http_port(&self) -> u16 {
        match self.get_value(&["host", "http_port"]) {
            Ok(Value::Number(n)) => match n.as_u64().and_then(|p| u16::try_from(p).ok()) {
                Some(port) => port,
                None => {
                    warn!("Invalid HTTP port {}, using default {}", n, DEFAULT_HTTP_PORT);
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(Value::String(s)) => match s.trim().parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    warn!("Invalid HTTP port '{}', using default {}", s, DEFAULT_HTTP_PORT);
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(_) => {
                warn!(
                    "HTTP port not a number or string, using default {}",
                    DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }
            Err(err) => {
                warn!(
                    "Failed to get HTTP port: {}, using default {}",
                    err, DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }
        }
    }

    /// Timeout applied to every outbound HTTP call
    pub fn get_upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.get_upstream_timeout_secs())
    }

    /// Static front-end directory, resolved against the config directory
    ///
    /// `None` when no directory is configured.
    pub fn get_static_dir(&self) -> Option<PathBuf> {
        let dir = self.get_optional_string(&["host", "static_dir"])?;
        let path = Path::new(&dir);
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(Path::new(&self.config_dir).join(path))
        }
    }

    impl_u64_config!(
        get_upstream_timeout_secs,
        &["host", "upstream_timeout_secs"],
        DEFAULT_UPSTREAM_TIMEOUT_SECS
    );

    impl_bool_config!(
        get_secure_cookies,
        &["host", "secure_cookies"],
        DEFAULT_SECURE_COOKIES
    );

    impl_bool_config!(
        get_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    // Mounts `/api/log_setup`; the route has no authentication
    impl_bool_config!(
        get_log_admin_api,
        &["host", "logger", "admin_api"],
        DEFAULT_LOG_ADMIN_API
    );

    /// Gets the minimum log level
    pub fn get_log_min_level(&self) -> String {
        self.get_optional_string(&["host", "logger", "min_level"])
            .unwrap_or_else(|| DEFAULT_LOG_MIN_LEVEL.to_string())
    }
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if let Value::Mapping(map) = data {
        let key_value = Value::String(path[0].to_lowercase());
        if path.len() == 1 {
            map.insert(key_value, value);
        } else {
            let entry = map
                .entry(key_value)
                .or_insert(Value::Mapping(Mapping::new()));
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn get_value_internal<'a>(data: &'a Value, path: &[&str]) -> Result<&'a Value> {
    let mut current = data;
    for (i, key) in path.iter().enumerate() {
        if let Value::Mapping(map) = current {
            match map.get(&Value::String(key.to_lowercase())) {
                Some(next) => current = next,
                None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
            }
        } else {
            return Err(anyhow!("Path {} is not a mapping", path[..i].join(".")));
        }
    }
    Ok(current)
}

fn apply_env_overrides<I>(config: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        if let Some(rest) = key.strip_prefix(ENV_PREFIX) {
            let key_path = rest.split("__").collect::<Vec<_>>();
            if let Err(e) = set_value_internal(config, &key_path, convert_env_value(&value)) {
                warn!(env_var = %key, "Ignoring environment override: {}", e);
            }
            continue;
        }

        if let Some((_, path)) = WELL_KNOWN_ENV.iter().find(|(name, _)| *name == key) {
            // Secrets stay strings, even when they look like numbers
            let yaml_value = if key == "PORT" {
                convert_env_value(&value)
            } else {
                Value::String(value)
            };
            if let Err(e) = set_value_internal(config, path, yaml_value) {
                warn!(env_var = %key, "Ignoring environment override: {}", e);
            }
        }
    }
}

fn convert_env_value(value: &str) -> Value {
    match serde_yaml::from_str::<Value>(value) {
        Ok(Value::Null) | Err(_) => Value::String(value.to_string()),
        Ok(parsed) => parsed,
    }
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let new_key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(new_key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default ones.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
