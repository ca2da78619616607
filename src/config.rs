//! Configuration parsing and validation for gemini-relay.
//!
//! Configuration is resolved once at startup into an immutable [`Config`]
//! and handed to the server explicitly. Sources, in order:
//! an optional TOML file, then the environment for the API credential.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;

/// Environment variable holding the Gemini API credential.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Config file read when no `--config` is given (skipped if absent).
pub const DEFAULT_CONFIG_PATH: &str = "relay.toml";

/// Root configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:5001")
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Cap on request body size; `None` accepts bodies of any size
    #[serde(default)]
    pub max_body_bytes: Option<usize>,
}

fn default_listen() -> String {
    "0.0.0.0:5001".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_body_bytes: None,
        }
    }
}

/// Upstream Gemini API configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// API root, without the `/models/...` suffix
    pub base_url: String,
    /// Pinned model identifier
    pub model: String,
    pub api_key: ApiKey,
    /// Whole-request timeout; `None` waits for the upstream indefinitely
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

/// How upstream failures are reported to the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// HTTP 200 with `"Error: ..."` as the reply text.
    #[default]
    Legacy,
    /// HTTP 502 with the same reply text plus an `error` object.
    Strict,
}

/// Relay behavior configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub error_mode: ErrorMode,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level for the relay's own targets (overridden by `RUST_LOG`)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// API key wrapper that redacts in Debug/Display/Serialize and zeroizes on drop.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Access the raw key value. Every call site is auditable via `grep expose_secret`.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Serialize for ApiKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        ApiKey(SecretString::from(s))
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        ApiKey(SecretString::from(s))
    }
}

/// How the API key was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    /// Literal string in the config file
    Literal,
    /// Config value with `${VAR}` references expanded from the environment
    EnvExpanded,
    /// Read directly from an environment variable (holds var name)
    Environment(String),
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Literal => write!(f, "config-literal"),
            KeySource::EnvExpanded => write!(f, "env-expanded"),
            KeySource::Environment(var) => write!(f, "environment ({})", var),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("{var} not set in environment")]
    MissingApiKey { var: String },

    #[error("Environment variable '{var}' not set for '{field}': {message}")]
    EnvVar {
        var: String,
        field: String,
        message: String,
    },
}

/// Raw upstream section. `api_key` may still contain `${VAR}` references.
#[derive(Deserialize)]
pub struct RawUpstreamConfig {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_model")]
    model: String,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

/// Raw configuration deserialized directly from TOML. Every section is optional.
#[derive(Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default = "default_raw_upstream")]
    upstream: RawUpstreamConfig,
    #[serde(default)]
    relay: RelayConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

fn default_raw_upstream() -> RawUpstreamConfig {
    RawUpstreamConfig {
        base_url: default_base_url(),
        model: default_model(),
        api_key: None,
        timeout_secs: None,
    }
}

impl RawConfig {
    /// Parse a raw configuration from a TOML string.
    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Configuration with every section at its default.
    pub fn defaults() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: default_raw_upstream(),
            relay: RelayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Log level from the `[logging]` section.
    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    /// Override the listen address (CLI `--listen`).
    pub fn with_listen(mut self, listen: impl Into<String>) -> Self {
        self.server.listen = listen.into();
        self
    }
}

/// Expand all `${VAR}` references in a string using a custom lookup function.
///
/// Supports several references in one string. Fails on the first missing
/// variable, an unclosed `${`, or an empty variable name.
fn expand_env_vars_with<F>(input: &str, field: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !input.contains("${") {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let end = after.find('}').ok_or_else(|| ConfigError::EnvVar {
            var: "<unclosed>".to_string(),
            field: field.to_string(),
            message: format!("Unclosed '${{' in config value: {}", input),
        })?;

        let var_name = &after[..end];
        if var_name.is_empty() {
            return Err(ConfigError::EnvVar {
                var: "".to_string(),
                field: field.to_string(),
                message: "Empty variable name in '${}' reference".to_string(),
            });
        }

        let value = lookup(var_name).ok_or_else(|| ConfigError::EnvVar {
            var: var_name.to_string(),
            field: field.to_string(),
            message: format!("Environment variable '{}' is not set", var_name),
        })?;

        result.push_str(&value);
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

impl Config {
    /// Resolve a raw config into the final config using `lookup` for the environment.
    ///
    /// API key resolution:
    /// - `upstream.api_key` containing `${VAR}`: expanded, source = `EnvExpanded`
    /// - `upstream.api_key` literal: used as-is, source = `Literal`
    /// - absent: read `GEMINI_API_KEY`, source = `Environment`
    ///
    /// An empty key after resolution is treated as missing.
    pub fn from_raw_with<F>(raw: RawConfig, lookup: F) -> Result<(Self, KeySource), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (key, source) = match raw.upstream.api_key {
            Some(ref raw_key) if raw_key.contains("${") => (
                expand_env_vars_with(raw_key, "upstream.api_key", &lookup)?,
                KeySource::EnvExpanded,
            ),
            Some(raw_key) => (raw_key, KeySource::Literal),
            None => (
                lookup(API_KEY_ENV_VAR).unwrap_or_default(),
                KeySource::Environment(API_KEY_ENV_VAR.to_string()),
            ),
        };

        if key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey {
                var: API_KEY_ENV_VAR.to_string(),
            });
        }

        let config = Config {
            server: raw.server,
            upstream: UpstreamConfig {
                base_url: raw.upstream.base_url,
                model: raw.upstream.model,
                api_key: ApiKey::from(key),
                timeout_secs: raw.upstream.timeout_secs,
            },
            relay: raw.relay,
            logging: raw.logging,
        };
        config.validate()?;

        Ok((config, source))
    }

    /// Resolve a raw config against the process environment.
    pub fn from_raw(raw: RawConfig) -> Result<(Self, KeySource), ConfigError> {
        Self::from_raw_with(raw, |name| std::env::var(name).ok())
    }

    /// Read a raw config from a TOML file.
    pub fn read_raw(path: impl AsRef<Path>) -> Result<RawConfig, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;
        RawConfig::parse_str(&content)
    }

    /// Locate the raw config for a CLI invocation.
    ///
    /// An explicit path must exist. Without one, `relay.toml` is used when
    /// present and built-in defaults otherwise.
    pub fn load_raw(path: Option<&Path>) -> Result<RawConfig, ConfigError> {
        match path {
            Some(path) => Self::read_raw(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::read_raw(DEFAULT_CONFIG_PATH),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(RawConfig::defaults())
            }
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.listen must not be empty".to_string(),
            ));
        }

        let base_url = &self.upstream.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "upstream.base_url must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        if self.upstream.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "upstream.model must not be empty".to_string(),
            ));
        }

        if self.server.max_body_bytes == Some(0) {
            return Err(ConfigError::Validation(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }

        if self.upstream.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "upstream.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
