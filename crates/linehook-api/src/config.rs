//! Service configuration.

use std::{env, fmt, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use linehook_reply::{ClientConfig, DEFAULT_API_BASE_URL};
use serde::{Deserialize, Serialize};

use crate::server::HttpLimits;

const CONFIG_FILE: &str = "config.toml";

/// Prefix for environment overrides, e.g. `LINEBOT_CHANNEL_SECRET`.
pub const ENV_PREFIX: &str = "LINEBOT_";

/// Keys whose environment values are taken verbatim instead of being parsed
/// as typed data, so `007` or `true` stay strings.
const VERBATIM_ENV_KEYS: &[&str] = &["channel_secret", "channel_token"];

/// Service configuration with defaults, file, and environment overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables prefixed with `LINEBOT_` (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// The channel secret and access token have no usable default and must be
/// supplied by one of the first two sources.
///
/// # Example
///
/// ```no_run
/// use linehook_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
/// println!("Server will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    // Channel credentials
    /// Channel secret used as the HMAC key for request signatures.
    ///
    /// Environment variable: `LINEBOT_CHANNEL_SECRET`
    #[serde(default)]
    pub channel_secret: String,
    /// Channel access token sent with reply calls.
    ///
    /// Environment variable: `LINEBOT_CHANNEL_TOKEN`
    #[serde(default)]
    pub channel_token: String,

    // Server
    /// Host address to bind.
    ///
    /// Environment variable: `LINEBOT_HOST`
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    ///
    /// Environment variable: `LINEBOT_PORT`
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whole-request timeout in seconds.
    ///
    /// Environment variable: `LINEBOT_REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Largest accepted webhook body in bytes.
    ///
    /// Environment variable: `LINEBOT_MAX_BODY_BYTES`
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    // Reply API
    /// Messaging API base URL.
    ///
    /// Environment variable: `LINEBOT_API_BASE_URL`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Timeout for a single reply call in seconds.
    ///
    /// Environment variable: `LINEBOT_REPLY_TIMEOUT`
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout: u64,
}

impl Config {
    /// Loads configuration from defaults, `config.toml` and the environment.
    ///
    /// # Errors
    ///
    /// Returns error if a source cannot be parsed or validation fails.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    /// Layered configuration sources, lowest priority first.
    ///
    /// Credentials set in the environment are merged as raw strings; every
    /// other `LINEBOT_` variable goes through figment's typed parsing.
    pub fn figment() -> Figment {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).ignore(VERBATIM_ENV_KEYS));

        VERBATIM_ENV_KEYS.iter().fold(figment, |figment, key| {
            let var = format!("{ENV_PREFIX}{}", key.to_uppercase());
            match env::var(&var) {
                Ok(value) => figment.merge(Serialized::default(key, value)),
                Err(_) => figment,
            }
        })
    }

    /// Extracts and validates configuration from `figment`.
    ///
    /// # Errors
    ///
    /// Returns error if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reply client configuration derived from this config.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig::new(self.channel_token.clone())
            .with_base_url(self.api_base_url.clone())
            .with_timeout(Duration::from_secs(self.reply_timeout))
    }

    /// Router limits derived from this config.
    pub fn to_http_limits(&self) -> HttpLimits {
        HttpLimits {
            request_timeout: Duration::from_secs(self.request_timeout),
            max_body_bytes: self.max_body_bytes,
        }
    }

    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns error if `host:port` is not a valid socket address.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Channel secret with all but the first two characters hidden.
    pub fn channel_secret_masked(&self) -> String {
        mask(&self.channel_secret)
    }

    /// Checks required values and ranges.
    ///
    /// # Errors
    ///
    /// Returns error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.channel_secret.is_empty() {
            anyhow::bail!("channel_secret is required (set {ENV_PREFIX}CHANNEL_SECRET)");
        }

        if self.channel_token.is_empty() {
            anyhow::bail!("channel_token is required (set {ENV_PREFIX}CHANNEL_TOKEN)");
        }

        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.reply_timeout == 0 {
            anyhow::bail!("reply_timeout must be greater than 0");
        }

        if self.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be greater than 0");
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            anyhow::bail!("api_base_url must be an http(s) URL");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel_secret: String::new(),
            channel_token: String::new(),
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
            api_base_url: default_api_base_url(),
            reply_timeout: default_reply_timeout(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("channel_secret", &self.channel_secret_masked())
            .field("channel_token", &mask(&self.channel_token))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("request_timeout", &self.request_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("api_base_url", &self.api_base_url)
            .field("reply_timeout", &self.reply_timeout)
            .finish()
    }
}

fn mask(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let visible: String = value.chars().take(2).collect();
    format!("{visible}***")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_reply_timeout() -> u64 {
    10
}
