//! HTTP client for the reply endpoint with configurable timeouts.
//!
//! Handles request construction, response processing, and error
//! categorization so failed replies can be logged with useful context.

use std::{fmt, time::Duration};

use linehook_core::{ReplyError, ReplyRequest, ReplyTransport};
use reqwest::{header, StatusCode};
use tracing::{info_span, Instrument};

/// Production API host.
pub const DEFAULT_API_BASE_URL: &str = "https://api.line.me";

/// Reply endpoint path, appended to the base URL.
pub const REPLY_PATH: &str = "/v2/bot/message/reply";

/// Response bodies kept for error reporting are cut to this many bytes.
const MAX_ERROR_BODY_SIZE: usize = 1024;

/// Configuration for the reply client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Scheme and host of the messaging API, without trailing slash.
    pub api_base_url: String,
    /// Channel access token sent as a bearer token.
    pub channel_token: String,
    /// Timeout for a whole reply request.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for the production API.
    pub fn new(channel_token: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            channel_token: channel_token.into(),
            timeout: Duration::from_secs(10),
            user_agent: format!("linehook/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Points the client at a different API host.
    #[must_use]
    pub fn with_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    /// Overrides the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("channel_token", &"***")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Reply transport backed by the messaging API.
#[derive(Debug, Clone)]
pub struct LineReplyClient {
    client: reqwest::Client,
    config: ClientConfig,
    reply_url: String,
}

impl LineReplyClient {
    /// Creates a reply client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `ReplyError::Configuration` if the token is empty or the
    /// HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ReplyError> {
        if config.channel_token.is_empty() {
            return Err(ReplyError::configuration("channel access token is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ReplyError::configuration(format!("failed to build HTTP client: {e}")))?;

        let reply_url = format!("{}{}", config.api_base_url.trim_end_matches('/'), REPLY_PATH);

        Ok(Self { client, config, reply_url })
    }

    /// Full URL replies are posted to.
    pub fn reply_url(&self) -> &str {
        &self.reply_url
    }

    async fn send(&self, request: &ReplyRequest) -> Result<(), ReplyError> {
        let start_time = std::time::Instant::now();

        let response = self
            .client
            .post(&self.reply_url)
            .bearer_auth(&self.config.channel_token)
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(duration_ms = start_time.elapsed().as_millis(), "Reply request failed: {}", e);
                if e.is_timeout() {
                    ReplyError::timeout(self.config.timeout.as_secs())
                } else if e.is_connect() {
                    ReplyError::network(format!("connection failed: {e}"))
                } else {
                    ReplyError::network(e.to_string())
                }
            })?;

        let status = response.status();
        tracing::debug!(
            status = status.as_u16(),
            duration_ms = start_time.elapsed().as_millis(),
            "Received reply response"
        );

        if status.is_success() {
            return Ok(());
        }

        let body = read_error_body(response).await;
        Err(categorize_status(status, body))
    }
}

#[async_trait::async_trait]
impl ReplyTransport for LineReplyClient {
    async fn reply(&self, request: ReplyRequest) -> Result<(), ReplyError> {
        let span = info_span!(
            "reply",
            reply_token = %request.reply_token(),
            messages = request.messages().len()
        );

        async move {
            match self.send(&request).await {
                Ok(()) => {
                    tracing::info!("Reply sent");
                    Ok(())
                },
                Err(e) => {
                    tracing::warn!(error = %e, retryable = e.is_retryable(), "Reply failed");
                    Err(e)
                },
            }
        }
        .instrument(span)
        .await
    }
}

/// Maps a non-success status to a reply error.
fn categorize_status(status: StatusCode, body: String) -> ReplyError {
    if status.is_server_error() {
        ReplyError::server(status.as_u16(), body)
    } else {
        ReplyError::rejected(status.as_u16(), body)
    }
}

async fn read_error_body(response: reqwest::Response) -> String {
    match response.bytes().await {
        Ok(bytes) if bytes.len() > MAX_ERROR_BODY_SIZE => {
            let truncated = String::from_utf8_lossy(&bytes[..MAX_ERROR_BODY_SIZE]);
            format!("{truncated}... (truncated)")
        },
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => format!("[Failed to read response body: {e}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_rejected() {
        let result = LineReplyClient::new(ClientConfig::new(""));
        assert!(matches!(result, Err(ReplyError::Configuration { .. })));
    }

    #[test]
    fn reply_url_joins_base_and_path() {
        let config = ClientConfig::new("token").with_base_url("http://localhost:9000/");
        let client = LineReplyClient::new(config).unwrap();

        assert_eq!(client.reply_url(), "http://localhost:9000/v2/bot/message/reply");
    }

    #[test]
    fn status_categories() {
        assert!(matches!(
            categorize_status(StatusCode::BAD_REQUEST, String::new()),
            ReplyError::Rejected { status_code: 400, .. }
        ));
        assert!(matches!(
            categorize_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ReplyError::Rejected { status_code: 429, .. }
        ));
        assert!(matches!(
            categorize_status(StatusCode::BAD_GATEWAY, String::new()),
            ReplyError::Server { status_code: 502, .. }
        ));
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = ClientConfig::new("very-secret-token");
        assert!(!format!("{config:?}").contains("very-secret-token"));
    }
}
