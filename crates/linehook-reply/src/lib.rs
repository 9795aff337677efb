//! Reply transport for the LINE Messaging API.
//!
//! Implements [`linehook_core::ReplyTransport`] over HTTP. Each reply is a
//! single POST to the reply endpoint, authenticated with the channel access
//! token. Failures are categorized into [`linehook_core::ReplyError`]
//! variants and returned to the caller; nothing is retried here.
//!
//! # Example
//!
//! ```no_run
//! use linehook_core::{OutboundMessage, ReplyRequest, ReplyToken, ReplyTransport};
//! use linehook_reply::{ClientConfig, LineReplyClient};
//!
//! # async fn example() -> Result<(), linehook_core::ReplyError> {
//! let client = LineReplyClient::new(ClientConfig::new("channel-access-token"))?;
//! let request = ReplyRequest::single(ReplyToken::new("R1"), OutboundMessage::text("hi"));
//! client.reply(request).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;

pub use client::{ClientConfig, LineReplyClient, DEFAULT_API_BASE_URL, REPLY_PATH};
