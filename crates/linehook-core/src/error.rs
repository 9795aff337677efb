//! Error types for webhook verification, decoding, and dispatch.
//!
//! Each pipeline stage has its own error enum. [`WebhookError`] aggregates
//! the ones that terminate a request and maps them to a stable code and HTTP
//! status. None of these errors are recovered locally: the request fails as
//! a whole.

use thiserror::Error;

use crate::models::{EventKind, ReplyToken};

/// Signature verification failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Signature header missing or empty.
    #[error("signature header missing")]
    MissingSignature,

    /// Signature header is not valid base64.
    #[error("invalid signature encoding: {0}")]
    InvalidEncoding(String),

    /// Signature does not match the body.
    #[error("signature verification failed")]
    VerificationFailed,

    /// Signing secret unusable as an HMAC key.
    #[error("invalid secret key")]
    InvalidSecret,
}

/// Malformed webhook bodies.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Body is not JSON or does not have the envelope shape.
    #[error("malformed webhook body: {0}")]
    Json(#[from] serde_json::Error),

    /// A field required by the event's type is absent.
    #[error("event {index}: missing required field `{field}`")]
    MissingField {
        /// Position of the event in the batch
        index: usize,
        /// Wire name of the missing field
        field: &'static str,
    },

    /// An `Unknown` variant names a discriminator that decodes to a known
    /// variant, so it has no wire form. Only returned by `encode`.
    #[error("event {index}: `{type_name}` is a known type and cannot be encoded as unknown")]
    ReservedType {
        /// Position of the event in the batch
        index: usize,
        /// The reserved discriminator value
        type_name: String,
    },
}

/// Reply transport failures.
#[derive(Debug, Clone, Error)]
pub enum ReplyError {
    /// Connection to the reply API failed.
    #[error("network connection failed: {message}")]
    Network {
        /// Error message describing the network failure
        message: String,
    },

    /// Reply API did not answer in time.
    #[error("reply request timeout after {timeout_seconds}s")]
    Timeout {
        /// Number of seconds before the request timed out
        timeout_seconds: u64,
    },

    /// Reply API refused the request (4xx), e.g. an expired token.
    #[error("reply rejected: HTTP {status_code}")]
    Rejected {
        /// HTTP status code (4xx)
        status_code: u16,
        /// Response body content, truncated
        body: String,
    },

    /// Reply API failed (5xx).
    #[error("reply API error: HTTP {status_code}")]
    Server {
        /// HTTP status code (5xx)
        status_code: u16,
        /// Response body content, truncated
        body: String,
    },

    /// Reply built with a message count outside `1..=5`.
    #[error("invalid message count {count}: a reply carries 1 to 5 messages")]
    InvalidMessageCount {
        /// Number of messages supplied
        count: usize,
    },

    /// Transport could not be configured.
    #[error("invalid reply transport configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },
}

impl ReplyError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_seconds: u64) -> Self {
        Self::Timeout { timeout_seconds }
    }

    /// Creates a rejection error from an HTTP response.
    pub fn rejected(status_code: u16, body: impl Into<String>) -> Self {
        Self::Rejected { status_code, body: body.into() }
    }

    /// Creates a server error from an HTTP response.
    pub fn server(status_code: u16, body: impl Into<String>) -> Self {
        Self::Server { status_code, body: body.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Whether a later attempt could succeed.
    ///
    /// Only used to classify failures in logs; nothing in this workspace
    /// retries a reply.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::Server { .. } => true,
            Self::Rejected { status_code, .. } => *status_code == 429,
            Self::InvalidMessageCount { .. } | Self::Configuration { .. } => false,
        }
    }
}

/// Failures inside a single event handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Sending the reply failed.
    #[error("reply failed: {0}")]
    Reply(#[from] ReplyError),

    /// A replyable event arrived without a reply token.
    #[error("{event_type} event has no reply token")]
    MissingReplyToken {
        /// Type of the event being handled
        event_type: EventKind,
    },
}

/// Failures that abort the rest of a batch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler failed; later events were not processed.
    #[error("handler for {event_type} event at index {index} failed: {source}")]
    Handler {
        /// Position of the failing event in the batch
        index: usize,
        /// Type of the failing event
        event_type: EventKind,
        /// Underlying handler failure
        #[source]
        source: HandlerError,
    },

    /// Two events in one batch share a reply token.
    #[error("reply token {reply_token} at index {index} was already used in this batch")]
    DuplicateReplyToken {
        /// Position of the second event using the token
        index: usize,
        /// The reused token
        reply_token: ReplyToken,
    },
}

/// Request-terminal errors with codes and HTTP status mapping.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature check failed (E1001).
    #[error("[E1001] Invalid signature: {0}")]
    Signature(#[from] SignatureError),

    /// Body could not be decoded (E1002).
    #[error("[E1002] Malformed body: {0}")]
    Decode(#[from] DecodeError),

    /// An event handler failed (E2001).
    #[error("[E2001] Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl WebhookError {
    /// Returns the error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Signature(_) => "E1001",
            Self::Decode(_) => "E1002",
            Self::Dispatch(_) => "E2001",
        }
    }

    /// Returns the HTTP status code for this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Signature(_) => 403,
            Self::Decode(_) | Self::Dispatch(_) => 400,
        }
    }

    /// Returns a client-safe description without internal details.
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Signature(_) => "invalid signature",
            Self::Decode(_) => "malformed request body",
            Self::Dispatch(_) => "event processing failed",
        }
    }
}
