//! In-memory reply transports.
//!
//! [`RecordingTransport`] accepts every reply and keeps it for inspection.
//! [`FailingTransport`] rejects replies matching a rule and records the rest.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use linehook_core::{OutboundMessage, ReplyError, ReplyRequest, ReplyToken, ReplyTransport};

/// Transport that records every reply and always succeeds.
#[derive(Debug, Default, Clone)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<ReplyRequest>>>,
}

impl RecordingTransport {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ReplyRequest>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All recorded replies in send order.
    pub fn sent(&self) -> Vec<ReplyRequest> {
        self.lock().clone()
    }

    /// Number of recorded replies.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when nothing was sent.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Reply tokens in send order.
    pub fn tokens(&self) -> Vec<String> {
        self.lock().iter().map(|request| request.reply_token().as_str().to_string()).collect()
    }

    /// Text of every text message sent, flattened in order.
    pub fn texts(&self) -> Vec<String> {
        self.lock()
            .iter()
            .flat_map(|request| request.messages().iter())
            .filter_map(|message| match message {
                OutboundMessage::Text { text } => Some(text.clone()),
                OutboundMessage::Flex { .. } => None,
            })
            .collect()
    }

    fn record(&self, request: ReplyRequest) {
        self.lock().push(request);
    }
}

#[async_trait::async_trait]
impl ReplyTransport for RecordingTransport {
    async fn reply(&self, request: ReplyRequest) -> Result<(), ReplyError> {
        self.record(request);
        Ok(())
    }
}

/// Which replies a [`FailingTransport`] rejects.
#[derive(Debug, Clone)]
enum FailureRule {
    Always,
    Token(ReplyToken),
}

/// Transport that fails selected replies with an API rejection.
///
/// Successful replies are recorded in [`FailingTransport::recorder`].
#[derive(Debug, Clone)]
pub struct FailingTransport {
    rule: FailureRule,
    recorder: RecordingTransport,
}

impl FailingTransport {
    /// Fails every reply.
    pub fn always() -> Self {
        Self { rule: FailureRule::Always, recorder: RecordingTransport::new() }
    }

    /// Fails only replies using `token`.
    pub fn for_token(token: impl Into<String>) -> Self {
        Self {
            rule: FailureRule::Token(ReplyToken::new(token)),
            recorder: RecordingTransport::new(),
        }
    }

    /// Recorder holding the replies that succeeded.
    pub fn recorder(&self) -> &RecordingTransport {
        &self.recorder
    }

    fn should_fail(&self, request: &ReplyRequest) -> bool {
        match &self.rule {
            FailureRule::Always => true,
            FailureRule::Token(token) => request.reply_token() == token,
        }
    }
}

#[async_trait::async_trait]
impl ReplyTransport for FailingTransport {
    async fn reply(&self, request: ReplyRequest) -> Result<(), ReplyError> {
        if self.should_fail(&request) {
            return Err(ReplyError::rejected(400, r#"{"message":"Invalid reply token"}"#));
        }
        self.recorder.record(request);
        Ok(())
    }
}
