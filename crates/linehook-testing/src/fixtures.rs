//! Builders for webhook request bodies in the platform's wire format.
//!
//! Events are built as raw JSON rather than through the domain model so
//! tests can also produce shapes the decoder must reject or ignore.

use base64::prelude::*;
use bytes::Bytes;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{sign_body, TEST_CHANNEL_SECRET};

/// Default user id for events built without an explicit source.
pub const TEST_USER_ID: &str = "U4af4980629c0a8cb6b6ab4e5b1e29a24";

/// Builder for a single webhook event object.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event: Map<String, Value>,
}

impl EventBuilder {
    fn base(event_type: &str) -> Self {
        let mut event = Map::new();
        event.insert("type".to_string(), json!(event_type));
        event.insert("mode".to_string(), json!("active"));
        event.insert("timestamp".to_string(), json!(1_700_000_000_000_u64));
        event.insert("source".to_string(), json!({"type": "user", "userId": TEST_USER_ID}));
        event.insert("webhookEventId".to_string(), json!(Uuid::new_v4().simple().to_string()));
        Self { event }
    }

    /// Text message event from the default user.
    pub fn text(reply_token: &str, text: &str) -> Self {
        Self::base("message").reply_token(reply_token).message(json!({
            "type": "text",
            "id": message_id(),
            "text": text,
        }))
    }

    /// Non-text message event of the given message type.
    pub fn media(reply_token: &str, message_type: &str) -> Self {
        Self::base("message").reply_token(reply_token).message(json!({
            "type": message_type,
            "id": message_id(),
        }))
    }

    /// Sticker message event.
    pub fn sticker(reply_token: &str, package_id: &str, sticker_id: &str) -> Self {
        Self::base("message").reply_token(reply_token).message(json!({
            "type": "sticker",
            "id": message_id(),
            "packageId": package_id,
            "stickerId": sticker_id,
        }))
    }

    /// Postback event with the given `data` string.
    pub fn postback(reply_token: &str, data: &str) -> Self {
        Self::base("postback").reply_token(reply_token).field("postback", json!({"data": data}))
    }

    /// Follow event.
    pub fn follow(reply_token: &str) -> Self {
        Self::base("follow").reply_token(reply_token)
    }

    /// Unfollow event; carries no reply token.
    pub fn unfollow() -> Self {
        Self::base("unfollow")
    }

    /// Event with a type the service does not know.
    pub fn unknown(event_type: &str) -> Self {
        Self::base(event_type)
    }

    /// Sets the reply token.
    #[must_use]
    pub fn reply_token(self, token: &str) -> Self {
        self.field("replyToken", json!(token))
    }

    /// Removes the reply token.
    #[must_use]
    pub fn without_reply_token(mut self) -> Self {
        self.event.remove("replyToken");
        self
    }

    /// Sets the source to the given user.
    #[must_use]
    pub fn from_user(self, user_id: &str) -> Self {
        self.field("source", json!({"type": "user", "userId": user_id}))
    }

    /// Sets the source to a group chat.
    #[must_use]
    pub fn from_group(self, group_id: &str) -> Self {
        self.field("source", json!({"type": "group", "groupId": group_id, "userId": TEST_USER_ID}))
    }

    /// Sets the source to a multi-person room.
    #[must_use]
    pub fn from_room(self, room_id: &str) -> Self {
        self.field("source", json!({"type": "room", "roomId": room_id}))
    }

    /// Sets the event timestamp in epoch milliseconds.
    #[must_use]
    pub fn timestamp(self, millis: u64) -> Self {
        self.field("timestamp", json!(millis))
    }

    /// Adds a postback parameter such as a picked `datetime`.
    ///
    /// Has no effect on events without a `postback` object.
    #[must_use]
    pub fn param(mut self, key: &str, value: &str) -> Self {
        if let Some(Value::Object(postback)) = self.event.get_mut("postback") {
            let params = postback.entry("params").or_insert_with(|| json!({}));
            if let Value::Object(params) = params {
                params.insert(key.to_string(), json!(value));
            }
        }
        self
    }

    /// Sets or replaces an arbitrary top-level field.
    #[must_use]
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.event.insert(key.to_string(), value);
        self
    }

    /// Removes a top-level field.
    #[must_use]
    pub fn without(mut self, key: &str) -> Self {
        self.event.remove(key);
        self
    }

    fn message(self, message: Value) -> Self {
        self.field("message", message)
    }

    /// Builds the event JSON object.
    pub fn build(self) -> Value {
        Value::Object(self.event)
    }
}

/// Builder for a whole webhook request body.
#[derive(Debug, Clone)]
pub struct WebhookBodyBuilder {
    destination: String,
    events: Vec<Value>,
}

impl WebhookBodyBuilder {
    /// Creates an empty body for the default bot destination.
    pub fn new() -> Self {
        Self { destination: "Udeadbeefdeadbeefdeadbeefdeadbeef".to_string(), events: Vec::new() }
    }

    /// Sets the destination bot user id.
    #[must_use]
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Appends an event.
    #[must_use]
    pub fn event(mut self, event: EventBuilder) -> Self {
        self.events.push(event.build());
        self
    }

    /// Appends a raw event value.
    #[must_use]
    pub fn raw_event(mut self, event: Value) -> Self {
        self.events.push(event);
        self
    }

    /// Builds the body JSON.
    pub fn json(&self) -> Value {
        json!({"destination": self.destination, "events": self.events})
    }

    /// Serializes the body.
    pub fn build(&self) -> Bytes {
        Bytes::from(self.json().to_string())
    }

    /// Serializes and signs the body with [`TEST_CHANNEL_SECRET`].
    pub fn signed(&self) -> SignedWebhook {
        self.signed_with(TEST_CHANNEL_SECRET)
    }

    /// Serializes and signs the body with `secret`.
    ///
    /// # Panics
    ///
    /// Panics if `secret` is empty.
    #[allow(clippy::expect_used)]
    pub fn signed_with(&self, secret: &str) -> SignedWebhook {
        let body = self.build();
        let signature = sign_body(&body, secret).expect("fixture secret must not be empty");
        SignedWebhook { body, signature }
    }
}

impl Default for WebhookBodyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A request body together with its signature header value.
#[derive(Debug, Clone)]
pub struct SignedWebhook {
    /// Raw body bytes exactly as signed.
    pub body: Bytes,
    /// Base64 HMAC-SHA256 of the body.
    pub signature: String,
}

impl SignedWebhook {
    /// Returns the signature with one bit of its digest flipped.
    ///
    /// # Panics
    ///
    /// Panics if the signature is not valid base64, which cannot happen for
    /// values produced by this module.
    #[allow(clippy::expect_used)]
    pub fn tampered_signature(&self) -> String {
        let mut digest =
            BASE64_STANDARD.decode(&self.signature).expect("fixture signature is valid base64");
        if let Some(first) = digest.first_mut() {
            *first ^= 0x01;
        }
        BASE64_STANDARD.encode(digest)
    }
}

fn message_id() -> String {
    (Uuid::new_v4().as_u128() % 10_u128.pow(15)).to_string()
}

#[cfg(test)]
mod tests {
    use linehook_core::{decode, EventKind, MessageKind, Source};

    use super::*;

    #[test]
    fn built_body_decodes() {
        let body = WebhookBodyBuilder::new()
            .event(EventBuilder::text("R1", "hi"))
            .event(EventBuilder::postback("R2", "action=reserve").param("datetime", "2026-10-20T10:00"))
            .event(EventBuilder::follow("R3").from_group("G1"))
            .build();

        let batch = decode(&body).unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.events()[0].message_kind(), Some(MessageKind::Text));
        assert_eq!(batch.events()[1].kind(), EventKind::Postback);
        assert!(matches!(batch.events()[2].source, Some(Source::Group { .. })));
    }

    #[test]
    fn tampered_signature_differs() {
        let signed = WebhookBodyBuilder::new().event(EventBuilder::text("R1", "hi")).signed();

        assert_ne!(signed.tampered_signature(), signed.signature);
        assert!(!linehook_core::verify(
            &signed.body,
            &signed.tampered_signature(),
            TEST_CHANNEL_SECRET.as_bytes()
        ));
    }
}
