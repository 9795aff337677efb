//! Core domain models for inbound events and outbound replies.
//!
//! Inbound: an [`EventBatch`] holds the ordered [`Event`]s decoded from one
//! webhook body. Each event carries exactly one resolved [`EventPayload`];
//! message events further resolve to one [`MessageContent`] variant.
//! Discriminator values outside the known set are kept as explicit
//! `Unknown` variants instead of failing the whole batch.
//!
//! Outbound: a [`ReplyRequest`] pairs a single-use [`ReplyToken`] with one to
//! five [`OutboundMessage`]s.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ReplyError;

/// Single-use token authorizing one reply to one inbound event.
///
/// # Example
///
/// ```
/// use linehook_core::models::ReplyToken;
/// let token = ReplyToken::new("nHuyWiB7yP5Zw52FIkcQobQuGDXCTA");
/// assert_eq!(token.as_str(), "nHuyWiB7yP5Zw52FIkcQobQuGDXCTA");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyToken(String);

impl ReplyToken {
    /// Wraps a raw reply token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as sent by the platform.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReplyToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Originator of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// One-to-one chat with a user.
    User {
        /// Platform user ID.
        user_id: String,
    },
    /// Group chat.
    Group {
        /// Platform group ID.
        group_id: String,
        /// Sending member, when the platform discloses it.
        user_id: Option<String>,
    },
    /// Multi-person chat room.
    Room {
        /// Platform room ID.
        room_id: String,
        /// Sending member, when the platform discloses it.
        user_id: Option<String>,
    },
    /// Source type this receiver does not know about.
    ///
    /// Holds names outside `user`, `group` and `room`; `encode` rejects the
    /// others.
    Unknown {
        /// Raw `source.type` value.
        source_type: String,
    },
}

impl Source {
    /// Returns true for one-to-one user chats.
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    /// Returns the ID of the user, group or room the event came from.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::User { user_id } => Some(user_id),
            Self::Group { group_id, .. } => Some(group_id),
            Self::Room { room_id, .. } => Some(room_id),
            Self::Unknown { .. } => None,
        }
    }

    /// Returns the raw source type name.
    pub fn type_name(&self) -> &str {
        match self {
            Self::User { .. } => "user",
            Self::Group { .. } => "group",
            Self::Room { .. } => "room",
            Self::Unknown { source_type } => source_type,
        }
    }
}

/// Top-level event discriminator, used for routing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A message was sent to the bot.
    Message,
    /// A user triggered a postback action.
    Postback,
    /// A user added the bot as a friend.
    Follow,
    /// A user blocked the bot.
    Unfollow,
    /// The bot joined a group or room.
    Join,
    /// The bot was removed from a group or room.
    Leave,
    /// Any other event type.
    Unknown,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Message => "message",
            Self::Postback => "postback",
            Self::Follow => "follow",
            Self::Unfollow => "unfollow",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Message payload discriminator, used for routing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// Image content.
    Image,
    /// Video content.
    Video,
    /// Audio content.
    Audio,
    /// Arbitrary file.
    File,
    /// Shared location.
    Location,
    /// Sticker.
    Sticker,
    /// Any other message type.
    Unknown,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::File => "file",
            Self::Location => "location",
            Self::Sticker => "sticker",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Content of a message event.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// Text message.
    Text {
        /// Message ID.
        id: String,
        /// Text as typed by the user.
        text: String,
    },
    /// Image message.
    Image {
        /// Message ID.
        id: String,
    },
    /// Video message.
    Video {
        /// Message ID.
        id: String,
    },
    /// Audio message.
    Audio {
        /// Message ID.
        id: String,
    },
    /// File message.
    File {
        /// Message ID.
        id: String,
        /// Original file name.
        file_name: Option<String>,
    },
    /// Location message.
    Location {
        /// Message ID.
        id: String,
        /// Place title.
        title: Option<String>,
        /// Street address.
        address: Option<String>,
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },
    /// Sticker message.
    Sticker {
        /// Message ID.
        id: String,
        /// Sticker package ID.
        package_id: String,
        /// Sticker ID within the package.
        sticker_id: String,
    },
    /// Message type this receiver does not know about.
    ///
    /// Holds names outside the known message types; `encode` rejects the
    /// others.
    Unknown {
        /// Message ID.
        id: String,
        /// Raw `message.type` value.
        message_type: String,
    },
}

impl MessageContent {
    /// Returns the discriminator of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text { .. } => MessageKind::Text,
            Self::Image { .. } => MessageKind::Image,
            Self::Video { .. } => MessageKind::Video,
            Self::Audio { .. } => MessageKind::Audio,
            Self::File { .. } => MessageKind::File,
            Self::Location { .. } => MessageKind::Location,
            Self::Sticker { .. } => MessageKind::Sticker,
            Self::Unknown { .. } => MessageKind::Unknown,
        }
    }

    /// Returns the message ID.
    pub fn id(&self) -> &str {
        match self {
            Self::Text { id, .. }
            | Self::Image { id }
            | Self::Video { id }
            | Self::Audio { id }
            | Self::File { id, .. }
            | Self::Location { id, .. }
            | Self::Sticker { id, .. }
            | Self::Unknown { id, .. } => id,
        }
    }
}

/// Postback action payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Postback {
    /// Opaque data string set on the originating action.
    pub data: String,
    /// Picker results (`date`, `time`, `datetime`) and similar extras.
    pub params: BTreeMap<String, String>,
}

impl Postback {
    /// Parses `data` as `key=value&key=value` pairs.
    ///
    /// Pairs without `=` map to an empty value; later duplicates win.
    pub fn data_fields(&self) -> BTreeMap<&str, &str> {
        self.data
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .collect()
    }
}

/// Resolved payload of an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Message event.
    Message(MessageContent),
    /// Postback event.
    Postback(Postback),
    /// Follow event.
    Follow,
    /// Unfollow event.
    Unfollow,
    /// Join event.
    Join,
    /// Leave event.
    Leave,
    /// Event type this receiver does not know about.
    ///
    /// Holds names outside the known event types; `encode` rejects the
    /// others.
    Unknown {
        /// Raw event `type` value.
        event_type: String,
    },
}

impl EventPayload {
    /// Returns the discriminator of this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Message(_) => EventKind::Message,
            Self::Postback(_) => EventKind::Postback,
            Self::Follow => EventKind::Follow,
            Self::Unfollow => EventKind::Unfollow,
            Self::Join => EventKind::Join,
            Self::Leave => EventKind::Leave,
            Self::Unknown { .. } => EventKind::Unknown,
        }
    }
}

/// One event from a webhook body.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Where the event came from.
    pub source: Option<Source>,
    /// Token for replying to this event, if the event type allows replies.
    pub reply_token: Option<ReplyToken>,
    /// Event time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Channel state (`active` or `standby`).
    pub mode: Option<String>,
    /// Platform-assigned event ID.
    pub webhook_event_id: Option<String>,
    /// Resolved payload.
    pub payload: EventPayload,
}

impl Event {
    /// Returns the top-level discriminator.
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Returns the message discriminator for message events.
    pub fn message_kind(&self) -> Option<MessageKind> {
        match &self.payload {
            EventPayload::Message(message) => Some(message.kind()),
            _ => None,
        }
    }

    /// Returns true when the event came from a one-to-one user chat.
    pub fn is_from_user(&self) -> bool {
        self.source.as_ref().is_some_and(Source::is_user)
    }

    /// Converts the millisecond timestamp to a UTC time.
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp).ok().and_then(DateTime::from_timestamp_millis)
    }
}

/// Ordered events decoded from one webhook body.
///
/// Read-only once built; the dispatcher consumes it by value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventBatch {
    destination: Option<String>,
    events: Vec<Event>,
}

impl EventBatch {
    /// Creates a batch from decoded events, preserving their order.
    pub fn new(destination: Option<String>, events: Vec<Event>) -> Self {
        Self { destination, events }
    }

    /// Bot user ID the webhook was sent to.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Events in delivery order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events in the batch.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true when the batch holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl IntoIterator for EventBatch {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

/// Message sent back to the platform.
///
/// Serializes to the platform's message object shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    /// Plain text message.
    Text {
        /// Message body.
        text: String,
    },
    /// Structured flex layout; `contents` is opaque to the core.
    Flex {
        /// Fallback text for notifications and old clients.
        #[serde(rename = "altText")]
        alt_text: String,
        /// Bubble or carousel container.
        contents: serde_json::Value,
    },
}

impl OutboundMessage {
    /// Creates a text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates a flex message.
    pub fn flex(alt_text: impl Into<String>, contents: serde_json::Value) -> Self {
        Self::Flex { alt_text: alt_text.into(), contents }
    }
}

/// A reply call: one token, one to [`ReplyRequest::MAX_MESSAGES`] messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    reply_token: ReplyToken,
    messages: Vec<OutboundMessage>,
}

impl ReplyRequest {
    /// Maximum number of messages the platform accepts per reply.
    pub const MAX_MESSAGES: usize = 5;

    /// Builds a reply request.
    ///
    /// # Errors
    ///
    /// Returns `ReplyError::InvalidMessageCount` for zero messages or more
    /// than [`Self::MAX_MESSAGES`].
    pub fn new(reply_token: ReplyToken, messages: Vec<OutboundMessage>) -> Result<Self, ReplyError> {
        if messages.is_empty() || messages.len() > Self::MAX_MESSAGES {
            return Err(ReplyError::InvalidMessageCount { count: messages.len() });
        }
        Ok(Self { reply_token, messages })
    }

    /// Builds a reply request carrying a single message.
    pub fn single(reply_token: ReplyToken, message: OutboundMessage) -> Self {
        Self { reply_token, messages: vec![message] }
    }

    /// Token this reply answers.
    pub fn reply_token(&self) -> &ReplyToken {
        &self.reply_token
    }

    /// Messages in send order.
    pub fn messages(&self) -> &[OutboundMessage] {
        &self.messages
    }
}
