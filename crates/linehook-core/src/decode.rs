//! Webhook body decoding.
//!
//! Parses the raw body into an [`EventBatch`] in two steps: serde reads the
//! envelope into loosely-typed wire structs, then each event is resolved by
//! its `type` discriminator (and, for messages, by `message.type`) into a
//! closed variant. Unknown discriminator values resolve to `Unknown`
//! variants at every level; only structural problems are errors, and any
//! error rejects the whole body.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::DecodeError,
    models::{Event, EventBatch, EventPayload, MessageContent, Postback, ReplyToken, Source},
};

const KNOWN_EVENT_TYPES: &[&str] = &["message", "postback", "follow", "unfollow", "join", "leave"];
const KNOWN_MESSAGE_TYPES: &[&str] =
    &["text", "image", "video", "audio", "file", "location", "sticker"];
const KNOWN_SOURCE_TYPES: &[&str] = &["user", "group", "room"];

#[derive(Debug, Deserialize, Serialize)]
struct WireEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
    events: Vec<WireEvent>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<WireSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_token: Option<String>,
    #[serde(default)]
    timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    postback: Option<WirePostback>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireSource {
    #[serde(rename = "type")]
    source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    room_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    package_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sticker_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct WirePostback {
    data: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

/// Decodes a webhook body into an ordered event batch.
///
/// # Errors
///
/// Returns `DecodeError::Json` when the body is not a JSON envelope with an
/// `events` array of objects carrying a string `type`, and
/// `DecodeError::MissingField` when a known event or message type lacks a
/// field it requires.
///
/// # Example
///
/// ```
/// use linehook_core::{decode, EventKind};
///
/// let body = br#"{"events":[{"type":"follow","replyToken":"R1","source":{"type":"user","userId":"U1"}}]}"#;
/// let batch = decode(body).unwrap();
///
/// assert_eq!(batch.len(), 1);
/// assert_eq!(batch.events()[0].kind(), EventKind::Follow);
/// ```
pub fn decode(body: &[u8]) -> Result<EventBatch, DecodeError> {
    let envelope: WireEnvelope = serde_json::from_slice(body)?;

    let events = envelope
        .events
        .into_iter()
        .enumerate()
        .map(|(index, event)| resolve_event(index, event))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EventBatch::new(envelope.destination, events))
}

/// Encodes a batch back into the webhook body shape.
///
/// Inverse of [`decode`] for every batch `decode` can produce.
///
/// # Errors
///
/// Returns `DecodeError::ReservedType` when an `Unknown` variant carries a
/// discriminator `decode` would resolve to a known variant, and
/// `DecodeError::Json` for non-finite location coordinates.
pub fn encode(batch: &EventBatch) -> Result<Vec<u8>, DecodeError> {
    let events = batch
        .events()
        .iter()
        .enumerate()
        .map(|(index, event)| wire_event(index, event))
        .collect::<Result<Vec<_>, _>>()?;
    let envelope = WireEnvelope { destination: batch.destination().map(str::to_string), events };
    Ok(serde_json::to_vec(&envelope)?)
}

fn resolve_event(index: usize, wire: WireEvent) -> Result<Event, DecodeError> {
    let source = wire.source.map(|source| resolve_source(index, source)).transpose()?;
    let reply_token = wire.reply_token.map(ReplyToken::new);

    let payload = match wire.event_type.as_str() {
        "message" => {
            let message = wire.message.ok_or(DecodeError::MissingField { index, field: "message" })?;
            EventPayload::Message(resolve_message(index, message)?)
        },
        "postback" => {
            let postback =
                wire.postback.ok_or(DecodeError::MissingField { index, field: "postback" })?;
            let data =
                postback.data.ok_or(DecodeError::MissingField { index, field: "postback.data" })?;
            EventPayload::Postback(Postback { data, params: postback.params })
        },
        "follow" => EventPayload::Follow,
        "unfollow" => EventPayload::Unfollow,
        "join" => EventPayload::Join,
        "leave" => EventPayload::Leave,
        _ => EventPayload::Unknown { event_type: wire.event_type },
    };

    if requires_reply_token(&payload) && reply_token.is_none() {
        return Err(DecodeError::MissingField { index, field: "replyToken" });
    }

    Ok(Event {
        source,
        reply_token,
        timestamp: wire.timestamp,
        mode: wire.mode,
        webhook_event_id: wire.webhook_event_id,
        payload,
    })
}

fn requires_reply_token(payload: &EventPayload) -> bool {
    matches!(
        payload,
        EventPayload::Message(_) | EventPayload::Postback(_) | EventPayload::Follow | EventPayload::Join
    )
}

fn resolve_source(index: usize, wire: WireSource) -> Result<Source, DecodeError> {
    let source = match wire.source_type.as_str() {
        "user" => Source::User {
            user_id: wire.user_id.ok_or(DecodeError::MissingField { index, field: "source.userId" })?,
        },
        "group" => Source::Group {
            group_id: wire
                .group_id
                .ok_or(DecodeError::MissingField { index, field: "source.groupId" })?,
            user_id: wire.user_id,
        },
        "room" => Source::Room {
            room_id: wire.room_id.ok_or(DecodeError::MissingField { index, field: "source.roomId" })?,
            user_id: wire.user_id,
        },
        _ => Source::Unknown { source_type: wire.source_type },
    };
    Ok(source)
}

fn resolve_message(index: usize, wire: WireMessage) -> Result<MessageContent, DecodeError> {
    let missing = |field| DecodeError::MissingField { index, field };
    let id = wire.id;

    let content = match wire.message_type.as_str() {
        "text" => MessageContent::Text { id, text: wire.text.ok_or_else(|| missing("message.text"))? },
        "image" => MessageContent::Image { id },
        "video" => MessageContent::Video { id },
        "audio" => MessageContent::Audio { id },
        "file" => MessageContent::File { id, file_name: wire.file_name },
        "location" => MessageContent::Location {
            id,
            title: wire.title,
            address: wire.address,
            latitude: wire.latitude.ok_or_else(|| missing("message.latitude"))?,
            longitude: wire.longitude.ok_or_else(|| missing("message.longitude"))?,
        },
        "sticker" => MessageContent::Sticker {
            id,
            package_id: wire.package_id.ok_or_else(|| missing("message.packageId"))?,
            sticker_id: wire.sticker_id.ok_or_else(|| missing("message.stickerId"))?,
        },
        _ => MessageContent::Unknown { id, message_type: wire.message_type },
    };
    Ok(content)
}

fn reject_reserved(index: usize, known: &[&str], type_name: &str) -> Result<(), DecodeError> {
    if known.contains(&type_name) {
        return Err(DecodeError::ReservedType { index, type_name: type_name.to_string() });
    }
    Ok(())
}

fn wire_event(index: usize, event: &Event) -> Result<WireEvent, DecodeError> {
    let (event_type, message, postback) = match &event.payload {
        EventPayload::Message(message) => {
            ("message".to_string(), Some(wire_message(index, message)?), None)
        },
        EventPayload::Postback(postback) => (
            "postback".to_string(),
            None,
            Some(WirePostback { data: Some(postback.data.clone()), params: postback.params.clone() }),
        ),
        EventPayload::Follow => ("follow".to_string(), None, None),
        EventPayload::Unfollow => ("unfollow".to_string(), None, None),
        EventPayload::Join => ("join".to_string(), None, None),
        EventPayload::Leave => ("leave".to_string(), None, None),
        EventPayload::Unknown { event_type } => {
            reject_reserved(index, KNOWN_EVENT_TYPES, event_type)?;
            (event_type.clone(), None, None)
        },
    };
    let source = event.source.as_ref().map(|source| wire_source(index, source)).transpose()?;

    Ok(WireEvent {
        event_type,
        source,
        reply_token: event.reply_token.as_ref().map(|token| token.as_str().to_string()),
        timestamp: event.timestamp,
        mode: event.mode.clone(),
        webhook_event_id: event.webhook_event_id.clone(),
        message,
        postback,
    })
}

fn wire_source(index: usize, source: &Source) -> Result<WireSource, DecodeError> {
    let mut wire = WireSource {
        source_type: source.type_name().to_string(),
        user_id: None,
        group_id: None,
        room_id: None,
    };
    match source {
        Source::User { user_id } => wire.user_id = Some(user_id.clone()),
        Source::Group { group_id, user_id } => {
            wire.group_id = Some(group_id.clone());
            wire.user_id = user_id.clone();
        },
        Source::Room { room_id, user_id } => {
            wire.room_id = Some(room_id.clone());
            wire.user_id = user_id.clone();
        },
        Source::Unknown { source_type } => reject_reserved(index, KNOWN_SOURCE_TYPES, source_type)?,
    }
    Ok(wire)
}

fn wire_message(index: usize, message: &MessageContent) -> Result<WireMessage, DecodeError> {
    let mut wire = WireMessage {
        message_type: message.kind().to_string(),
        id: message.id().to_string(),
        ..WireMessage::default()
    };
    match message {
        MessageContent::Text { text, .. } => wire.text = Some(text.clone()),
        MessageContent::File { file_name, .. } => wire.file_name = file_name.clone(),
        MessageContent::Location { title, address, latitude, longitude, .. } => {
            wire.title = title.clone();
            wire.address = address.clone();
            wire.latitude = Some(*latitude);
            wire.longitude = Some(*longitude);
        },
        MessageContent::Sticker { package_id, sticker_id, .. } => {
            wire.package_id = Some(package_id.clone());
            wire.sticker_id = Some(sticker_id.clone());
        },
        MessageContent::Unknown { message_type, .. } => {
            reject_reserved(index, KNOWN_MESSAGE_TYPES, message_type)?;
            wire.message_type = message_type.clone();
        },
        MessageContent::Image { .. } | MessageContent::Video { .. } | MessageContent::Audio { .. } => {},
    }
    Ok(wire)
}
