//! Postback actions.

use async_trait::async_trait;
use linehook_core::{
    Event, EventHandler, EventKind, EventPayload, HandlerError, OutboundMessage, Outcome,
    ReplyRequest, ReplyTransport,
};
use tracing::debug;

use super::layouts;

/// Picker params checked for the chosen reservation time, in order.
const WHEN_PARAMS: [&str; 2] = ["datetime", "date"];

/// Handles postbacks from one-to-one chats.
///
/// Only `action=reserve` is understood; other actions are ignored.
#[derive(Debug, Default)]
pub struct PostbackHandler;

#[async_trait]
impl EventHandler for PostbackHandler {
    async fn handle(
        &self,
        event: Event,
        transport: &dyn ReplyTransport,
    ) -> Result<Outcome, HandlerError> {
        if !event.is_from_user() {
            debug!("Ignoring non-user postback");
            return Ok(Outcome::Ignored);
        }

        let EventPayload::Postback(postback) = &event.payload else {
            return Ok(Outcome::Ignored);
        };

        let fields = postback.data_fields();
        if fields.get("action") != Some(&"reserve") {
            debug!(data = %postback.data, "Ignoring unrecognized postback action");
            return Ok(Outcome::Ignored);
        }

        let reply_token = event
            .reply_token
            .clone()
            .ok_or(HandlerError::MissingReplyToken { event_type: EventKind::Postback })?;

        let when = WHEN_PARAMS.iter().find_map(|key| postback.params.get(*key));
        let message = match when {
            Some(when) => OutboundMessage::text(format!("Reservation received for {when}")),
            None => OutboundMessage::text(layouts::RESERVATION_PROMPT),
        };

        transport.reply(ReplyRequest::single(reply_token, message)).await?;
        Ok(Outcome::Replied)
    }
}
