//! Text message commands.

use async_trait::async_trait;
use linehook_core::{
    Event, EventHandler, EventKind, EventPayload, HandlerError, MessageContent, OutboundMessage,
    Outcome, ReplyRequest, ReplyToken, ReplyTransport,
};
use tracing::debug;

use super::layouts;

/// What a text message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `reservation`: prompt plus reservation form.
    Reservation,
    /// `demo`: demo bubble.
    Demo,
    /// Anything else is echoed back.
    Echo(&'a str),
}

impl<'a> Command<'a> {
    /// Matches `text` exactly against the command words.
    pub fn parse(text: &'a str) -> Self {
        match text {
            "reservation" => Self::Reservation,
            "demo" => Self::Demo,
            other => Self::Echo(other),
        }
    }

    fn into_request(self, reply_token: ReplyToken) -> Result<ReplyRequest, HandlerError> {
        let request = match self {
            Self::Reservation => ReplyRequest::new(reply_token, vec![
                OutboundMessage::text(layouts::RESERVATION_PROMPT),
                OutboundMessage::flex(layouts::RESERVATION_ALT_TEXT, layouts::reservation_form()),
            ])?,
            Self::Demo => ReplyRequest::single(
                reply_token,
                OutboundMessage::flex(layouts::DEMO_ALT_TEXT, layouts::demo_bubble()),
            ),
            Self::Echo(text) => ReplyRequest::single(reply_token, OutboundMessage::text(text)),
        };
        Ok(request)
    }
}

/// Handles text messages from one-to-one chats.
#[derive(Debug, Default)]
pub struct TextCommandHandler;

#[async_trait]
impl EventHandler for TextCommandHandler {
    async fn handle(
        &self,
        event: Event,
        transport: &dyn ReplyTransport,
    ) -> Result<Outcome, HandlerError> {
        if !event.is_from_user() {
            debug!(source = ?event.source.as_ref().map(|s| s.type_name()), "Ignoring non-user text message");
            return Ok(Outcome::Ignored);
        }

        let EventPayload::Message(MessageContent::Text { text, .. }) = &event.payload else {
            return Ok(Outcome::Ignored);
        };

        let reply_token = event
            .reply_token
            .clone()
            .ok_or(HandlerError::MissingReplyToken { event_type: EventKind::Message })?;

        let command = Command::parse(text);
        debug!(command = ?command, "Replying to text message");

        transport.reply(command.into_request(reply_token)?).await?;
        Ok(Outcome::Replied)
    }
}

#[cfg(test)]
mod tests {
    use linehook_core::Source;
    use linehook_testing::RecordingTransport;

    use super::*;

    fn text_event(source: Source, text: &str) -> Event {
        Event {
            source: Some(source),
            reply_token: Some(ReplyToken::new("R1")),
            timestamp: 0,
            mode: None,
            webhook_event_id: None,
            payload: EventPayload::Message(MessageContent::Text {
                id: "1".to_string(),
                text: text.to_string(),
            }),
        }
    }

    fn user() -> Source {
        Source::User { user_id: "U1".to_string() }
    }

    #[test]
    fn parses_exact_commands() {
        assert_eq!(Command::parse("reservation"), Command::Reservation);
        assert_eq!(Command::parse("demo"), Command::Demo);
        assert_eq!(Command::parse("Demo"), Command::Echo("Demo"));
        assert_eq!(Command::parse(" reservation"), Command::Echo(" reservation"));
    }

    #[tokio::test]
    async fn echoes_plain_text() {
        let transport = RecordingTransport::new();
        let outcome = TextCommandHandler.handle(text_event(user(), "hi"), &transport).await.unwrap();

        assert_eq!(outcome, Outcome::Replied);
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reply_token().as_str(), "R1");
        assert_eq!(sent[0].messages(), &[OutboundMessage::text("hi")]);
    }

    #[tokio::test]
    async fn reservation_sends_prompt_and_form_in_one_reply() {
        let transport = RecordingTransport::new();
        TextCommandHandler.handle(text_event(user(), "reservation"), &transport).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].messages().len(), 2);
        assert_eq!(sent[0].messages()[0], OutboundMessage::text(layouts::RESERVATION_PROMPT));
        assert!(matches!(sent[0].messages()[1], OutboundMessage::Flex { .. }));
    }

    #[tokio::test]
    async fn demo_sends_flex_bubble() {
        let transport = RecordingTransport::new();
        TextCommandHandler.handle(text_event(user(), "demo"), &transport).await.unwrap();

        let sent = transport.sent();
        assert!(matches!(
            &sent[0].messages()[0],
            OutboundMessage::Flex { alt_text, .. } if alt_text == layouts::DEMO_ALT_TEXT
        ));
    }

    #[tokio::test]
    async fn group_and_room_messages_ignored() {
        let transport = RecordingTransport::new();
        let group = Source::Group { group_id: "G1".to_string(), user_id: None };
        let room = Source::Room { room_id: "Ra".to_string(), user_id: Some("U1".to_string()) };

        for source in [group, room] {
            let outcome =
                TextCommandHandler.handle(text_event(source, "hi"), &transport).await.unwrap();
            assert_eq!(outcome, Outcome::Ignored);
        }
        assert!(transport.is_empty());
    }
}
