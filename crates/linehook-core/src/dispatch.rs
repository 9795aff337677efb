//! Event routing and batch dispatch.
//!
//! A [`RoutingTable`] maps `(event type, message type)` keys to handlers.
//! The [`Dispatcher`] walks a batch in order, looks each event up, and runs
//! the matching handler to completion before touching the next event.
//!
//! ```text
//!  EventBatch [E1, E2, E3]
//!        │
//!        ▼
//!  ┌────────────┐  RouteKey   ┌──────────────┐  miss   ┌─────────┐
//!  │ Dispatcher │ ──────────▶ │ RoutingTable │ ──────▶ │ Ignored │
//!  └────────────┘             └──────────────┘         └─────────┘
//!                                    │ hit
//!                                    ▼
//!                             EventHandler ──▶ ReplyTransport
//! ```
//!
//! The first handler error stops the batch. Replies already sent for earlier
//! events stay sent: replies are not transactional, so a failed request may
//! have delivered a prefix of its batch.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tracing::{debug, error, info, instrument};

use crate::{
    error::{DispatchError, HandlerError},
    models::{Event, EventBatch, EventKind, MessageKind},
    transport::ReplyTransport,
};

/// Result of a handler that completed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler sent a reply.
    Replied,
    /// The handler chose not to act on the event.
    Ignored,
}

/// Business logic for one `(event type, message type)` route.
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync + std::fmt::Debug {
    /// Handles one event, replying through `transport` when appropriate.
    async fn handle(
        &self,
        event: Event,
        transport: &dyn ReplyTransport,
    ) -> Result<Outcome, HandlerError>;
}

/// Routing key: event type plus message type for message events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    /// Top-level event type.
    pub event: EventKind,
    /// Message type; `None` for non-message events.
    pub message: Option<MessageKind>,
}

impl RouteKey {
    /// Key for a non-message event type.
    pub const fn event(event: EventKind) -> Self {
        Self { event, message: None }
    }

    /// Key for a message event of the given message type.
    pub const fn message(kind: MessageKind) -> Self {
        Self { event: EventKind::Message, message: Some(kind) }
    }

    /// Key an event is routed by.
    pub fn for_event(event: &Event) -> Self {
        Self { event: event.kind(), message: event.message_kind() }
    }
}

/// Table of routes; keys without an entry are ignored.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<RouteKey, Arc<dyn EventHandler>>,
}

impl RoutingTable {
    /// Creates an empty table that ignores everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the handler for `key`.
    #[must_use]
    pub fn route(mut self, key: RouteKey, handler: Arc<dyn EventHandler>) -> Self {
        self.routes.insert(key, handler);
        self
    }

    /// Returns the handler for `key`, if any.
    pub fn lookup(&self, key: RouteKey) -> Option<&Arc<dyn EventHandler>> {
        self.routes.get(&key)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true when no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Counts from a fully processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Events whose handler sent a reply.
    pub handled: usize,
    /// Events with no route, or whose handler declined them.
    pub ignored: usize,
}

/// Routes decoded batches to handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    routes: RoutingTable,
    transport: Arc<dyn ReplyTransport>,
}

impl Dispatcher {
    /// Creates a dispatcher over `routes`, replying through `transport`.
    pub fn new(routes: RoutingTable, transport: Arc<dyn ReplyTransport>) -> Self {
        Self { routes, transport }
    }

    /// Returns the routing table.
    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    /// Processes every event of `batch` in order.
    ///
    /// # Errors
    ///
    /// - `DispatchError::Handler` for the first failing handler; later
    ///   events are not processed
    /// - `DispatchError::DuplicateReplyToken` when a routed event reuses a
    ///   token already used by an earlier routed event of the batch
    #[instrument(name = "dispatch_batch", skip_all, fields(events = batch.len()))]
    pub async fn dispatch(&self, batch: EventBatch) -> Result<DispatchReport, DispatchError> {
        let mut report = DispatchReport::default();
        let mut used_tokens = HashSet::new();

        for (index, event) in batch.into_iter().enumerate() {
            let key = RouteKey::for_event(&event);

            let Some(handler) = self.routes.lookup(key) else {
                debug!(index, event_type = %key.event, message_type = ?key.message, "No route, ignoring event");
                report.ignored += 1;
                continue;
            };

            if let Some(token) = &event.reply_token {
                if !used_tokens.insert(token.clone()) {
                    error!(index, reply_token = %token, "Reply token reused within batch");
                    return Err(DispatchError::DuplicateReplyToken {
                        index,
                        reply_token: token.clone(),
                    });
                }
            }

            let reply_token = event.reply_token.clone();
            match handler.handle(event, self.transport.as_ref()).await {
                Ok(Outcome::Replied) => {
                    debug!(index, event_type = %key.event, "Event handled");
                    report.handled += 1;
                },
                Ok(Outcome::Ignored) => {
                    debug!(index, event_type = %key.event, "Handler ignored event");
                    report.ignored += 1;
                },
                Err(source) => {
                    error!(
                        index,
                        event_type = %key.event,
                        reply_token = ?reply_token.as_ref().map(|t| t.as_str()),
                        error = %source,
                        "Handler failed, aborting remaining events"
                    );
                    return Err(DispatchError::Handler { index, event_type: key.event, source });
                },
            }
        }

        info!(handled = report.handled, ignored = report.ignored, "Batch dispatched");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        error::ReplyError,
        models::{EventPayload, MessageContent, OutboundMessage, ReplyRequest, ReplyToken, Source},
    };

    #[derive(Debug, Default)]
    struct TestTransport {
        sent: Mutex<Vec<ReplyRequest>>,
    }

    #[async_trait::async_trait]
    impl ReplyTransport for TestTransport {
        async fn reply(&self, request: ReplyRequest) -> Result<(), ReplyError> {
            self.sent.lock().unwrap().push(request);
            Ok(())
        }
    }

    /// Echoes text; fails for text "fail".
    #[derive(Debug)]
    struct TestEchoHandler;

    #[async_trait::async_trait]
    impl EventHandler for TestEchoHandler {
        async fn handle(
            &self,
            event: Event,
            transport: &dyn ReplyTransport,
        ) -> Result<Outcome, HandlerError> {
            let EventPayload::Message(MessageContent::Text { text, .. }) = event.payload else {
                return Ok(Outcome::Ignored);
            };
            if text == "fail" {
                return Err(ReplyError::rejected(400, "Invalid reply token").into());
            }
            let token = event
                .reply_token
                .ok_or(HandlerError::MissingReplyToken { event_type: EventKind::Message })?;
            transport.reply(ReplyRequest::single(token, OutboundMessage::text(text))).await?;
            Ok(Outcome::Replied)
        }
    }

    fn text_event(token: &str, text: &str) -> Event {
        Event {
            source: Some(Source::User { user_id: "U1".to_string() }),
            reply_token: Some(ReplyToken::new(token)),
            timestamp: 0,
            mode: None,
            webhook_event_id: None,
            payload: EventPayload::Message(MessageContent::Text {
                id: String::new(),
                text: text.to_string(),
            }),
        }
    }

    fn dispatcher(transport: Arc<TestTransport>) -> Dispatcher {
        let routes =
            RoutingTable::new().route(RouteKey::message(MessageKind::Text), Arc::new(TestEchoHandler));
        Dispatcher::new(routes, transport)
    }

    fn sent_texts(transport: &TestTransport) -> Vec<String> {
        transport
            .sent
            .lock()
            .unwrap()
            .iter()
            .flat_map(|request| request.messages().to_vec())
            .map(|message| match message {
                OutboundMessage::Text { text } => text,
                OutboundMessage::Flex { alt_text, .. } => alt_text,
            })
            .collect()
    }

    #[tokio::test]
    async fn events_dispatched_in_order() {
        let transport = Arc::new(TestTransport::default());
        let batch = EventBatch::new(None, vec![
            text_event("R1", "one"),
            text_event("R2", "two"),
            text_event("R3", "three"),
        ]);

        let report = dispatcher(transport.clone()).dispatch(batch).await.unwrap();

        assert_eq!(report, DispatchReport { handled: 3, ignored: 0 });
        assert_eq!(sent_texts(&transport), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn failure_stops_remaining_events() {
        let transport = Arc::new(TestTransport::default());
        let batch = EventBatch::new(None, vec![
            text_event("R1", "one"),
            text_event("R2", "fail"),
            text_event("R3", "three"),
        ]);

        let result = dispatcher(transport.clone()).dispatch(batch).await;

        assert!(matches!(
            result,
            Err(DispatchError::Handler { index: 1, event_type: EventKind::Message, .. })
        ));
        assert_eq!(sent_texts(&transport), vec!["one"]);
    }

    #[tokio::test]
    async fn unrouted_events_ignored() {
        let transport = Arc::new(TestTransport::default());
        let mut follow = text_event("R1", "");
        follow.payload = EventPayload::Follow;
        let mut image = text_event("R2", "");
        image.payload = EventPayload::Message(MessageContent::Image { id: "1".to_string() });

        let report = dispatcher(transport.clone())
            .dispatch(EventBatch::new(None, vec![follow, image]))
            .await
            .unwrap();

        assert_eq!(report, DispatchReport { handled: 0, ignored: 2 });
        assert!(sent_texts(&transport).is_empty());
    }

    #[tokio::test]
    async fn duplicate_reply_token_rejected() {
        let transport = Arc::new(TestTransport::default());
        let batch = EventBatch::new(None, vec![text_event("R1", "one"), text_event("R1", "two")]);

        let result = dispatcher(transport.clone()).dispatch(batch).await;

        assert!(matches!(result, Err(DispatchError::DuplicateReplyToken { index: 1, .. })));
        assert_eq!(sent_texts(&transport), vec!["one"]);
    }

    #[tokio::test]
    async fn empty_table_ignores_everything() {
        let transport = Arc::new(TestTransport::default());
        let dispatcher = Dispatcher::new(RoutingTable::new(), transport.clone());

        let report =
            dispatcher.dispatch(EventBatch::new(None, vec![text_event("R1", "hi")])).await.unwrap();

        assert_eq!(report.ignored, 1);
        assert!(dispatcher.routes().is_empty());
    }

    #[test]
    fn route_key_for_event() {
        assert_eq!(RouteKey::for_event(&text_event("R1", "hi")), RouteKey::message(MessageKind::Text));

        let mut postback = text_event("R1", "");
        postback.payload = EventPayload::Postback(crate::models::Postback {
            data: "a=b".to_string(),
            params: Default::default(),
        });
        assert_eq!(RouteKey::for_event(&postback), RouteKey::event(EventKind::Postback));
    }
}
