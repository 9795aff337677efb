//! Bot behaviour: which events get which replies.
//!
//! | Route               | Handler                |
//! |---------------------|------------------------|
//! | message / text      | [`TextCommandHandler`] |
//! | postback            | [`PostbackHandler`]    |
//!
//! Everything else has no route and is ignored by the dispatcher.

pub mod layouts;
pub mod postback;
pub mod text;

use std::sync::Arc;

use linehook_core::{EventKind, MessageKind, RouteKey, RoutingTable};
pub use postback::PostbackHandler;
pub use text::{Command, TextCommandHandler};

/// Routing table used by the service.
pub fn default_routes() -> RoutingTable {
    RoutingTable::new()
        .route(RouteKey::message(MessageKind::Text), Arc::new(TextCommandHandler))
        .route(RouteKey::event(EventKind::Postback), Arc::new(PostbackHandler))
}
