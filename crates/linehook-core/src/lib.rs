//! Core of the linehook webhook receiver.
//!
//! Provides the strongly-typed event model, request signature verification,
//! the event decoder, and the dispatcher that routes decoded events to
//! handlers. The HTTP surface and the concrete reply transport live in
//! sibling crates and depend on the types defined here.
//!
//! # Pipeline
//!
//! ```text
//! body + x-line-signature
//!        │
//!        ▼
//! ┌──────────────────┐  403   ┌────────────┐  400   ┌────────────┐  400
//! │SignatureVerifier │──────▶ │  decode()  │──────▶ │ Dispatcher │──────▶
//! └──────────────────┘        └────────────┘        └────────────┘
//!                                                         │ per event, in order
//!                                                         ▼
//!                                               EventHandler ─▶ ReplyTransport
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decode;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod signature;
pub mod transport;

pub use decode::{decode, encode};
pub use dispatch::{
    DispatchReport, Dispatcher, EventHandler, Outcome, RouteKey, RoutingTable,
};
pub use error::{
    DecodeError, DispatchError, HandlerError, ReplyError, SignatureError, WebhookError,
};
pub use models::{
    Event, EventBatch, EventKind, EventPayload, MessageContent, MessageKind, OutboundMessage,
    Postback, ReplyRequest, ReplyToken, Source,
};
pub use signature::{sign, verify, SignatureVerifier, SIGNATURE_HEADER};
pub use transport::ReplyTransport;
