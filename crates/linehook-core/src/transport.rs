//! Reply transport abstraction.
//!
//! Handlers send replies through this trait so the dispatcher never depends
//! on a concrete HTTP client. The production implementation lives in
//! `linehook-reply`; tests substitute recording or failing transports.

use std::sync::Arc;

use crate::{error::ReplyError, models::ReplyRequest};

/// Sends reply messages for an inbound event.
///
/// Implementations attempt delivery once and report the outcome. Retrying
/// is an implementation concern; callers treat any error as final.
#[async_trait::async_trait]
pub trait ReplyTransport: Send + Sync + std::fmt::Debug {
    /// Sends all messages of `request` in one reply call.
    async fn reply(&self, request: ReplyRequest) -> Result<(), ReplyError>;
}

#[async_trait::async_trait]
impl<T: ReplyTransport + ?Sized> ReplyTransport for Arc<T> {
    async fn reply(&self, request: ReplyRequest) -> Result<(), ReplyError> {
        (**self).reply(request).await
    }
}
