//! HTTP request handlers.
//!
//! - `webhook` - signed event batches from the platform
//! - `health` - liveness probe
//!
//! Failures are returned as `{"error":{"code":..,"message":..}}` with a
//! generic message; the detailed cause only goes to the log.

pub mod health;
pub mod webhook;

pub use health::health_check;
pub use webhook::receive_webhook;
