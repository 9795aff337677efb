//! linehook HTTP API.
//!
//! Wires the core pipeline to an axum router: the webhook endpoint, the
//! health probe, the bot's command handlers, and layered configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
pub mod config;
pub mod handlers;
pub mod server;

pub use commands::default_routes;
pub use config::Config;
pub use server::{create_router, start_server, AppState, HttpLimits};
