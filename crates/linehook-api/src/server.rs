//! HTTP server setup and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response logging
//! 3. Timeout enforcement
//! 4. Body size limit
//! 5. Handler execution
//!
//! The server stops accepting connections on CTRL+C or SIGTERM and lets
//! in-flight requests finish.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use linehook_core::{Dispatcher, SignatureVerifier};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::handlers;

/// Header carrying the per-request id on responses.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared, immutable per-process state handed to every request.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Verifier keyed with the channel secret.
    pub verifier: SignatureVerifier,
    /// Dispatcher holding the routing table and reply transport.
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Creates application state.
    pub fn new(verifier: SignatureVerifier, dispatcher: Dispatcher) -> Self {
        Self { verifier, dispatcher: Arc::new(dispatcher) }
    }
}

/// Limits applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct HttpLimits {
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// Largest accepted body.
    pub max_body_bytes: usize,
}

impl Default for HttpLimits {
    fn default() -> Self {
        Self { request_timeout: Duration::from_secs(30), max_body_bytes: 1024 * 1024 }
    }
}

/// Creates the router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use linehook_api::{commands::default_routes, create_router, AppState, HttpLimits};
/// use linehook_core::{Dispatcher, SignatureVerifier};
/// use linehook_reply::{ClientConfig, LineReplyClient};
/// use std::sync::Arc;
///
/// # fn build() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Arc::new(LineReplyClient::new(ClientConfig::new("token"))?);
/// let dispatcher = Dispatcher::new(default_routes(), transport);
/// let state = AppState::new(SignatureVerifier::new("secret")?, dispatcher);
/// let app = create_router(state, HttpLimits::default());
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState, limits: HttpLimits) -> Router {
    Router::new()
        .route("/", post(handlers::receive_webhook))
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limits.max_body_bytes))
        .layer(TimeoutLayer::new(limits.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Adds an `X-Request-Id` header to every response.
async fn inject_request_id(mut req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Binds `addr` and serves until a shutdown signal arrives.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound or the server
/// fails while running.
pub async fn start_server(
    state: AppState,
    limits: HttpLimits,
    addr: SocketAddr,
) -> Result<(), std::io::Error> {
    let app = create_router(state, limits);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!(
        addr = %actual_addr,
        request_timeout_secs = limits.request_timeout.as_secs(),
        max_body_bytes = limits.max_body_bytes,
        "HTTP server listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for CTRL+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Draining in-flight requests");
}
