//! Webhook endpoint: verify, decode, dispatch.
//!
//! Each stage short-circuits the next. An unverified body is never decoded
//! and a malformed body never reaches a handler.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use linehook_core::{decode, SignatureError, WebhookError, SIGNATURE_HEADER};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::server::AppState;

/// Response for a fully processed batch.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Events that produced a reply.
    pub handled: usize,
    /// Events nobody acted on.
    pub ignored: usize,
}

/// Error response with code and message.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details including code and message
    pub error: ErrorDetail,
}

/// Detailed error information.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code (E1001, E1002, E2001)
    pub code: &'static str,
    /// Generic description; never includes the underlying cause
    pub message: &'static str,
}

/// HTTP wrapper for [`WebhookError`].
#[derive(Debug)]
pub struct ApiError(pub WebhookError);

impl<E> From<E> for ApiError
where
    E: Into<WebhookError>,
{
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
        let body = ErrorResponse {
            error: ErrorDetail { code: self.0.code(), message: self.0.public_message() },
        };

        (status, Json(body)).into_response()
    }
}

/// Receives a signed event batch and dispatches every event in order.
///
/// # Errors
///
/// - 403 (`E1001`): signature header missing or not matching the body
/// - 400 (`E1002`): body is not a valid event batch
/// - 400 (`E2001`): a handler failed; later events were not processed
#[instrument(
    name = "receive_webhook",
    skip_all,
    fields(body_len = body.len())
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .ok_or(SignatureError::MissingSignature)
        .and_then(|value| {
            value.to_str().map_err(|e| SignatureError::InvalidEncoding(e.to_string()))
        })
        .inspect_err(|e| warn!(error = %e, "Rejecting request without usable signature"))?;

    state
        .verifier
        .verify(&body, signature)
        .inspect_err(|e| warn!(error = %e, "Signature verification failed"))?;

    let batch = decode(&body).inspect_err(|e| {
        error!(error = %e, body = %String::from_utf8_lossy(&body), "Failed to decode webhook body");
    })?;

    info!(
        events = batch.len(),
        destination = batch.destination().unwrap_or("unknown"),
        "Webhook verified"
    );

    let report = state.dispatcher.dispatch(batch).await?;

    Ok(Json(WebhookResponse { status: "ok", handled: report.handled, ignored: report.ignored }))
}

#[cfg(test)]
mod tests {
    use linehook_core::DecodeError;

    use super::*;

    #[test]
    fn signature_error_maps_to_forbidden() {
        let response = ApiError::from(SignatureError::VerificationFailed).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn decode_error_maps_to_bad_request() {
        let response =
            ApiError::from(DecodeError::MissingField { index: 0, field: "type" }).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
