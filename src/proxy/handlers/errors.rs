use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::{AuthError, UpstreamError};

/// Uniform failure body, mirroring the panel's own envelope shape.
pub fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "msg": msg.into(),
            "obj": null,
        })),
    )
        .into_response()
}

/// Maps an upstream failure to the client-facing status code. Missing
/// accounts are the caller's problem (404); an exhausted login budget means
/// we are deliberately not talking to the panel right now (503); everything
/// else is a bad gateway.
pub fn upstream_error_response(err: UpstreamError) -> Response {
    match err {
        UpstreamError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, msg),
        UpstreamError::Auth(AuthError::AttemptsExhausted(_)) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Panel authentication is temporarily suspended after repeated failures",
        ),
        other => error_response(StatusCode::BAD_GATEWAY, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = upstream_error_response(UpstreamError::NotFound("nope".to_string()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn exhausted_attempts_map_to_503() {
        let response =
            upstream_error_response(UpstreamError::Auth(AuthError::AttemptsExhausted(5)));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn recovery_failure_maps_to_502() {
        let response = upstream_error_response(UpstreamError::SessionRecoveryFailed(3));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
