use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::proxy::handlers::errors::upstream_error_response;
use crate::proxy::state::AppState;
use crate::proxy::telemetry::{self, ServiceState};

/// GET /api/external/getUsage/:account_id
///
/// The traffic record is the primary fact: if it cannot be fetched the
/// request fails. Server health and online presence are best-effort
/// decorations and degrade to `Unavailable` instead of failing the request.
pub async fn handle_get_usage(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Response {
    info!("Usage lookup for {}", account_id);

    let snapshot = match state.core.upstream.get_client_traffics(&account_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Usage lookup for {} failed: {}", account_id, e);
            return upstream_error_response(e);
        }
    };

    let server_status = match state.core.upstream.get_server_status().await {
        Ok(status) => status,
        Err(e) => {
            warn!("Server status unavailable: {}", e);
            ServiceState::Unavailable
        }
    };

    let online = match state.core.upstream.get_online_users().await {
        Ok(online) => {
            if online.contains(&snapshot.account_id) {
                ServiceState::Online
            } else {
                ServiceState::Offline
            }
        }
        Err(e) => {
            warn!("Online user list unavailable: {}", e);
            ServiceState::Unavailable
        }
    };

    let normalized = telemetry::normalize(&snapshot, Utc::now().timestamp_millis());
    Json(telemetry::usage_response(&normalized, server_status, online)).into_response()
}

/// GET /api/external/session-status
pub async fn handle_session_status(State(state): State<AppState>) -> Response {
    Json(state.core.sessions.session_status()).into_response()
}

/// GET /health
pub async fn handle_health() -> Response {
    Json(json!({
        "status": "ok",
        "time": Utc::now().to_rfc3339(),
    }))
    .into_response()
}
