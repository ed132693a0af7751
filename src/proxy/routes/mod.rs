use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;

use crate::proxy::handlers::usage::{handle_get_usage, handle_health, handle_session_status};
use crate::proxy::middleware::{cors_layer, rate_limit_middleware};
use crate::proxy::state::AppState;

/// Assembles the full application router. The health probe sits outside the
/// rate-limited API so load balancers can poll it freely.
pub fn build_router(state: AppState) -> Router {
    let limiter = Arc::clone(&state.core.limiter);
    let cors = cors_layer(&state.config.server.allowed_origins);

    let api = Router::new()
        .route("/getUsage/:account_id", get(handle_get_usage))
        .route("/session-status", get(handle_session_status))
        .layer(from_fn_with_state(limiter, rate_limit_middleware));

    Router::new()
        .route("/health", get(handle_health))
        .nest("/api/external", api)
        .layer(cors)
        .with_state(state)
}
