use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::proxy::routes::build_router;
use crate::proxy::state::AppState;

/// Binds the listener and serves the API until the token is cancelled.
pub async fn start_server(
    state: AppState,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, String> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("failed to bind {}: {}", addr, e))?;
    let local = listener
        .local_addr()
        .map_err(|e| format!("failed to read local address: {}", e))?;
    info!("API listening on http://{}", local);

    let app = build_router(state);
    let handle = tokio::spawn(async move {
        let shutdown = async move { cancel.cancelled().await };
        if let Err(e) = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        {
            error!("HTTP server terminated with error: {}", e);
        }
        info!("HTTP server stopped");
    });

    Ok(handle)
}
