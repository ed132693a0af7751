pub mod constants;
pub mod error;
pub mod models;
pub mod modules;
pub mod proxy;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::models::AppConfig;
use crate::modules::system::{config as system_config, logger, scheduler};
use crate::proxy::middleware::FixedWindowLimiter;
use crate::proxy::server::start_server;
use crate::proxy::session::{SessionConfig, SessionManager};
use crate::proxy::state::{AppState, CoreServices};
use crate::proxy::upstream::{PanelHttp, UpstreamClient};

/// Wires the long-lived services for one configuration.
pub fn build_state(config: AppConfig) -> Result<AppState, String> {
    let transport = Arc::new(PanelHttp::new(&config.panel)?);
    let sessions = Arc::new(SessionManager::new(
        Arc::clone(&transport),
        SessionConfig::from(&config.panel),
    ));
    let upstream = UpstreamClient::new(
        Arc::clone(&transport),
        Arc::clone(&sessions),
        config.panel.max_retry_attempts,
    );
    let limiter = Arc::new(FixedWindowLimiter::new(&config.rate_limit));

    Ok(AppState {
        core: Arc::new(CoreServices {
            sessions,
            upstream,
            limiter,
        }),
        config: Arc::new(config),
    })
}

async fn start_service() -> Result<(), String> {
    let config = system_config::load_app_config().map_err(|e| e.to_string())?;
    info!(
        "Starting panelgate against {} (port {})",
        config.panel.base_url, config.server.port
    );

    let maintenance_config = config.maintenance.clone();
    let state = build_state(config)?;
    let cancel = CancellationToken::new();

    let server = start_server(state.clone(), cancel.clone()).await?;
    let maintenance = scheduler::start_maintenance(
        Arc::clone(&state.core.sessions),
        Arc::clone(&state.core.limiter),
        maintenance_config,
        cancel.clone(),
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {}", e))?;
    info!("Shutdown signal received");
    cancel.cancel();

    let _ = maintenance.await;
    let _ = server.await;
    info!("Shutdown complete");
    Ok(())
}

pub fn run() {
    logger::init_logger();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(start_service()) {
        error!("Fatal startup error: {}", e);
        std::process::exit(1);
    }
}
