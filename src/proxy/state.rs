use std::sync::Arc;

use crate::models::AppConfig;
use crate::proxy::middleware::FixedWindowLimiter;
use crate::proxy::session::SessionManager;
use crate::proxy::upstream::{PanelHttp, UpstreamClient};

/// Long-lived services shared by every request handler.
pub struct CoreServices {
    pub sessions: Arc<SessionManager<PanelHttp>>,
    pub upstream: UpstreamClient<PanelHttp>,
    pub limiter: Arc<FixedWindowLimiter>,
}

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<CoreServices>,
    pub config: Arc<AppConfig>,
}
