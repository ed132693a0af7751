use crate::constants;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub panel: PanelConfig,
    pub rate_limit: RateLimitConfig,
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS origin allowlist. Empty means permissive (any origin).
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub session_timeout_minutes: u64,
    pub max_login_attempts: u32,
    pub max_retry_attempts: u32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max: u32,
}

#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    pub interval_secs: u64,
    pub jitter_min_secs: u64,
    pub jitter_max_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            port: constants::DEFAULT_PORT,
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            session_timeout_minutes: constants::DEFAULT_SESSION_TIMEOUT_MINUTES,
            max_login_attempts: constants::DEFAULT_MAX_LOGIN_ATTEMPTS,
            max_retry_attempts: constants::DEFAULT_MAX_RETRY_ATTEMPTS,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: constants::DEFAULT_RATE_LIMIT_WINDOW_MS,
            max: constants::DEFAULT_RATE_LIMIT_MAX,
        }
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval_secs: constants::DEFAULT_MAINTENANCE_INTERVAL_SECS,
            jitter_min_secs: 0,
            jitter_max_secs: 15,
        }
    }
}
