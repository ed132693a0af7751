use crate::error::ConfigError;
use crate::models::{AppConfig, MaintenanceConfig, PanelConfig, RateLimitConfig, ServerConfig};

fn env_first(keys: &[&str]) -> Option<String> {
    for k in keys {
        if let Ok(v) = std::env::var(k) {
            let t = v.trim();
            if !t.is_empty() {
                return Some(t.to_string());
            }
        }
    }
    None
}

fn parse_u64(value: Option<String>, default: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_u32(value: Option<String>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_u16(value: Option<String>, default: u16) -> u16 {
    value
        .and_then(|v| v.trim().parse::<u16>().ok())
        .unwrap_or(default)
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

/// Loads the full application configuration from the process environment.
///
/// The panel base URL and credentials are required; everything else falls
/// back to a default. Returning an error here aborts startup.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    let base_url = env_first(&["PANEL_BASE_URL", "XUI_BASE_URL"])
        .ok_or(ConfigError::MissingVar("PANEL_BASE_URL"))?;
    let username = env_first(&["PANEL_USERNAME", "XUI_USERNAME"])
        .ok_or(ConfigError::MissingVar("PANEL_USERNAME"))?;
    let password = env_first(&["PANEL_PASSWORD", "XUI_PASSWORD"])
        .ok_or(ConfigError::MissingVar("PANEL_PASSWORD"))?;

    let config = AppConfig {
        server: ServerConfig {
            host: env_first(&["HOST"]).unwrap_or_else(|| crate::constants::DEFAULT_HOST.to_string()),
            port: parse_u16(env_first(&["PORT"]), crate::constants::DEFAULT_PORT),
            allowed_origins: env_first(&["ALLOWED_ORIGINS", "FRONTEND_URL"])
                .map(|v| split_origins(&v))
                .unwrap_or_default(),
        },
        panel: PanelConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
            session_timeout_minutes: parse_u64(
                env_first(&["SESSION_TIMEOUT_MINUTES"]),
                crate::constants::DEFAULT_SESSION_TIMEOUT_MINUTES,
            ),
            max_login_attempts: parse_u32(
                env_first(&["MAX_LOGIN_ATTEMPTS"]),
                crate::constants::DEFAULT_MAX_LOGIN_ATTEMPTS,
            ),
            max_retry_attempts: parse_u32(
                env_first(&["MAX_RETRY_ATTEMPTS"]),
                crate::constants::DEFAULT_MAX_RETRY_ATTEMPTS,
            ),
            request_timeout_secs: parse_u64(
                env_first(&["REQUEST_TIMEOUT_SECS"]),
                crate::constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
        },
        rate_limit: RateLimitConfig {
            window_ms: parse_u64(
                env_first(&["RATE_LIMIT_WINDOW_MS"]),
                crate::constants::DEFAULT_RATE_LIMIT_WINDOW_MS,
            ),
            max: parse_u32(
                env_first(&["RATE_LIMIT_MAX"]),
                crate::constants::DEFAULT_RATE_LIMIT_MAX,
            ),
        },
        maintenance: MaintenanceConfig {
            interval_secs: parse_u64(
                env_first(&["MAINTENANCE_INTERVAL_SECS"]),
                crate::constants::DEFAULT_MAINTENANCE_INTERVAL_SECS,
            ),
            ..MaintenanceConfig::default()
        },
    };

    validate_app_config(&config)?;
    Ok(config)
}

pub fn validate_app_config(config: &AppConfig) -> Result<(), ConfigError> {
    let url = url::Url::parse(&config.panel.base_url).map_err(|e| ConfigError::Invalid {
        name: "PANEL_BASE_URL",
        reason: e.to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Invalid {
            name: "PANEL_BASE_URL",
            reason: format!("unsupported scheme {:?}", url.scheme()),
        });
    }
    if config.panel.session_timeout_minutes == 0 {
        return Err(ConfigError::Invalid {
            name: "SESSION_TIMEOUT_MINUTES",
            reason: "must be greater than zero".to_string(),
        });
    }
    if config.panel.max_login_attempts == 0 {
        return Err(ConfigError::Invalid {
            name: "MAX_LOGIN_ATTEMPTS",
            reason: "must be greater than zero".to_string(),
        });
    }
    if config.panel.max_retry_attempts == 0 {
        return Err(ConfigError::Invalid {
            name: "MAX_RETRY_ATTEMPTS",
            reason: "must be greater than zero".to_string(),
        });
    }
    if config.panel.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            name: "REQUEST_TIMEOUT_SECS",
            reason: "must be greater than zero".to_string(),
        });
    }
    if config.rate_limit.window_ms == 0 || config.rate_limit.max == 0 {
        return Err(ConfigError::Invalid {
            name: "RATE_LIMIT",
            reason: "window and budget must both be greater than zero".to_string(),
        });
    }
    if config.maintenance.interval_secs == 0 {
        return Err(ConfigError::Invalid {
            name: "MAINTENANCE_INTERVAL_SECS",
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
