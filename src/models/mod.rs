mod config;

pub use config::{AppConfig, MaintenanceConfig, PanelConfig, RateLimitConfig, ServerConfig};
