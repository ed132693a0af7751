/// Divisor for byte -> gigabyte conversion, matching what the panel UI reports.
pub const BYTES_PER_GB: f64 = 1_073_741_824.0;

pub const USER_AGENT: &str = concat!("panelgate/", env!("CARGO_PKG_VERSION"));

// Panel endpoint paths, relative to the configured base URL.
pub const LOGIN_PATH: &str = "/login";
pub const CLIENT_TRAFFICS_PATH: &str = "/panel/api/inbounds/getClientTraffics";
pub const SERVER_STATUS_PATH: &str = "/server/status";
pub const ONLINE_USERS_PATH: &str = "/panel/api/inbounds/onlines";

// Defaults applied when the corresponding environment variable is unset.
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u64 = 30;
pub const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 5;
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 50;
pub const DEFAULT_MAINTENANCE_INTERVAL_SECS: u64 = 600;
