use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::models::PanelConfig;
use crate::proxy::upstream::payload::{self, Payload};
use crate::proxy::upstream::PanelTransport;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub timeout: Duration,
    pub max_login_attempts: u32,
}

impl From<&PanelConfig> for SessionConfig {
    fn from(config: &PanelConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.session_timeout_minutes * 60),
            max_login_attempts: config.max_login_attempts,
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    logged_in: bool,
    last_login_ms: i64,
    login_attempts: u32,
}

/// Read-only diagnostic view of the session, served as-is over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    #[serde(rename = "isLoggedIn")]
    pub is_logged_in: bool,
    #[serde(rename = "lastLoginTime")]
    pub last_login_time: Option<String>,
    #[serde(rename = "sessionActive")]
    pub session_active: bool,
    #[serde(rename = "remainingTime")]
    pub remaining_time_ms: i64,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    msg: Option<String>,
}

/// Owns the login lifecycle against the panel.
///
/// Concurrency contract: any number of concurrent `ensure_session` /
/// `force_reauthenticate` callers converge on at most one login request.
/// The gate mutex serializes attempts; the generation counter tells a waiter
/// that a login completed while it was queued, so it adopts that outcome
/// (success via the freshness check, failure via the recorded error) instead
/// of issuing its own request.
pub struct SessionManager<T> {
    transport: Arc<T>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    login_gate: tokio::sync::Mutex<()>,
    generation: AtomicU64,
    last_failure: Mutex<Option<AuthError>>,
}

impl<T: PanelTransport> SessionManager<T> {
    pub fn new(transport: Arc<T>, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            state: Mutex::new(SessionState::default()),
            login_gate: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
            last_failure: Mutex::new(None),
        }
    }

    /// Returns immediately when the session is fresh, otherwise logs in.
    pub async fn ensure_session(&self) -> Result<(), AuthError> {
        self.login(false).await
    }

    /// Logs in regardless of the freshness clock. Used when an upstream call
    /// reveals the session was revoked server-side despite looking fresh.
    pub async fn force_reauthenticate(&self) -> Result<(), AuthError> {
        self.login(true).await
    }

    pub async fn login(&self, force: bool) -> Result<(), AuthError> {
        if !force && self.is_fresh() {
            return Ok(());
        }

        let observed = self.generation.load(Ordering::Acquire);
        let _gate = self.login_gate.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            // A login resolved while we were queued behind the gate; share
            // its outcome rather than stacking another attempt.
            if self.is_fresh() {
                return Ok(());
            }
            if let Ok(failure) = self.last_failure.lock() {
                if let Some(err) = failure.clone() {
                    return Err(err);
                }
            }
        } else if !force && self.is_fresh() {
            return Ok(());
        }

        self.attempt_login().await
    }

    /// Performs one login attempt. Caller must hold the gate.
    async fn attempt_login(&self) -> Result<(), AuthError> {
        {
            let attempts = self.state.lock().map(|s| s.login_attempts).unwrap_or(0);
            if attempts >= self.config.max_login_attempts {
                return Err(AuthError::AttemptsExhausted(attempts));
            }
        }

        let result = self.perform_login().await;
        match &result {
            Ok(()) => {
                if let Ok(mut state) = self.state.lock() {
                    state.logged_in = true;
                    state.last_login_ms = Utc::now().timestamp_millis();
                    state.login_attempts = 0;
                }
                if let Ok(mut failure) = self.last_failure.lock() {
                    *failure = None;
                }
                info!("Panel login succeeded");
            }
            Err(e) => {
                let attempts = if let Ok(mut state) = self.state.lock() {
                    state.logged_in = false;
                    state.login_attempts += 1;
                    state.login_attempts
                } else {
                    0
                };
                if let Ok(mut failure) = self.last_failure.lock() {
                    *failure = Some(e.clone());
                }
                warn!(
                    "Panel login failed (attempt {}/{}): {}",
                    attempts, self.config.max_login_attempts, e
                );
            }
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
        result
    }

    async fn perform_login(&self) -> Result<(), AuthError> {
        let body = self
            .transport
            .login()
            .await
            .map_err(AuthError::Transport)?;

        match payload::classify::<LoginResponse>(&body) {
            Payload::Json(response) if response.success => Ok(()),
            Payload::Json(response) => Err(AuthError::Rejected(
                response.msg.unwrap_or_else(|| "login rejected".to_string()),
            )),
            Payload::LoginPage => Err(AuthError::Rejected(
                "login endpoint returned the panel login page".to_string(),
            )),
            Payload::Malformed(e) => {
                Err(AuthError::Rejected(format!("unexpected login response: {}", e)))
            }
        }
    }

    fn is_fresh(&self) -> bool {
        match self.state.lock() {
            Ok(state) => {
                state.logged_in
                    && Utc::now().timestamp_millis() - state.last_login_ms
                        < self.config.timeout.as_millis() as i64
            }
            Err(_) => false,
        }
    }

    /// Pure read, no auth side effects.
    pub fn session_status(&self) -> SessionStatus {
        let (logged_in, last_login_ms) = match self.state.lock() {
            Ok(state) => (state.logged_in, state.last_login_ms),
            Err(_) => (false, 0),
        };
        let now = Utc::now().timestamp_millis();
        let timeout_ms = self.config.timeout.as_millis() as i64;
        let session_active = logged_in && now - last_login_ms < timeout_ms;

        SessionStatus {
            is_logged_in: logged_in,
            last_login_time: (last_login_ms > 0)
                .then(|| chrono::DateTime::from_timestamp_millis(last_login_ms))
                .flatten()
                .map(|dt| dt.to_rfc3339()),
            session_active,
            remaining_time_ms: if session_active {
                timeout_ms - (now - last_login_ms)
            } else {
                0
            },
        }
    }

    /// Clears the fail-fast state after the attempts budget was exhausted.
    pub fn reset_login_attempts(&self) {
        if let Ok(mut state) = self.state.lock() {
            if state.login_attempts > 0 {
                info!(
                    "Login attempt counter reset (was {})",
                    state.login_attempts
                );
            }
            state.login_attempts = 0;
        }
        if let Ok(mut failure) = self.last_failure.lock() {
            *failure = None;
        }
        debug!("Session manager attempts cleared");
    }
}
