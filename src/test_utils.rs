//! Shared scripted transport for exercising session and retry behaviour
//! without a network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::time::Duration;

use crate::proxy::upstream::{PanelCall, PanelTransport};

const LOGIN_OK: &str = r#"{"success": true, "msg": ""}"#;

/// Transport that replays queued responses and counts calls. An empty login
/// queue yields a successful login; an empty fetch queue is a scripting
/// mistake and fails loudly.
pub struct ScriptedPanel {
    pub logins: AtomicUsize,
    pub fetches: AtomicUsize,
    login_bodies: Mutex<VecDeque<Result<String, String>>>,
    fetch_bodies: Mutex<VecDeque<Result<String, String>>>,
    login_delay: Duration,
}

impl ScriptedPanel {
    pub fn new() -> Self {
        Self::with_login_delay(Duration::ZERO)
    }

    pub fn with_login_delay(login_delay: Duration) -> Self {
        Self {
            logins: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            login_bodies: Mutex::new(VecDeque::new()),
            fetch_bodies: Mutex::new(VecDeque::new()),
            login_delay,
        }
    }

    pub fn push_login(&self, body: Result<String, String>) {
        self.login_bodies
            .lock()
            .expect("login queue lock")
            .push_back(body);
    }

    pub fn push_fetch(&self, body: Result<String, String>) {
        self.fetch_bodies
            .lock()
            .expect("fetch queue lock")
            .push_back(body);
    }
}

impl PanelTransport for ScriptedPanel {
    async fn login(&self) -> Result<String, String> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }
        self.login_bodies
            .lock()
            .expect("login queue lock")
            .pop_front()
            .unwrap_or_else(|| Ok(LOGIN_OK.to_string()))
    }

    async fn fetch(&self, _call: PanelCall<'_>) -> Result<String, String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetch_bodies
            .lock()
            .expect("fetch queue lock")
            .pop_front()
            .expect("no scripted fetch response left")
    }
}
