use std::collections::HashSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::UpstreamError;
use crate::proxy::session::SessionManager;
use crate::proxy::telemetry::{ServiceState, UsageSnapshot};
use crate::proxy::upstream::models::{PanelEnvelope, RawClientTraffic, RawServerStatus};
use crate::proxy::upstream::payload::{self, Payload};
use crate::proxy::upstream::transport::{PanelCall, PanelTransport};

/// Authenticated panel reads with transparent session recovery.
///
/// The panel signals a dead session by serving its login page with HTTP 200
/// instead of a JSON body. Every call therefore classifies the response and,
/// on a login page, re-authenticates and retries, up to
/// `max_retry_attempts` re-authentications per call.
pub struct UpstreamClient<T> {
    transport: Arc<T>,
    sessions: Arc<SessionManager<T>>,
    max_retry_attempts: u32,
}

impl<T: PanelTransport> UpstreamClient<T> {
    pub fn new(transport: Arc<T>, sessions: Arc<SessionManager<T>>, max_retry_attempts: u32) -> Self {
        Self {
            transport,
            sessions,
            max_retry_attempts,
        }
    }

    async fn call_with_recovery<V: DeserializeOwned>(
        &self,
        call: PanelCall<'_>,
    ) -> Result<V, UpstreamError> {
        self.sessions.ensure_session().await?;

        let mut reauths: u32 = 0;
        loop {
            let body = self
                .transport
                .fetch(call)
                .await
                .map_err(UpstreamError::Transport)?;

            match payload::classify::<V>(&body) {
                Payload::Json(value) => return Ok(value),
                Payload::LoginPage => {
                    if reauths >= self.max_retry_attempts {
                        return Err(UpstreamError::SessionRecoveryFailed(reauths));
                    }
                    reauths += 1;
                    warn!(
                        "{} returned the login page, re-authenticating ({}/{})",
                        call.name(),
                        reauths,
                        self.max_retry_attempts
                    );
                    self.sessions.force_reauthenticate().await?;
                }
                Payload::Malformed(e) => {
                    return Err(UpstreamError::Malformed(format!(
                        "{} response: {}",
                        call.name(),
                        e
                    )));
                }
            }
        }
    }

    /// Fetches one account's traffic counters.
    pub async fn get_client_traffics(
        &self,
        account_id: &str,
    ) -> Result<UsageSnapshot, UpstreamError> {
        let envelope: PanelEnvelope<RawClientTraffic> = self
            .call_with_recovery(PanelCall::ClientTraffics(account_id))
            .await?;

        if !envelope.success || envelope.obj.is_none() {
            return Err(UpstreamError::NotFound(
                envelope.msg.unwrap_or_else(|| "User not found".to_string()),
            ));
        }
        let raw = envelope.obj.unwrap_or_default();
        debug!("Fetched traffic record for {}", account_id);
        Ok(raw.into_snapshot(account_id))
    }

    /// Reports whether the panel's xray core is running. A reply without a
    /// usable state is `Unavailable`, not an error.
    pub async fn get_server_status(&self) -> Result<ServiceState, UpstreamError> {
        let envelope: PanelEnvelope<RawServerStatus> =
            self.call_with_recovery(PanelCall::ServerStatus).await?;

        if !envelope.success {
            return Ok(ServiceState::Unavailable);
        }
        let state = envelope
            .obj
            .and_then(|status| status.xray)
            .and_then(|xray| xray.state);
        Ok(match state.as_deref() {
            Some("running") => ServiceState::Online,
            Some(_) => ServiceState::Offline,
            None => ServiceState::Unavailable,
        })
    }

    /// Fetches the set of account ids with a live connection right now.
    pub async fn get_online_users(&self) -> Result<HashSet<String>, UpstreamError> {
        let envelope: PanelEnvelope<Vec<String>> =
            self.call_with_recovery(PanelCall::OnlineUsers).await?;
        match (envelope.success, envelope.obj) {
            (true, Some(accounts)) => Ok(accounts.into_iter().collect()),
            _ => Err(UpstreamError::Malformed(
                "onlineUsers reply carried no account list".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::session::SessionConfig;
    use crate::test_utils::ScriptedPanel;
    use std::sync::atomic::Ordering;
    use tokio::time::Duration;

    const LOGIN_PAGE: &str = "<!DOCTYPE html><html><body>login</body></html>";

    fn client(panel: Arc<ScriptedPanel>, max_retries: u32) -> UpstreamClient<ScriptedPanel> {
        let sessions = Arc::new(SessionManager::new(
            panel.clone(),
            SessionConfig {
                timeout: Duration::from_secs(60),
                max_login_attempts: 100,
            },
        ));
        UpstreamClient::new(panel, sessions, max_retries)
    }

    fn traffic_body() -> String {
        r#"{"success": true, "msg": "", "obj": {"email": "alice", "enable": true, "up": 10, "down": 20, "total": 0, "expiryTime": 0}}"#
            .to_string()
    }

    #[tokio::test]
    async fn returns_parsed_traffic_record() {
        let panel = Arc::new(ScriptedPanel::new());
        panel.push_fetch(Ok(traffic_body()));
        let client = client(panel.clone(), 3);

        let snapshot = client.get_client_traffics("alice").await.expect("traffic");
        assert_eq!(snapshot.account_id, "alice");
        assert_eq!(snapshot.upload_bytes, 10);
        assert_eq!(snapshot.download_bytes, 20);
        assert_eq!(panel.logins.load(Ordering::SeqCst), 1);
        assert_eq!(panel.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_login_pages() {
        let panel = Arc::new(ScriptedPanel::new());
        panel.push_fetch(Ok(LOGIN_PAGE.to_string()));
        panel.push_fetch(Ok(LOGIN_PAGE.to_string()));
        panel.push_fetch(Ok(traffic_body()));
        let client = client(panel.clone(), 3);

        let snapshot = client.get_client_traffics("alice").await.expect("traffic");
        assert_eq!(snapshot.account_id, "alice");
        // Initial login plus one forced re-auth per login page.
        assert_eq!(panel.logins.load(Ordering::SeqCst), 3);
        assert_eq!(panel.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_retry_budget() {
        let panel = Arc::new(ScriptedPanel::new());
        for _ in 0..4 {
            panel.push_fetch(Ok(LOGIN_PAGE.to_string()));
        }
        let client = client(panel.clone(), 3);

        let err = client.get_client_traffics("alice").await.unwrap_err();
        assert!(matches!(err, UpstreamError::SessionRecoveryFailed(3)));
        // One fetch up front plus one per re-auth.
        assert_eq!(panel.fetches.load(Ordering::SeqCst), 4);
        assert_eq!(panel.logins.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn transport_errors_are_not_retried() {
        let panel = Arc::new(ScriptedPanel::new());
        panel.push_fetch(Err("connection reset".to_string()));
        let client = client(panel.clone(), 3);

        let err = client.get_client_traffics("alice").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
        assert_eq!(panel.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(panel.logins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_an_error_not_a_retry() {
        let panel = Arc::new(ScriptedPanel::new());
        panel.push_fetch(Ok("{not json".to_string()));
        let client = client(panel.clone(), 3);

        let err = client.get_client_traffics("alice").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Malformed(_)));
        assert_eq!(panel.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_record_maps_to_not_found() {
        let panel = Arc::new(ScriptedPanel::new());
        panel.push_fetch(Ok(
            r#"{"success": false, "msg": "record not found", "obj": null}"#.to_string(),
        ));
        let client = client(panel.clone(), 3);

        let err = client.get_client_traffics("ghost").await.unwrap_err();
        assert_eq!(err, UpstreamError::NotFound("record not found".to_string()));
    }

    #[tokio::test]
    async fn null_obj_with_success_is_still_not_found() {
        let panel = Arc::new(ScriptedPanel::new());
        panel.push_fetch(Ok(r#"{"success": true, "obj": null}"#.to_string()));
        let client = client(panel.clone(), 3);

        let err = client.get_client_traffics("ghost").await.unwrap_err();
        assert_eq!(err, UpstreamError::NotFound("User not found".to_string()));
    }

    #[tokio::test]
    async fn server_status_maps_xray_state() {
        let panel = Arc::new(ScriptedPanel::new());
        panel.push_fetch(Ok(
            r#"{"success": true, "obj": {"xray": {"state": "running"}}}"#.to_string(),
        ));
        panel.push_fetch(Ok(
            r#"{"success": true, "obj": {"xray": {"state": "stopped"}}}"#.to_string(),
        ));
        panel.push_fetch(Ok(r#"{"success": true, "obj": {}}"#.to_string()));
        let client = client(panel.clone(), 3);

        assert_eq!(client.get_server_status().await.unwrap(), ServiceState::Online);
        assert_eq!(client.get_server_status().await.unwrap(), ServiceState::Offline);
        assert_eq!(
            client.get_server_status().await.unwrap(),
            ServiceState::Unavailable
        );
    }

    #[tokio::test]
    async fn online_users_collects_into_a_set() {
        let panel = Arc::new(ScriptedPanel::new());
        panel.push_fetch(Ok(
            r#"{"success": true, "obj": ["alice", "bob", "alice"]}"#.to_string(),
        ));
        let client = client(panel.clone(), 3);

        let online = client.get_online_users().await.expect("online");
        assert_eq!(online.len(), 2);
        assert!(online.contains("alice"));
        assert!(online.contains("bob"));
    }

    #[tokio::test]
    async fn online_users_without_a_list_is_malformed() {
        let panel = Arc::new(ScriptedPanel::new());
        panel.push_fetch(Ok(r#"{"success": false, "obj": null}"#.to_string()));
        let client = client(panel.clone(), 3);

        let err = client.get_online_users().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Malformed(_)));
    }
}
