use std::future::Future;

use tokio::time::Duration;
use tracing::debug;

use crate::constants;
use crate::models::PanelConfig;

/// One of the three authenticated panel reads.
#[derive(Debug, Clone, Copy)]
pub enum PanelCall<'a> {
    ClientTraffics(&'a str),
    ServerStatus,
    OnlineUsers,
}

impl PanelCall<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            PanelCall::ClientTraffics(_) => "getClientTraffics",
            PanelCall::ServerStatus => "serverStatus",
            PanelCall::OnlineUsers => "onlineUsers",
        }
    }
}

/// Raw wire access to the panel. Implementations carry the cookie state for
/// the whole login lifetime; callers never see cookies directly.
///
/// Errors are transport-level only (connect failure, timeout, unreadable
/// body). Payload interpretation, including login-page detection, belongs to
/// the caller.
pub trait PanelTransport: Send + Sync {
    fn login(&self) -> impl Future<Output = Result<String, String>> + Send;
    fn fetch(&self, call: PanelCall<'_>) -> impl Future<Output = Result<String, String>> + Send;
}

/// reqwest-backed transport. The cookie store is owned by the underlying
/// client and shared across login and fetch calls, which is what keeps the
/// panel session alive between requests.
pub struct PanelHttp {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl PanelHttp {
    pub fn new(config: &PanelConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(constants::USER_AGENT)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl PanelTransport for PanelHttp {
    async fn login(&self) -> Result<String, String> {
        let params = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];
        debug!("Issuing panel login request");
        let response = self
            .client
            .post(self.url(constants::LOGIN_PATH))
            .form(&params)
            .send()
            .await
            .map_err(|e| format!("login request failed: {}", e))?;

        response
            .text()
            .await
            .map_err(|e| format!("failed to read login response: {}", e))
    }

    async fn fetch(&self, call: PanelCall<'_>) -> Result<String, String> {
        let request = match call {
            PanelCall::ClientTraffics(account_id) => self.client.get(format!(
                "{}/{}",
                self.url(constants::CLIENT_TRAFFICS_PATH),
                account_id
            )),
            PanelCall::ServerStatus => self.client.post(self.url(constants::SERVER_STATUS_PATH)),
            PanelCall::OnlineUsers => self.client.post(self.url(constants::ONLINE_USERS_PATH)),
        };

        let response = request
            .send()
            .await
            .map_err(|e| format!("{} request failed: {}", call.name(), e))?;

        response
            .text()
            .await
            .map_err(|e| format!("failed to read {} response: {}", call.name(), e))
    }
}
