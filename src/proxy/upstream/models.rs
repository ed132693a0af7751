use serde::Deserialize;

use crate::proxy::telemetry::UsageSnapshot;

/// Standard panel response wrapper: `{success, msg, obj}`.
#[derive(Debug, Deserialize)]
pub struct PanelEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub obj: Option<T>,
}

/// Raw per-client traffic record as the panel reports it. Every field is
/// optional so a partially filled record degrades to an `Unknown`
/// classification instead of a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct RawClientTraffic {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub enable: Option<bool>,
    #[serde(default)]
    pub up: Option<i64>,
    #[serde(default)]
    pub down: Option<i64>,
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default, rename = "expiryTime")]
    pub expiry_time: Option<i64>,
}

impl RawClientTraffic {
    /// The panel has been observed emitting negative counters after resets;
    /// clamp them instead of wrapping.
    pub fn into_snapshot(self, requested_account_id: &str) -> UsageSnapshot {
        UsageSnapshot {
            account_id: self
                .email
                .unwrap_or_else(|| requested_account_id.to_string()),
            upload_bytes: self.up.unwrap_or(0).max(0) as u64,
            download_bytes: self.down.unwrap_or(0).max(0) as u64,
            quota_bytes: self.total.unwrap_or(0).max(0) as u64,
            enabled: self.enable,
            expiry_epoch_ms: self.expiry_time.unwrap_or(0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawServerStatus {
    #[serde(default)]
    pub xray: Option<RawXrayStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawXrayStatus {
    #[serde(default)]
    pub state: Option<String>,
}
