//! Converts raw panel byte counters into the public usage schema and
//! classifies account status.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::constants::BYTES_PER_GB;

/// One point-in-time read of an account's counters, as produced by the
/// upstream client.
#[derive(Debug, Clone)]
pub struct UsageSnapshot {
    pub account_id: String,
    pub upload_bytes: u64,
    pub download_bytes: u64,
    /// 0 means unlimited.
    pub quota_bytes: u64,
    /// `None` when the panel omitted the flag; classification degrades to
    /// `Unknown` in that case.
    pub enabled: Option<bool>,
    /// 0 means the account never expires.
    pub expiry_epoch_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccountStatus {
    Active,
    Expired,
    QuotaExceeded,
    Disabled,
    Unknown,
}

/// Availability of a best-effort auxiliary fact (server health, presence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceState {
    Online,
    Offline,
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct NormalizedUsage {
    pub account_id: String,
    pub status: AccountStatus,
    pub upload_gb: String,
    pub download_gb: String,
    pub total_used_gb: String,
    /// `None` is the unlimited sentinel, rendered as JSON null.
    pub total_available_gb: Option<String>,
    pub expiry_display: Option<String>,
    pub expiry_remaining: Option<String>,
}

fn gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn format_gb(value: f64) -> String {
    format!("{:.2}", value)
}

fn format_expiry_date(expiry_ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(expiry_ms)
        .map(|dt| dt.format("%b %-d, %Y, %-I:%M %p").to_string())
}

fn format_remaining(diff_ms: i64) -> String {
    let days = diff_ms / 86_400_000;
    let hours = diff_ms / 3_600_000;
    let mins = diff_ms / 60_000;

    if days >= 1 {
        format!("{} day{}", days, if days > 1 { "s" } else { "" })
    } else if hours >= 1 {
        format!("{} hour{}", hours, if hours > 1 { "s" } else { "" })
    } else if mins >= 1 {
        format!("{} minute{}", mins, if mins > 1 { "s" } else { "" })
    } else {
        "Less than a minute".to_string()
    }
}

fn classify(
    enabled: Option<bool>,
    expired: bool,
    used_gb: f64,
    available_gb: Option<f64>,
) -> AccountStatus {
    match enabled {
        Some(true) => AccountStatus::Active,
        Some(false) => {
            if expired {
                AccountStatus::Expired
            } else if matches!(available_gb, Some(total) if round2(used_gb) >= round2(total)) {
                AccountStatus::QuotaExceeded
            } else {
                AccountStatus::Disabled
            }
        }
        None => AccountStatus::Unknown,
    }
}

/// Normalizes one snapshot at the given instant (epoch milliseconds).
pub fn normalize(snapshot: &UsageSnapshot, now_ms: i64) -> NormalizedUsage {
    let upload_gb = gb(snapshot.upload_bytes);
    let download_gb = gb(snapshot.download_bytes);
    let total_used_gb = upload_gb + download_gb;
    let available_gb = (snapshot.quota_bytes != 0).then(|| gb(snapshot.quota_bytes));

    let (expiry_display, expiry_remaining, expired) = if snapshot.expiry_epoch_ms == 0 {
        (None, None, false)
    } else if snapshot.expiry_epoch_ms < now_ms {
        (
            format_expiry_date(snapshot.expiry_epoch_ms),
            Some("Expired".to_string()),
            true,
        )
    } else {
        (
            format_expiry_date(snapshot.expiry_epoch_ms),
            Some(format_remaining(snapshot.expiry_epoch_ms - now_ms)),
            false,
        )
    };

    NormalizedUsage {
        account_id: snapshot.account_id.clone(),
        status: classify(snapshot.enabled, expired, total_used_gb, available_gb),
        upload_gb: format_gb(upload_gb),
        download_gb: format_gb(download_gb),
        total_used_gb: format_gb(total_used_gb),
        total_available_gb: available_gb.map(format_gb),
        expiry_display,
        expiry_remaining,
    }
}

/// Assembles the public response body, merging the best-effort auxiliary
/// facts with the normalized usage record.
pub fn usage_response(
    usage: &NormalizedUsage,
    server_status: ServiceState,
    online: ServiceState,
) -> Value {
    json!({
        "success": true,
        "user": {
            "name": usage.account_id,
            "status": usage.status,
            "isOnline": online,
            "quota": {
                "upload": usage.upload_gb,
                "download": usage.download_gb,
                "totalUsed": usage.total_used_gb,
                "total": usage.total_available_gb,
            },
            "expiry": {
                "date": usage.expiry_display,
                "remaining": usage.expiry_remaining,
            },
        },
        "serverStatus": server_status,
    })
}
