//! Fixed-window per-client rate limiting for the public API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dashmap::DashMap;
use serde_json::json;
use tokio::time::{Duration, Instant};
use tracing::warn;

use crate::models::RateLimitConfig;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u64,
    window_start: Instant,
}

/// Verdict for one request against the caller's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Limited { retry_after_secs: u64 },
}

/// Per-key fixed-window counter. Windows start on the first request with a
/// given key and reset wholesale when they elapse, so a burst right at a
/// window edge can briefly see up to twice the limit. That trade keeps the
/// hot path to one sharded map operation.
pub struct FixedWindowLimiter {
    buckets: DashMap<String, Bucket>,
    max_requests: u64,
    window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            max_requests: config.max as u64,
            window: Duration::from_millis(config.window_ms),
        }
    }

    pub fn check(&self, key: &str) -> Verdict {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Verdict {
        let mut entry = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket {
                count: 0,
                window_start: now,
            });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        if entry.count > self.max_requests {
            let elapsed = now.duration_since(entry.window_start);
            let remaining = self.window.saturating_sub(elapsed);
            Verdict::Limited {
                retry_after_secs: remaining.as_secs_f64().ceil().max(1.0) as u64,
            }
        } else {
            Verdict::Allowed
        }
    }

    /// Drops buckets whose window has fully elapsed and returns how many
    /// were removed. Run periodically so the map does not grow with one
    /// entry per client ever seen.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.window_start) < self.window);
        before - self.buckets.len()
    }
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    match limiter.check(&key) {
        Verdict::Allowed => next.run(request).await,
        Verdict::Limited { retry_after_secs } => {
            warn!("Rate limit exceeded for {}", key);
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                Json(json!({
                    "error": "rate_limit",
                    "message": "Too many requests, please try again later.",
                    "retryAfter": retry_after_secs,
                })),
            )
                .into_response()
        }
    }
}
