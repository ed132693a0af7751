use std::sync::Arc;

use rand::Rng;
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::models::MaintenanceConfig;
use crate::proxy::middleware::rate_limit::FixedWindowLimiter;
use crate::proxy::session::SessionManager;
use crate::proxy::upstream::PanelHttp;

fn jitter_bounds(config: &MaintenanceConfig) -> (u64, u64) {
    let (min, max) = (config.jitter_min_secs, config.jitter_max_secs);
    if min <= max {
        (min, max)
    } else {
        (max, min)
    }
}

fn pick_jitter_secs(bounds: (u64, u64)) -> u64 {
    if bounds.1 == 0 {
        0
    } else {
        rand::thread_rng().gen_range(bounds.0..=bounds.1)
    }
}

/// Starts the session maintenance loop.
///
/// Each tick refreshes the panel session with a non-forced login (a no-op
/// while the session is still fresh) and sweeps expired rate-limit buckets.
/// The first tick fires immediately, warming the session at startup so the
/// first user-facing request does not pay for a login round-trip. The task
/// stops as soon as the cancellation token fires.
pub fn start_maintenance(
    sessions: Arc<SessionManager<PanelHttp>>,
    limiter: Arc<FixedWindowLimiter>,
    config: MaintenanceConfig,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let bounds = jitter_bounds(&config);
    tokio::spawn(async move {
        info!(
            "Session maintenance started (interval: {}s)",
            config.interval_secs
        );
        let mut interval = time::interval(Duration::from_secs(config.interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut first_run = true;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Session maintenance received cancel signal");
                    break;
                }
                _ = interval.tick() => {}
            }

            // Spread maintenance logins out so restarts of several instances
            // do not hit the panel at the same moment.
            let jitter = if first_run { 0 } else { pick_jitter_secs(bounds) };
            first_run = false;
            if jitter > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Session maintenance received cancel signal");
                        break;
                    }
                    _ = time::sleep(Duration::from_secs(jitter)) => {}
                }
            }

            let swept = limiter.sweep_expired();
            if swept > 0 {
                debug!("Maintenance sweep removed {} expired rate-limit bucket(s)", swept);
            }

            match sessions.login(false).await {
                Ok(()) => debug!("Maintenance login check completed"),
                Err(AuthError::AttemptsExhausted(attempts)) => warn!(
                    "Maintenance skipped: login attempts exhausted ({}); manual reset required",
                    attempts
                ),
                Err(e) => warn!("Maintenance login failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_bounds_are_ordered() {
        let mut config = MaintenanceConfig::default();
        config.jitter_min_secs = 20;
        config.jitter_max_secs = 5;
        assert_eq!(jitter_bounds(&config), (5, 20));
    }

    #[test]
    fn zero_jitter_ceiling_disables_jitter() {
        assert_eq!(pick_jitter_secs((0, 0)), 0);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        for _ in 0..100 {
            let v = pick_jitter_secs((2, 6));
            assert!((2..=6).contains(&v));
        }
    }
}
