use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::store::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    pub limit: u64,
    pub window: Duration,
    pub max_tracked_keys: usize,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            limit: 60,
            window: Duration::from_secs(60),
            max_tracked_keys: 16_384,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdmissionKey {
    pub client: String,
    pub route: String,
}

impl AdmissionKey {
    pub fn new(client: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            route: route.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rate limit of {limit} requests per {}s exceeded", .window.as_secs())]
pub struct RateLimited {
    pub limit: u64,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    started_at: Instant,
    count: u64,
}

/// Fixed-window request counter per (client, route).
///
/// A window resets once its age reaches `window`, not continuously, so up to
/// twice the limit can pass across a window boundary. Denied requests still
/// count toward the exhausted window.
pub struct AdmissionController {
    policy: AdmissionPolicy,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<AdmissionKey, RateWindow>>,
}

impl AdmissionController {
    pub fn new(policy: AdmissionPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    pub fn allow(&self, client: &str, route: &str) -> bool {
        self.admit(AdmissionKey::new(client, route)).is_ok()
    }

    pub fn admit(&self, key: AdmissionKey) -> Result<(), RateLimited> {
        let now = self.clock.now();
        let mut windows = self.lock();

        if let Some(window) = windows.get_mut(&key) {
            if now.duration_since(window.started_at) < self.policy.window {
                window.count = window.count.saturating_add(1);
                if window.count > self.policy.limit {
                    tracing::debug!(
                        target: "admission",
                        client = %key.client,
                        route = %key.route,
                        count = window.count,
                        limit = self.policy.limit,
                        "request_denied"
                    );
                    return Err(RateLimited {
                        limit: self.policy.limit,
                        window: self.policy.window,
                    });
                }
                return Ok(());
            }
        } else if windows.len() >= self.policy.max_tracked_keys {
            self.sweep_locked(&mut windows, now);
        }

        windows.insert(
            key,
            RateWindow {
                started_at: now,
                count: 1,
            },
        );
        Ok(())
    }

    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    fn sweep_locked(&self, windows: &mut HashMap<AdmissionKey, RateWindow>, now: Instant) {
        let before = windows.len();
        windows.retain(|_, window| now.duration_since(window.started_at) < self.policy.window);
        tracing::debug!(
            target: "admission",
            swept = before - windows.len(),
            remaining = windows.len(),
            "stale_windows_swept"
        );
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AdmissionKey, RateWindow>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
