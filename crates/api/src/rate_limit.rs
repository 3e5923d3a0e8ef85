//! Per-client request quota over fixed time windows.
//!
//! A client's first request opens a window of `policy.window`; up to
//! `policy.max_requests` requests are admitted inside it and the rest are
//! denied until the window has fully elapsed. The quota is keyed by client
//! only, so every reporting route draws from the same budget.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Source of "now" for everything time-windowed.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C> Clock for Arc<C>
where
    C: Clock + ?Sized,
{
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::minutes(15),
        }
    }
}

/// Counter state of one client's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub started_at: DateTime<Utc>,
    pub admitted: u32,
}

/// An admitted request and the quota left after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Quota exhausted for the current window.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Too many requests, please try again later")]
pub struct RateLimitError {
    pub limit: u32,
    pub reset_at: DateTime<Utc>,
    pub retry_after: Duration,
}

pub type Decision = Result<Admission, RateLimitError>;

/// Storage for per-client windows.
///
/// `with_window` must run `decide` while holding exclusive access to that
/// client's slot, so two concurrent requests can never both observe the same
/// count.
pub trait WindowStore: Send + Sync {
    fn with_window(
        &self,
        client_id: &str,
        decide: &mut dyn FnMut(&mut Option<WindowState>) -> Decision,
    ) -> Decision;

    /// Drop every window that started before `cutoff`. Returns how many were dropped.
    fn evict_started_before(&self, cutoff: DateTime<Utc>) -> usize;

    fn len(&self) -> usize;
}

/// Process-local window store.
#[derive(Debug, Default)]
pub struct InMemoryWindowStore {
    windows: Mutex<HashMap<String, WindowState>>,
}

impl InMemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, WindowState>> {
        // Counters stay meaningful even if a holder panicked mid-update.
        self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WindowStore for InMemoryWindowStore {
    fn with_window(
        &self,
        client_id: &str,
        decide: &mut dyn FnMut(&mut Option<WindowState>) -> Decision,
    ) -> Decision {
        let mut windows = self.lock();
        let mut slot = windows.get(client_id).copied();
        let decision = decide(&mut slot);
        match slot {
            Some(state) => {
                windows.insert(client_id.to_string(), state);
            }
            None => {
                windows.remove(client_id);
            }
        }
        decision
    }

    fn evict_started_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, w| w.started_at >= cutoff);
        before - windows.len()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

pub struct RateLimiter {
    policy: RateLimitPolicy,
    store: Arc<dyn WindowStore>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy, store: Arc<dyn WindowStore>) -> Self {
        Self { policy, store }
    }

    pub fn in_memory(policy: RateLimitPolicy) -> Self {
        Self::new(policy, Arc::new(InMemoryWindowStore::new()))
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Count one request for `client_id` at `now`, or refuse it.
    ///
    /// A refused request leaves the window untouched.
    pub fn admit(&self, client_id: &str, now: DateTime<Utc>) -> Decision {
        let RateLimitPolicy { max_requests, window } = self.policy;

        let decision = self.store.with_window(client_id, &mut |slot: &mut Option<WindowState>| {
            if slot.as_ref().is_some_and(|w| now >= w.started_at + window) {
                *slot = None;
            }
            let state = slot.get_or_insert(WindowState {
                started_at: now,
                admitted: 0,
            });
            let reset_at = state.started_at + window;

            if state.admitted >= max_requests {
                return Err(RateLimitError {
                    limit: max_requests,
                    reset_at,
                    retry_after: reset_at - now,
                });
            }

            state.admitted += 1;
            Ok(Admission {
                limit: max_requests,
                remaining: max_requests - state.admitted,
                reset_at,
            })
        });

        if let Err(denied) = &decision {
            tracing::warn!(
                client_id,
                reset_at = %denied.reset_at,
                "rate limit exceeded"
            );
        }
        decision
    }

    /// Forget windows that have fully elapsed at `now`.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let evicted = self.store.evict_started_before(now - self.policy.window);
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.store.len(), "expired rate-limit windows evicted");
        }
        evicted
    }

    pub fn tracked_clients(&self) -> usize {
        self.store.len()
    }
}
