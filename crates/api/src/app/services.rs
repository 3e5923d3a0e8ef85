use std::sync::{Arc, Weak};
use std::time::Duration;

use bizops_auth::{AccountDirectory, InMemoryAccountDirectory};
use bizops_reporting::{InMemoryRecordStore, RecordStore};

use crate::config::ApiConfig;
use crate::rate_limit::{Clock, RateLimiter, SystemClock};
use crate::report_service::ReportService;

const SWEEP_EVERY: Duration = Duration::from_secs(60);

/// The external collaborators the API reads from.
#[derive(Clone)]
pub struct Backends {
    pub records: Arc<dyn RecordStore>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub clock: Arc<dyn Clock>,
}

impl Backends {
    pub fn new(records: Arc<dyn RecordStore>, accounts: Arc<dyn AccountDirectory>) -> Self {
        Self {
            records,
            accounts,
            clock: Arc::new(SystemClock),
        }
    }

    /// Empty process-local stores on the system clock.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryAccountDirectory::new()),
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Everything the investor handlers need, shared across requests.
pub struct AppServices {
    pub reports: ReportService,
    pub limiter: Arc<RateLimiter>,
    pub development: bool,
}

pub fn build_services(config: &ApiConfig, backends: Backends) -> AppServices {
    let limiter = Arc::new(RateLimiter::in_memory(config.rate_limit));
    let reports = ReportService::new(
        Arc::clone(&limiter),
        backends.accounts,
        backends.records,
        backends.clock,
    );

    AppServices {
        reports,
        limiter,
        development: config.environment.is_development(),
    }
}

/// Periodically evict elapsed rate-limit windows.
///
/// Holds only a weak reference, so the task ends once the limiter is dropped.
pub fn spawn_window_sweeper(limiter: &Arc<RateLimiter>, clock: Arc<dyn Clock>) -> tokio::task::JoinHandle<()> {
    let limiter: Weak<RateLimiter> = Arc::downgrade(limiter);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_EVERY);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(limiter) = limiter.upgrade() else {
                tracing::debug!("rate limiter dropped; window sweeper exiting");
                break;
            };
            limiter.sweep(clock.now());
        }
    })
}
