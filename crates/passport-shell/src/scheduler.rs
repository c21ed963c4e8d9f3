//! Periodic credential renewal with jitter and bounded retry.
//!
//! The scheduler is a pure state machine over injected time: `tick(now)`
//! is driven by a single periodic loop (see [`crate::SchedulerDriver`])
//! and must never be re-entered while a refresh attempt is in flight;
//! `&mut self` makes that structural here.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{debug, warn};

/// Base interval between successful renewals.
pub fn refresh_interval() -> Duration {
    Duration::hours(3)
}

/// Uniform-random jitter added on top of the interval, spreading renewal
/// load across clients that logged in at the same moment.
pub fn jitter_max() -> Duration {
    Duration::minutes(10)
}

/// Short fixed delay between failed attempts.
pub fn retry_interval() -> Duration {
    Duration::minutes(5)
}

/// Consecutive failures tolerated before giving up.
pub const MAX_RETRY: u32 = 2;

/// Scheduler bookkeeping. `next_scheduled_at == None` after `MAX_RETRY`
/// is exceeded; the caller must notice and prompt a re-login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshState {
    pub last_success_at: DateTime<Utc>,
    pub retry_count: u32,
    pub next_scheduled_at: Option<DateTime<Utc>>,
}

type RefreshCallback = Box<dyn FnMut() -> bool + Send>;
type JitterSource = Box<dyn FnMut() -> Duration + Send>;

pub struct RefreshScheduler {
    on_refresh: RefreshCallback,
    jitter: JitterSource,
    state: Option<RefreshState>,
}

impl RefreshScheduler {
    /// `on_refresh` performs one renewal attempt and reports success.
    pub fn new(on_refresh: RefreshCallback) -> Self {
        Self::with_jitter(on_refresh, Box::new(random_jitter))
    }

    /// Injectable jitter for deterministic tests.
    pub fn with_jitter(on_refresh: RefreshCallback, jitter: JitterSource) -> Self {
        Self {
            on_refresh,
            jitter,
            state: None,
        }
    }

    /// Begin scheduling; first renewal lands at
    /// `login_time + interval + jitter`.
    pub fn start(&mut self, login_time: DateTime<Utc>) {
        self.state = Some(RefreshState {
            last_success_at: login_time,
            retry_count: 0,
            next_scheduled_at: None,
        });
        self.schedule_next(true, login_time);
        debug!(next = ?self.next_scheduled_at(), "refresh scheduler started");
    }

    /// Cancel any pending renewal. Logout and ban run through here so a
    /// stale refresh cannot fire after local state was wiped.
    pub fn stop(&mut self) {
        if self.state.take().is_some() {
            debug!("refresh scheduler stopped");
        }
    }

    /// Run one poll: no-op unless a renewal is due at `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        let Some(state) = &self.state else {
            return;
        };
        match state.next_scheduled_at {
            Some(due) if now >= due => {}
            _ => return,
        }

        let success = (self.on_refresh)();
        self.schedule_next(success, now);
    }

    pub fn state(&self) -> Option<&RefreshState> {
        self.state.as_ref()
    }

    pub fn next_scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.state.as_ref().and_then(|s| s.next_scheduled_at)
    }

    pub fn retry_count(&self) -> u32 {
        self.state.as_ref().map(|s| s.retry_count).unwrap_or(0)
    }

    fn schedule_next(&mut self, success: bool, base_time: DateTime<Utc>) {
        let jitter = &mut self.jitter;
        let Some(state) = &mut self.state else {
            return;
        };
        if success {
            state.last_success_at = base_time;
            state.retry_count = 0;
            state.next_scheduled_at = Some(base_time + refresh_interval() + jitter());
        } else if state.retry_count >= MAX_RETRY {
            // Out of retries: stop scheduling, surface through state.
            warn!(retries = state.retry_count, "refresh retries exhausted");
            state.next_scheduled_at = None;
        } else {
            state.retry_count += 1;
            state.next_scheduled_at = Some(base_time + retry_interval());
            debug!(retry = state.retry_count, "refresh failed, retrying later");
        }
    }
}

fn random_jitter() -> Duration {
    let max_seconds = jitter_max().num_seconds();
    Duration::seconds(rand::thread_rng().gen_range(0..=max_seconds))
}
