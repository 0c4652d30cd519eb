//! Sync rate limiter.
//!
//! Reading equipment can trigger a sync, and a busy page would otherwise
//! re-read the whole history sheet on every request. One `SyncThrottle` is
//! built per process by the service entry point and passed by reference to
//! whoever wants to sync.
//!
//! # Invariants
//!
//! - At most one sync is in flight.
//! - Without `force`, a sync starts only once `min_interval` has passed since
//!   the last *successful* run.
//! - `last_run_at` advances only on success; a failed sync is retried on the
//!   next request.
//! - Pure: the caller supplies `now`.

use std::time::{Duration, Instant};

/// Minimum spacing of non-forced syncs.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(8_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Caller must run the sync and then call [`SyncThrottle::finish`].
    Run,
    /// Last successful run is too recent.
    Skip { remaining: Duration },
    /// Another sync is running; wait for it instead of starting one.
    InFlight,
}

#[derive(Clone, Debug)]
pub struct SyncThrottle {
    min_interval: Duration,
    last_run_at: Option<Instant>,
    in_flight: bool,
}

impl Default for SyncThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl SyncThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_run_at: None,
            in_flight: false,
        }
    }

    /// Decide whether a sync may start at `now`. `Run` marks it in flight.
    pub fn try_begin(&mut self, now: Instant, force: bool) -> ThrottleDecision {
        if !force {
            if let Some(last) = self.last_run_at {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.min_interval {
                    return ThrottleDecision::Skip {
                        remaining: self.min_interval - elapsed,
                    };
                }
            }
        }

        if self.in_flight {
            return ThrottleDecision::InFlight;
        }

        self.in_flight = true;
        ThrottleDecision::Run
    }

    /// Close the in-flight run.
    pub fn finish(&mut self, now: Instant, succeeded: bool) {
        self.in_flight = false;
        if succeeded {
            self.last_run_at = Some(now);
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn last_run_at(&self) -> Option<Instant> {
        self.last_run_at
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
