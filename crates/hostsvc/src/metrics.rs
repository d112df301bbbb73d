//! Host service call counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::method::HostAction;

/// Per-client call counters
///
/// Thread-safe counters using atomic operations; cloned out by operators
/// and asserted on by tests.
///
/// # Example
///
/// ```rust
/// use rotor_hostsvc::{HostAction, HostServiceMetrics};
/// use std::time::Duration;
///
/// let metrics = HostServiceMetrics::default();
/// metrics.record_call(HostAction::Set, Duration::from_millis(12), true);
/// metrics.record_call(HostAction::CreateCheckpoint, Duration::from_millis(3), false);
///
/// assert_eq!(metrics.call_count(), 2);
/// assert_eq!(metrics.set_count(), 1);
/// assert_eq!(metrics.failure_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct HostServiceMetrics {
    /// Total calls issued
    call_count: AtomicU64,

    /// Sum of call latencies (milliseconds)
    latency_sum_ms: AtomicU64,

    /// Checkpoint create/delete/restore calls
    checkpoint_count: AtomicU64,

    /// Set and push_config calls
    set_count: AtomicU64,

    /// Calls that returned an error, timeouts included
    failure_count: AtomicU64,

    /// Calls abandoned at the timeout
    timeout_count: AtomicU64,
}

impl HostServiceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed (or failed) call
    pub fn record_call(&self, action: HostAction, duration: Duration, success: bool) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);

        match action {
            HostAction::CreateCheckpoint
            | HostAction::DeleteCheckpoint
            | HostAction::RestoreCheckpoint => {
                self.checkpoint_count.fetch_add(1, Ordering::Relaxed);
            }
            HostAction::Set | HostAction::PushConfig => {
                self.set_count.fetch_add(1, Ordering::Relaxed);
            }
        }

        if !success {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a call abandoned at its deadline
    pub fn record_timeout(&self, action: HostAction, after: Duration) {
        self.record_call(action, after, false);
        self.timeout_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn checkpoint_count(&self) -> u64 {
        self.checkpoint_count.load(Ordering::Relaxed)
    }

    pub fn set_count(&self) -> u64 {
        self.set_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn timeout_count(&self) -> u64 {
        self.timeout_count.load(Ordering::Relaxed)
    }

    /// Mean latency over all calls, zero if none were made
    pub fn average_latency(&self) -> Duration {
        let count = self.call_count();
        if count == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.latency_sum_ms.load(Ordering::Relaxed) / count)
    }
}
