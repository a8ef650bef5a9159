use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use log::warn;
use thiserror::Error;

use crate::types::TimestampMs;

/// Error type for clock reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClockError {
    /// System time is before UNIX epoch
    #[error("System time is before UNIX epoch")]
    SystemTimeBeforeEpoch,
}

/// Source of wall-clock milliseconds for the engine.
///
/// Every protocol timestamp (`created_at`, `last_seen`, tick scheduling) is
/// read through one `Clock` handle, so peers driven by the same clock observe
/// a consistent timeline.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> TimestampMs;
}

/// Wall clock backed by [`SystemTime`], in milliseconds since UNIX epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Returns the current timestamp in milliseconds since UNIX epoch.
    ///
    /// # Errors
    /// Returns `ClockError::SystemTimeBeforeEpoch` if system time is before
    /// UNIX epoch.
    pub fn try_now_ms() -> Result<TimestampMs, ClockError> {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as TimestampMs)
            .map_err(|_| ClockError::SystemTimeBeforeEpoch)
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> TimestampMs {
        match Self::try_now_ms() {
            Ok(now) => now,
            Err(e) => {
                warn!("Clock read failed: {}", e);
                0
            }
        }
    }
}

/// Manually advanced clock for tests and simulations.
///
/// Clones share the same underlying instant, so one handle can drive a whole
/// mesh of engines.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: TimestampMs) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Moves the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Jumps the clock to an absolute instant.
    pub fn set(&self, now_ms: TimestampMs) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimestampMs {
        self.now.load(Ordering::SeqCst)
    }
}
