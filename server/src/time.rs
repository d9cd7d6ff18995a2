//! Time source abstraction for token issuance and expiry checks.
//!
//! The token service never reads the system clock directly. It asks a
//! `TimeSource`, so production uses the real clock and tests can move time
//! forward past a token's expiry without sleeping.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over "what time is it now".
pub trait TimeSource: Send + Sync {
    /// Get the current time in whole seconds since Unix epoch.
    fn now_secs(&self) -> u64;
}

/// Real time source using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> u64 {
        // Only fails if the system clock is set before 1970.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs())
    }
}

/// A manually driven time source.
///
/// Time only moves when told to. Clones share the same instant, so a test can
/// hand one clone to the token service and keep another to advance the clock.
///
/// # Example
///
/// ```
/// use portal::time::{ManualTimeSource, TimeSource};
///
/// let time = ManualTimeSource::new(1000);
/// let shared = time.clone();
///
/// time.advance(100);
/// assert_eq!(shared.now_secs(), 1100);
///
/// time.set(5000);
/// assert_eq!(shared.now_secs(), 5000);
/// ```
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    current_secs: Arc<AtomicU64>,
}

impl ManualTimeSource {
    /// Create a manual time source starting at `initial_secs`.
    #[must_use]
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current_secs: Arc::new(AtomicU64::new(initial_secs)),
        }
    }

    /// Start at `1_700_000_000` (November 2023).
    #[must_use]
    pub fn default_start() -> Self {
        Self::new(1_700_000_000)
    }

    /// Advance time by `secs`, saturating at `u64::MAX`.
    pub fn advance(&self, secs: u64) {
        let _ = self
            .current_secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(secs))
            });
    }

    /// Set the current time. May move time backwards.
    pub fn set(&self, secs: u64) {
        self.current_secs.store(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_secs(&self) -> u64 {
        self.current_secs.load(Ordering::SeqCst)
    }
}
