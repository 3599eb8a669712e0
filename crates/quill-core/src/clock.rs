//! Monotonic time sources.
//!
//! The intensity engine, the fixed-latency inference pad, and the venue
//! health tracker all consume [`Timestamp`]s from a wait-free monotonic
//! clock. [`MonotonicClock`] is the production source; [`ManualClock`]
//! drives deterministic tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use crate::traits::Clock;
use crate::types::Timestamp;

/// Wait-free monotonic clock.
///
/// Timestamps are nanoseconds since clock construction (an unspecified
/// epoch). Resolution follows `Instant`, sub-microsecond on the platforms
/// we target.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock anchored at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Timestamp {
        Timestamp::from_nanos(self.origin.elapsed().as_nanos() as i64)
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Thread-safe like the real clock so it can stand in for
/// [`MonotonicClock`] in multi-threaded tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicI64,
}

impl ManualClock {
    /// Create a clock starting at the given nanosecond offset.
    #[must_use]
    pub fn starting_at(nanos: i64) -> Self {
        Self {
            nanos: AtomicI64::new(nanos),
        }
    }

    /// Advance the clock by `nanos` nanoseconds.
    pub fn advance_nanos(&self, nanos: i64) {
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Advance the clock by `millis` milliseconds.
    pub fn advance_millis(&self, millis: i64) {
        self.advance_nanos(millis * 1_000_000);
    }

    /// Advance the clock by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance_nanos(secs * 1_000_000_000);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Timestamp {
        Timestamp::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let t1 = clock.now();
        std::thread::sleep(std::time::Duration::from_micros(10));
        let t2 = clock.now();

        assert!(t2 > t1);
    }

    #[test]
    fn test_monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let mut prev = clock.now();
        for _ in 0..1_000 {
            let now = clock.now();
            assert!(now >= prev);
            prev = now;
        }
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::starting_at(1_000);
        assert_eq!(clock.now().as_nanos(), 1_000);

        clock.advance_millis(2);
        assert_eq!(clock.now().as_nanos(), 2_001_000);

        clock.advance_secs(1);
        assert_eq!(clock.now().as_nanos(), 1_002_001_000);
    }
}
