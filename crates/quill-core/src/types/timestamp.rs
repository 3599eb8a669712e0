//! Nanosecond-precision timestamp.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Sub;
use std::time::{SystemTime, UNIX_EPOCH};

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{NS_PER_MS, NS_PER_SEC, NS_PER_US};

/// Nanosecond-precision timestamp.
///
/// Uses i64 internally: signed nanoseconds since an unspecified epoch.
/// Wall-clock timestamps (from [`Timestamp::now`]) are relative to the Unix
/// epoch; monotonic timestamps (from a clock in [`crate::clock`]) are
/// relative to process start. The two families must not be mixed in
/// arithmetic.
///
/// # Example
///
/// ```rust
/// use quill_core::types::Timestamp;
///
/// let ts = Timestamp::from_micros(5);
/// assert_eq!(ts.as_nanos(), 5_000);
/// assert!(ts.add_nanos(1) > ts);
/// ```
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Zero timestamp (the epoch)
    pub const EPOCH: Self = Self(0);

    /// Create a timestamp from nanoseconds since epoch
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from microseconds since epoch
    #[inline]
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros * NS_PER_US as i64)
    }

    /// Create a timestamp from milliseconds since epoch
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * NS_PER_MS as i64)
    }

    /// Create a timestamp from seconds since epoch
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * NS_PER_SEC as i64)
    }

    /// Current wall-clock timestamp (Unix epoch based).
    ///
    /// For the hot path use [`crate::clock::MonotonicClock`] instead.
    #[inline]
    #[must_use]
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Self(duration.as_nanos() as i64)
    }

    /// Get nanoseconds since epoch
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Get microseconds since epoch
    #[inline]
    #[must_use]
    pub const fn as_micros(self) -> i64 {
        self.0 / NS_PER_US as i64
    }

    /// Get milliseconds since epoch
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0 / NS_PER_MS as i64
    }

    /// Get seconds since epoch
    #[inline]
    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.0 / NS_PER_SEC as i64
    }

    /// Add nanoseconds to this timestamp
    #[inline]
    #[must_use]
    pub const fn add_nanos(self, nanos: i64) -> Self {
        Self(self.0 + nanos)
    }

    /// Add microseconds to this timestamp
    #[inline]
    #[must_use]
    pub const fn add_micros(self, micros: i64) -> Self {
        Self(self.0 + micros * NS_PER_US as i64)
    }

    /// Add milliseconds to this timestamp
    #[inline]
    #[must_use]
    pub const fn add_millis(self, millis: i64) -> Self {
        Self(self.0 + millis * NS_PER_MS as i64)
    }

    /// Nanoseconds elapsed since an earlier timestamp (may be negative)
    #[inline]
    #[must_use]
    pub const fn duration_since(self, earlier: Self) -> i64 {
        self.0 - earlier.0
    }

    /// Seconds elapsed since an earlier timestamp, as f64.
    ///
    /// Clock jitter can produce a negative value; callers that feed decay
    /// kernels clip it to zero.
    #[inline]
    #[must_use]
    pub fn seconds_since(self, earlier: Self) -> f64 {
        (self.0 - earlier.0) as f64 / NS_PER_SEC as f64
    }

    /// Saturating addition
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, nanos: i64) -> Self {
        Self(self.0.saturating_add(nanos))
    }
}

impl PartialOrd for Timestamp {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Sub for Timestamp {
    type Output = i64;

    #[inline]
    fn sub(self, other: Self) -> i64 {
        self.0 - other.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ns)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.as_secs();
        let nsecs = (self.0 % NS_PER_SEC as i64).unsigned_abs() as u32;
        match chrono::DateTime::from_timestamp(secs, nsecs) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.9f")),
            None => write!(f, "{}ns", self.0),
        }
    }
}
