// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clock sources.
//!
//! The pacer reads the current time through the [`Clock`] trait and nothing
//! else. [`MonotonicClock`] reads `CLOCK_MONOTONIC` (on Unix, through
//! `rustix`); [`ManualClock`] is advanced by hand and is what simulations and
//! tests use. Any `Fn() -> HostTime` closure is also a clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::time::{Duration, HostTime};

/// A monotonic nanosecond time source.
pub trait Clock {
    /// Returns the current time. Successive calls never go backwards.
    fn now(&self) -> HostTime;
}

impl<F: Fn() -> HostTime> Clock for F {
    #[inline]
    fn now(&self) -> HostTime {
        self()
    }
}

/// The system monotonic clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> HostTime {
        monotonic_now()
    }
}

#[cfg(unix)]
fn monotonic_now() -> HostTime {
    use rustix::time::{ClockId, clock_gettime};

    timespec_to_host_time(clock_gettime(ClockId::Monotonic))
}

#[cfg(unix)]
fn timespec_to_host_time(timespec: rustix::time::Timespec) -> HostTime {
    const NANOS_PER_SECOND: u128 = 1_000_000_000;

    let seconds = u64::try_from(timespec.tv_sec).unwrap_or(0);
    let nanos = u64::try_from(timespec.tv_nsec)
        .unwrap_or(0)
        .min(999_999_999);

    let ticks_u128 = u128::from(seconds)
        .saturating_mul(NANOS_PER_SECOND)
        .saturating_add(u128::from(nanos));
    HostTime(u64::try_from(ticks_u128).unwrap_or(u64::MAX))
}

// No portable raw monotonic clock outside Unix; count from the first read.
#[cfg(not(unix))]
fn monotonic_now() -> HostTime {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = *EPOCH.get_or_init(Instant::now);
    HostTime(u64::try_from(epoch.elapsed().as_nanos()).unwrap_or(u64::MAX))
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can hand one clone to a
/// [`Pacer`](crate::pacer::Pacer) and keep another to advance it.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: HostTime) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(start.nanos())),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.nanos(), Ordering::AcqRel);
    }

    /// Moves the clock forward to `to`.
    ///
    /// # Panics
    ///
    /// Panics if `to` is earlier than the current reading.
    pub fn advance_to(&self, to: HostTime) {
        let previous = self.nanos.fetch_max(to.nanos(), Ordering::AcqRel);
        assert!(
            previous <= to.nanos(),
            "manual clock cannot go backwards ({previous} -> {})",
            to.nanos()
        );
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> HostTime {
        HostTime(self.nanos.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_is_non_decreasing() {
        let clock = MonotonicClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first, "monotonic clock should not go backwards");
    }

    #[cfg(unix)]
    #[test]
    fn timespec_conversion_builds_nanoseconds() {
        let input = rustix::time::Timespec {
            tv_sec: 12,
            tv_nsec: 345_678_901,
        };
        assert_eq!(
            timespec_to_host_time(input),
            HostTime(12 * 1_000_000_000 + 345_678_901)
        );
    }

    #[cfg(unix)]
    #[test]
    fn timespec_conversion_saturates_on_large_values() {
        let input = rustix::time::Timespec {
            tv_sec: i64::MAX,
            tv_nsec: 999_999_999,
        };
        assert_eq!(timespec_to_host_time(input), HostTime(u64::MAX));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(HostTime(1_000));
        let handle = clock.clone();
        handle.advance(Duration(500));
        assert_eq!(clock.now(), HostTime(1_500));
        handle.advance_to(HostTime(4_000));
        assert_eq!(clock.now(), HostTime(4_000));
    }

    #[test]
    #[should_panic(expected = "cannot go backwards")]
    fn manual_clock_rejects_rewind() {
        let clock = ManualClock::new(HostTime(1_000));
        clock.advance_to(HostTime(999));
    }

    #[test]
    fn closures_are_clocks() {
        let fixed = || HostTime(42);
        assert_eq!(fixed.now(), HostTime(42));
    }
}
