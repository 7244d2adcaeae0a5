//! Tick-based clock types.
//!
//! `TimePoint` and `Duration` are newtypes over a signed 64-bit tick count.
//! The crate never assumes what a tick *is* — callers pick the resolution
//! (nanoseconds is the conventional choice, see [`units`]) as long as the
//! modulo/division arithmetic in [`crate::ring`] stays exact on whatever
//! unit they choose.

use std::ops::{Add, Sub};

/// A point on the caller's steady clock, in ticks since an arbitrary epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct TimePoint(i64);

impl TimePoint {
    pub fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    pub fn since_epoch(self) -> i64 {
        self.0
    }
}

impl Add<Duration> for TimePoint {
    type Output = TimePoint;
    fn add(self, rhs: Duration) -> TimePoint {
        TimePoint(self.0 + rhs.0)
    }
}

impl Sub<Duration> for TimePoint {
    type Output = TimePoint;
    fn sub(self, rhs: Duration) -> TimePoint {
        TimePoint(self.0 - rhs.0)
    }
}

impl Sub<TimePoint> for TimePoint {
    type Output = Duration;
    fn sub(self, rhs: TimePoint) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

/// A signed difference between two [`TimePoint`]s, in ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Duration(i64);

impl Duration {
    /// A single tick — the smallest representable, nonzero duration.
    pub const TICK: Duration = Duration(1);

    pub fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    pub fn ticks(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Duration;
    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

/// Ticks-per-reporting-unit, used by `rate`/`countRate`/`elapsed` so those
/// queries can report "per second", "per minute", etc. without the core
/// committing to a tick size. Stands in for the `Interval` template
/// parameter of the original C++ source.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Interval(i64);

impl Interval {
    /// One tick per reporting unit — i.e. report in raw ticks.
    pub const TICK: Interval = Interval(1);

    pub fn from_ticks_per_unit(ticks_per_unit: i64) -> Self {
        debug_assert!(ticks_per_unit > 0, "Interval must be a positive tick count");
        Self(ticks_per_unit)
    }

    pub fn ticks(self) -> i64 {
        self.0
    }
}

/// Conventional nanosecond-tick constants, for callers whose `TimePoint`s
/// come from a nanosecond-resolution steady clock.
pub mod units {
    use super::Interval;

    pub const NANOSECOND: Interval = Interval::TICK;
    pub const MICROSECOND: Interval = Interval(1_000);
    pub const MILLISECOND: Interval = Interval(1_000_000);
    pub const SECOND: Interval = Interval(1_000_000_000);
    pub const MINUTE: Interval = Interval(60 * 1_000_000_000);
    pub const HOUR: Interval = Interval(3_600 * 1_000_000_000);
}
