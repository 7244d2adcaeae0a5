//! `MultiLevelSeries<V>`: several [`BucketedRing`]s of increasing
//! duration, fed from a single write path.
//!
//! Grounded on `include/MultiLevelTimeSeries-inl.h` of the original
//! `performance-marker` source. Levels are ordered finest-duration-first,
//! matching the original's "level 0 is the shortest retention window"
//! convention (e.g. `[10 s, 1 min, 10 min]`).

use crate::error::ConfigError;
use crate::ring::BucketedRing;
use crate::time::{Duration, Interval, TimePoint};
use crate::value::SampleValue;

/// One level's shape: how many buckets, covering how long a duration.
#[derive(Clone, Copy, Debug)]
pub struct LevelSpec {
    pub num_buckets: usize,
    pub duration: Duration,
}

impl LevelSpec {
    pub fn windowed(num_buckets: usize, duration: Duration) -> Self {
        Self {
            num_buckets,
            duration,
        }
    }
}

/// A write fanned out to every retention level at once, with same-instant
/// writes coalesced into a single cached `(total, n)` pair before the
/// fan-out — grounded on the original's `mCachedTime`/`mCachedSum` pair in
/// `MultiLevelTimeSeries::addValue`.
#[derive(Clone)]
pub struct MultiLevelSeries<V: SampleValue> {
    levels: Vec<BucketedRing<V>>,
    cached_time: Option<TimePoint>,
    cached_total: V,
    cached_count: u64,
}

impl<V: SampleValue> MultiLevelSeries<V> {
    pub fn new(specs: &[LevelSpec]) -> Result<Self, ConfigError> {
        if specs.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        let mut levels = Vec::with_capacity(specs.len());
        for spec in specs {
            levels.push(BucketedRing::new(spec.num_buckets, spec.duration)?);
        }
        Ok(Self {
            levels,
            cached_time: None,
            cached_total: V::default(),
            cached_count: 0,
        })
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Record one sample, coalescing with any pending same-instant write.
    pub fn add_value(&mut self, now: TimePoint, value: V) {
        self.add_value_aggregated(now, value, 1);
    }

    /// Record `n` samples totalling `total`, coalescing with any pending
    /// same-instant write before fanning out to every level. A no-op when
    /// `n == 0` (§4.10: must not divide or mutate state).
    pub fn add_value_aggregated(&mut self, now: TimePoint, total: V, n: u64) {
        if n == 0 {
            return;
        }
        match self.cached_time {
            Some(t) if t == now => {
                self.cached_total += total;
                self.cached_count += n;
            }
            Some(_) => {
                self.flush();
                self.cached_time = Some(now);
                self.cached_total = total;
                self.cached_count = n;
            }
            None => {
                self.cached_time = Some(now);
                self.cached_total = total;
                self.cached_count = n;
            }
        }
    }

    /// Push any pending coalesced write out to every level, if
    /// `cachedCount > 0`. Idempotent: calling it twice in a row with no
    /// intervening write is a no-op (I-idempotence, §8).
    pub fn flush(&mut self) {
        if self.cached_count > 0 {
            let t = self.cached_time.take().expect("cachedTime set whenever cachedCount > 0");
            for level in &mut self.levels {
                level.add_value_aggregated(t, self.cached_total, self.cached_count);
            }
            self.cached_total = V::default();
            self.cached_count = 0;
        }
    }

    /// Roll every level forward to `now` without recording a sample —
    /// used to make eviction visible to readers between writes.
    pub fn update(&mut self, now: TimePoint) {
        self.flush();
        for level in &mut self.levels {
            level.update(now);
        }
    }

    pub fn clear(&mut self) {
        self.cached_time = None;
        self.cached_total = V::default();
        self.cached_count = 0;
        for level in &mut self.levels {
            level.clear();
        }
    }

    fn level(&self, idx: usize) -> &BucketedRing<V> {
        &self.levels[idx]
    }

    pub fn count(&self, level: usize) -> u64 {
        self.level(level).count()
    }

    pub fn sum(&self, level: usize) -> V {
        self.level(level).sum()
    }

    pub fn avg(&self, level: usize) -> f64 {
        self.level(level).avg()
    }

    pub fn rate(&self, level: usize, interval: Interval) -> f64 {
        self.level(level).rate(interval)
    }

    pub fn count_rate(&self, level: usize, interval: Interval) -> f64 {
        self.level(level).count_rate(interval)
    }

    /// The level whose `duration` exactly equals `d`, or the last level as
    /// a deliberate best-effort fallback when none matches.
    pub fn level_by_duration(&self, d: Duration) -> usize {
        self.levels
            .iter()
            .position(|l| l.duration() == d)
            .unwrap_or(self.levels.len() - 1)
    }

    /// The shortest level whose retained window covers `start` — the
    /// first level (in construction order) with `latestTime - duration <=
    /// start`, else the last level.
    fn level_for_range(&self, start: TimePoint) -> usize {
        for (i, level) in self.levels.iter().enumerate() {
            if !level.is_empty() && (level.latest_time() - level.duration()) <= start {
                return i;
            }
        }
        self.levels.len() - 1
    }

    pub fn count_by_duration(&self, d: Duration) -> u64 {
        self.count(self.level_by_duration(d))
    }

    pub fn sum_by_duration(&self, d: Duration) -> V {
        self.sum(self.level_by_duration(d))
    }

    pub fn avg_by_duration(&self, d: Duration) -> f64 {
        self.avg(self.level_by_duration(d))
    }

    pub fn rate_by_duration(&self, d: Duration, interval: Interval) -> f64 {
        self.rate(self.level_by_duration(d), interval)
    }

    pub fn count_rate_by_duration(&self, d: Duration, interval: Interval) -> f64 {
        self.count_rate(self.level_by_duration(d), interval)
    }

    pub fn count_range(&self, start: TimePoint, end: TimePoint) -> u64 {
        self.level(self.level_for_range(start)).count_range(start, end)
    }

    pub fn sum_range(&self, start: TimePoint, end: TimePoint) -> V {
        self.level(self.level_for_range(start)).sum_range(start, end)
    }

    pub fn avg_range(&self, start: TimePoint, end: TimePoint) -> f64 {
        self.level(self.level_for_range(start)).avg_range(start, end)
    }

    pub fn rate_range(&self, start: TimePoint, end: TimePoint, interval: Interval) -> f64 {
        self.level(self.level_for_range(start))
            .rate_range(start, end, interval)
    }

    pub fn count_rate_range(&self, start: TimePoint, end: TimePoint, interval: Interval) -> f64 {
        self.level(self.level_for_range(start))
            .count_rate_range(start, end, interval)
    }

    /// Exposed so [`crate::histogram::ValueHistogram`] can compute its
    /// cross-shard rate as `total_sum / max(shard.elapsed)`, matching the
    /// original's `TimeseriesHistogram::rate`.
    pub fn elapsed(&self, level: usize, interval: Interval) -> f64 {
        self.level(level).elapsed(interval)
    }

    pub fn elapsed_range(&self, start: TimePoint, end: TimePoint, interval: Interval) -> f64 {
        self.level(self.level_for_range(start))
            .elapsed_range(start, end, interval)
    }
}
