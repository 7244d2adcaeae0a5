//! `ValueHistogram<V>`: samples sharded by value range into parallel
//! [`MultiLevelSeries`], with percentile estimation by linear
//! interpolation inside the located shard.
//!
//! Grounded on `include/HistogramBuckets-inl.h` (sharding/indexing) and
//! `include/TimeseriesHistogram.h` (the per-shard `MultiLevelSeries`
//! composition and cross-shard aggregate queries) of the original
//! `performance-marker` source.

use crate::error::ConfigError;
use crate::report::Report;
use crate::series::MultiLevelSeries;
use crate::time::{Interval, TimePoint};
use crate::value::SampleValue;

/// Where a located shard's cumulative-count fraction was tracked during
/// the percentile locate step; `0.0/0.0` both when there is no data.
struct Located {
    shard_idx: usize,
    low_pct: f64,
    high_pct: f64,
}

pub struct ValueHistogram<V: SampleValue> {
    bucket_size: V,
    min: V,
    max: V,
    shards: Vec<MultiLevelSeries<V>>,
}

impl<V: SampleValue> ValueHistogram<V> {
    /// `prototype` is cloned into every shard, so every shard shares the
    /// same level layout (number of buckets and durations).
    pub fn new(
        bucket_size: V,
        min: V,
        max: V,
        prototype: MultiLevelSeries<V>,
    ) -> Result<Self, ConfigError> {
        if !(bucket_size.to_f64() > 0.0) {
            return Err(ConfigError::NonPositiveBucketSize);
        }
        if max.to_f64() - min.to_f64() < bucket_size.to_f64() {
            return Err(ConfigError::RangeTooSmall);
        }
        let num_regular = ((max.to_f64() - min.to_f64()) / bucket_size.to_f64()).ceil() as usize;
        let num_buckets = num_regular + 2;
        let shards = (0..num_buckets).map(|_| prototype.clone()).collect();
        Ok(Self {
            bucket_size,
            min,
            max,
            shards,
        })
    }

    pub fn num_buckets(&self) -> usize {
        self.shards.len()
    }

    pub fn num_levels(&self) -> usize {
        self.shards[0].num_levels()
    }

    pub fn bucket_size(&self) -> V {
        self.bucket_size
    }

    pub fn min(&self) -> V {
        self.min
    }

    pub fn max(&self) -> V {
        self.max
    }

    fn last_idx(&self) -> usize {
        self.shards.len() - 1
    }

    fn bucket_idx(&self, v: V) -> usize {
        if v < self.min {
            return 0;
        }
        if v >= self.max {
            return self.last_idx();
        }
        let idx = ((v.to_f64() - self.min.to_f64()) / self.bucket_size.to_f64()).floor() as usize + 1;
        idx.min(self.last_idx() - 1)
    }

    /// `[low, high)` for shard `i`. Shard 0 and the last shard have no
    /// finite span of their own (underflow/overflow); percentile
    /// interpolation (§4.8) treats them specially rather than reading
    /// these bounds, but they are exposed for introspection.
    pub fn bucket_min(&self, i: usize) -> V {
        if i == 0 {
            V::min_value()
        } else if i == self.last_idx() {
            self.max
        } else {
            V::from_f64(self.min.to_f64() + (i as f64 - 1.0) * self.bucket_size.to_f64())
        }
    }

    pub fn bucket_max(&self, i: usize) -> V {
        if i == 0 {
            self.min
        } else if i == self.last_idx() {
            V::max_value()
        } else {
            let end = self.min.to_f64() + i as f64 * self.bucket_size.to_f64();
            V::from_f64(end.min(self.max.to_f64()))
        }
    }

    pub fn add_value(&mut self, now: TimePoint, value: V) {
        self.add_value_aggregated(now, value, 1);
    }

    pub fn add_value_aggregated(&mut self, now: TimePoint, value: V, times: u64) {
        let idx = self.bucket_idx(value);
        self.shards[idx].add_value_aggregated(now, value.mul_u64(times), times);
    }

    pub fn update(&mut self, now: TimePoint) {
        for shard in &mut self.shards {
            shard.update(now);
        }
    }

    pub fn clear(&mut self) {
        for shard in &mut self.shards {
            shard.clear();
        }
    }

    // ---- cross-shard aggregate queries (TimeseriesHistogram) -----------

    pub fn count(&self, level: usize) -> u64 {
        self.shards.iter().map(|s| s.count(level)).sum()
    }

    pub fn count_range(&self, start: TimePoint, end: TimePoint) -> u64 {
        self.shards.iter().map(|s| s.count_range(start, end)).sum()
    }

    pub fn sum(&self, level: usize) -> V {
        let mut total = V::default();
        for s in &self.shards {
            total += s.sum(level);
        }
        total
    }

    pub fn sum_range(&self, start: TimePoint, end: TimePoint) -> V {
        let mut total = V::default();
        for s in &self.shards {
            total += s.sum_range(start, end);
        }
        total
    }

    pub fn avg(&self, level: usize) -> f64 {
        let count = self.count(level);
        if count == 0 {
            0.0
        } else {
            self.sum(level).to_f64() / count as f64
        }
    }

    pub fn avg_range(&self, start: TimePoint, end: TimePoint) -> f64 {
        let count = self.count_range(start, end);
        if count == 0 {
            0.0
        } else {
            self.sum_range(start, end).to_f64() / count as f64
        }
    }

    pub fn rate(&self, level: usize, interval: Interval) -> f64 {
        let total = self.sum(level).to_f64();
        let elapsed = self
            .shards
            .iter()
            .map(|s| s.elapsed(level, interval))
            .fold(0.0, f64::max);
        if elapsed == 0.0 {
            0.0
        } else {
            total / elapsed
        }
    }

    pub fn rate_range(&self, start: TimePoint, end: TimePoint, interval: Interval) -> f64 {
        let total = self.sum_range(start, end).to_f64();
        let elapsed = self
            .shards
            .iter()
            .map(|s| s.elapsed_range(start, end, interval))
            .fold(0.0, f64::max);
        if elapsed == 0.0 {
            0.0
        } else {
            total / elapsed
        }
    }

    pub fn count_rate(&self, level: usize, interval: Interval) -> f64 {
        let total = self.count(level) as f64;
        let elapsed = self
            .shards
            .iter()
            .map(|s| s.elapsed(level, interval))
            .fold(0.0, f64::max);
        if elapsed == 0.0 {
            0.0
        } else {
            total / elapsed
        }
    }

    pub fn count_rate_range(&self, start: TimePoint, end: TimePoint, interval: Interval) -> f64 {
        let total = self.count_range(start, end) as f64;
        let elapsed = self
            .shards
            .iter()
            .map(|s| s.elapsed_range(start, end, interval))
            .fold(0.0, f64::max);
        if elapsed == 0.0 {
            0.0
        } else {
            total / elapsed
        }
    }

    // ---- percentile estimation (§4.8) -----------------------------------

    fn locate<F>(&self, pct: f64, shard_count: F) -> Located
    where
        F: Fn(usize) -> u64,
    {
        let total: u64 = (0..self.shards.len()).map(&shard_count).sum();
        if total == 0 {
            return Located {
                shard_idx: 0,
                low_pct: 0.0,
                high_pct: 0.0,
            };
        }

        let mut cumulative = 0u64;
        let mut prev_pct = 0.0;
        for idx in 0..self.shards.len() {
            let c = shard_count(idx);
            if c == 0 {
                continue;
            }
            cumulative += c;
            let cur_pct = cumulative as f64 / total as f64;
            if cur_pct >= pct {
                return Located {
                    shard_idx: idx,
                    low_pct: prev_pct,
                    high_pct: cur_pct,
                };
            }
            prev_pct = cur_pct;
        }
        // pct >= 1.0 (or float rounding at the tail): the last non-empty
        // shard carries the remaining mass.
        let last_nonempty = (0..self.shards.len())
            .rev()
            .find(|&i| shard_count(i) > 0)
            .unwrap_or(0);
        Located {
            shard_idx: last_nonempty,
            low_pct: prev_pct,
            high_pct: 1.0,
        }
    }

    fn interpolate(&self, pct: f64, located: Located, avg: f64) -> V {
        if located.low_pct == located.high_pct {
            return V::from_f64(avg);
        }

        let (low, high) = self.interpolation_bounds(located.shard_idx, avg);
        let median_pct = (located.low_pct + located.high_pct) / 2.0;

        let value = if pct < median_pct {
            low + (avg - low) * (pct - located.low_pct) / (median_pct - located.low_pct)
        } else {
            avg + (high - avg) * (pct - median_pct) / (located.high_pct - median_pct)
        };
        V::from_f64(value)
    }

    /// `[low, high)` used by the interpolation step, which extrapolates
    /// past the configured range for the underflow/overflow shards.
    fn interpolation_bounds(&self, idx: usize, avg: f64) -> (f64, f64) {
        if idx == 0 {
            let high = self.min.to_f64();
            let low = high - 2.0 * (high - avg);
            (low.max(V::min_value().to_f64()), high)
        } else if idx == self.last_idx() {
            let low = self.max.to_f64();
            let high = low + 2.0 * (avg - low);
            (low, high.min(V::max_value().to_f64()))
        } else {
            (self.bucket_min(idx).to_f64(), self.bucket_max(idx).to_f64())
        }
    }

    pub fn percentile_estimate(&self, pct: f64, level: usize) -> V {
        let located = self.locate(pct, |i| self.shards[i].count(level));
        if located.low_pct == 0.0 && located.high_pct == 0.0 && self.count(level) == 0 {
            return V::default();
        }
        let avg = self.shards[located.shard_idx].avg(level);
        self.interpolate(pct, located, avg)
    }

    pub fn percentile_estimate_range(&self, pct: f64, start: TimePoint, end: TimePoint) -> V {
        let located = self.locate(pct, |i| self.shards[i].count_range(start, end));
        if located.low_pct == 0.0 && located.high_pct == 0.0 && self.count_range(start, end) == 0 {
            return V::default();
        }
        let avg = self.shards[located.shard_idx].avg_range(start, end);
        self.interpolate(pct, located, avg)
    }

    pub fn percentile_bucket_idx(&self, pct: f64, level: usize) -> usize {
        self.locate(pct, |i| self.shards[i].count(level)).shard_idx
    }

    pub fn percentile_bucket_idx_range(&self, pct: f64, start: TimePoint, end: TimePoint) -> usize {
        self.locate(pct, |i| self.shards[i].count_range(start, end))
            .shard_idx
    }

    /// Render the fixed §4.9/§6 wire record for `level` at the given
    /// reporting `interval`.
    pub fn report(&self, level: usize, interval: Interval) -> Report {
        Report {
            count: self.count(level),
            sum: self.sum(level).to_f64(),
            avg: self.avg(level),
            rate: self.rate(level, interval),
            qps: self.count_rate(level, interval),
            p99: self.percentile_estimate(0.99, level).to_f64(),
            p90: self.percentile_estimate(0.90, level).to_f64(),
            p80: self.percentile_estimate(0.80, level).to_f64(),
        }
    }
}
