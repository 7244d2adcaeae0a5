//! `BucketedRing<V>`: a ring of [`Bucket`]s covering a fixed [`Duration`].
//!
//! Grounded on `include/BucketTimeSeries-inl.h` of the original
//! `performance-marker` source (`BucketedTimeSeries<VT>`). The index
//! arithmetic in [`BucketedRing::bucket_info`] distributing rounding
//! error evenly across slots for a non-evenly-divisible duration is the
//! hard part of this module.

use crate::bucket::Bucket;
use crate::error::ConfigError;
use crate::time::{Duration, Interval, TimePoint};
use crate::value::SampleValue;

/// `ceil(numerator / denominator)` for non-negative integers, expressed
/// without floating point so bucket boundaries stay on exact tick values.
fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator - 1) / denominator
}

/// How much of a bucket's `{count, sum}` falls inside a query window.
enum RangeAdjustment {
    Zero,
    Full,
    Partial(f64),
}

/// A fixed-size ring of [`Bucket`]s recycled in place over `duration`.
///
/// Empty iff `first_time > latest_time` — the constructor sets
/// `first_time = ticks(1)`, `latest_time = ticks(0)` to establish that.
#[derive(Clone, Debug)]
pub struct BucketedRing<V: SampleValue> {
    buckets: Vec<Bucket<V>>,
    total: Bucket<V>,
    duration: Duration,
    first_time: TimePoint,
    latest_time: TimePoint,
}

impl<V: SampleValue> BucketedRing<V> {
    /// `n_buckets` is clamped to `duration` if larger (a ring cannot have
    /// more buckets than ticks to distribute them over).
    pub fn new(n_buckets: usize, duration: Duration) -> Result<Self, ConfigError> {
        if n_buckets == 0 {
            return Err(ConfigError::ZeroBuckets);
        }
        if !duration.is_positive() {
            return Err(ConfigError::NonPositiveDuration);
        }
        let n_buckets = n_buckets.min(duration.ticks() as usize);
        Ok(Self {
            buckets: vec![Bucket::new(); n_buckets],
            total: Bucket::new(),
            duration,
            first_time: TimePoint::from_ticks(1),
            latest_time: TimePoint::from_ticks(0),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.first_time > self.latest_time
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn latest_time(&self) -> TimePoint {
        self.latest_time
    }

    pub fn clear(&mut self) {
        for b in &mut self.buckets {
            b.clear();
        }
        self.total.clear();
        self.first_time = TimePoint::from_ticks(1);
        self.latest_time = TimePoint::from_ticks(0);
    }

    // ---- index arithmetic (§4.1) -----------------------------------

    fn bucket_index(&self, tp: TimePoint) -> usize {
        let d = self.duration.ticks();
        let n = self.buckets.len() as i64;
        let tm = tp.since_epoch().rem_euclid(d);
        debug_assert!(tm >= 0);
        ((tm * n) / d) as usize
    }

    /// Returns `(index, bucketStart, nextBucketStart)` for the slot that
    /// `tp` falls into.
    fn bucket_info(&self, tp: TimePoint) -> (usize, TimePoint, TimePoint) {
        let d = self.duration.ticks();
        let n = self.buckets.len() as i64;
        let t = tp.since_epoch();
        let tm = t.rem_euclid(d);
        let scaled_time = tm * n;
        debug_assert!(scaled_time >= 0);
        let idx = (scaled_time / d) as usize;
        let scaled_bucket_start = scaled_time - scaled_time.rem_euclid(d);
        let scaled_next_bucket_start = scaled_bucket_start + d;
        let num_full_durations = t.div_euclid(d);
        let bucket_start = ceil_div(scaled_bucket_start, n) + num_full_durations * d;
        let next_bucket_start = ceil_div(scaled_next_bucket_start, n) + num_full_durations * d;
        (
            idx,
            TimePoint::from_ticks(bucket_start),
            TimePoint::from_ticks(next_bucket_start),
        )
    }

    // ---- write path (§4.2, §4.3) ------------------------------------

    /// Route `now` to a slot, evicting stale buckets if time has moved
    /// forward, and fold in `(total, n)`. Returns `false` (no state
    /// change) if `now` is a late arrival older than the retained window.
    /// A no-op when `n == 0`: must not divide or mutate state, including
    /// `first_time`/`latest_time` on an otherwise-empty ring.
    pub fn add_value_aggregated(&mut self, now: TimePoint, total: V, n: u64) -> bool {
        if n == 0 {
            return true;
        }
        let idx = if self.is_empty() {
            self.first_time = now;
            self.latest_time = now;
            self.bucket_index(now)
        } else if now == self.latest_time {
            self.bucket_index(now)
        } else if now > self.latest_time {
            self.evict_forward(now)
        } else {
            let earliest = self.get_earliest_time();
            if now < earliest {
                tracing::trace!(?now, "late sample older than the retained window, dropping");
                return false;
            }
            self.bucket_index(now)
        };

        self.total.add_aggregated(total, n);
        self.buckets[idx].add_aggregated(total, n);
        true
    }

    /// Roll stale buckets off without inserting new data; used by
    /// [`crate::series::MultiLevelSeries::update`].
    pub fn update(&mut self, now: TimePoint) -> usize {
        if self.is_empty() {
            self.first_time = now;
            self.latest_time = now;
            return self.bucket_index(now);
        }
        if now > self.latest_time {
            return self.evict_forward(now);
        }
        self.bucket_index(self.latest_time)
    }

    fn evict_forward(&mut self, now: TimePoint) -> usize {
        let (old_idx, old_start, old_next) = self.bucket_info(self.latest_time);
        self.latest_time = now;

        if now < old_next {
            return old_idx;
        }
        if now >= old_start + self.duration {
            tracing::trace!(
                ?now,
                "time jumped forward past a full duration, resetting ring"
            );
            for b in &mut self.buckets {
                b.clear();
            }
            self.total.clear();
            return self.bucket_index(now);
        }

        let new_bucket = self.bucket_index(now);
        let n = self.buckets.len();
        let mut idx = old_idx;
        while idx != new_bucket {
            idx = (idx + 1) % n;
            self.total -= &self.buckets[idx];
            self.buckets[idx].clear();
        }
        new_bucket
    }

    // ---- earliest/elapsed (§4.4) --------------------------------------

    pub fn get_earliest_time(&self) -> TimePoint {
        if self.is_empty() {
            return TimePoint::from_ticks(0);
        }
        let (_, _, next_start) = self.bucket_info(self.latest_time);
        let candidate = next_start - self.duration;
        candidate.max(self.first_time)
    }

    pub fn elapsed(&self, interval: Interval) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let ticks = (self.latest_time - self.get_earliest_time()).ticks() + 1;
        ticks as f64 / interval.ticks() as f64
    }

    pub fn elapsed_range(&self, start: TimePoint, end: TimePoint, interval: Interval) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let start = start.max(self.get_earliest_time());
        let mut end = end.min(self.latest_time + Duration::TICK);
        end = end.max(start);
        (end - start).ticks() as f64 / interval.ticks() as f64
    }

    // ---- traversal (§4.5) ----------------------------------------------

    /// Visit live buckets oldest-first, starting immediately after the
    /// slot that contains `latest_time`. `fn` may return `false` to stop
    /// early.
    fn for_each_bucket<F>(&self, mut f: F)
    where
        F: FnMut(&Bucket<V>, TimePoint, TimePoint) -> bool,
    {
        if self.is_empty() {
            return;
        }
        let n_buckets = self.buckets.len();
        let n = n_buckets as i64;
        let d = self.duration.ticks();
        let lt = self.latest_time.since_epoch();

        let time_mod = lt.rem_euclid(d);
        let num_full_durations = lt.div_euclid(d);
        let scaled_time = time_mod * n;
        let scaled_offset_in_bucket = scaled_time.rem_euclid(d);
        let scaled_bucket_start = scaled_time - scaled_offset_in_bucket;
        let mut scaled_next_bucket_start = scaled_bucket_start + d;

        let latest_bucket_idx = self.bucket_index(self.latest_time);
        let mut idx = latest_bucket_idx;
        let mut full_duration_ticks = num_full_durations * d - d;
        let mut next_bucket_start_ticks = ceil_div(scaled_next_bucket_start, n) + full_duration_ticks;

        loop {
            idx += 1;
            if idx >= n_buckets {
                idx = 0;
                full_duration_ticks += d;
                scaled_next_bucket_start = d;
            } else {
                scaled_next_bucket_start += d;
            }

            let bucket_start_ticks = next_bucket_start_ticks;
            next_bucket_start_ticks = ceil_div(scaled_next_bucket_start, n) + full_duration_ticks;

            let bucket_start = TimePoint::from_ticks(bucket_start_ticks);
            let next_bucket_start = TimePoint::from_ticks(next_bucket_start_ticks);

            let keep_going = f(&self.buckets[idx], bucket_start, next_bucket_start);
            if !keep_going || idx == latest_bucket_idx {
                break;
            }
        }
    }

    fn for_each_bucket_range<F>(&self, start: TimePoint, end: TimePoint, mut f: F)
    where
        F: FnMut(&Bucket<V>, TimePoint, TimePoint) -> bool,
    {
        self.for_each_bucket(|b, bucket_start, next_bucket_start| {
            if start >= next_bucket_start {
                return true;
            }
            if end <= bucket_start {
                return false;
            }
            f(b, bucket_start, next_bucket_start)
        });
    }

    fn range_adjustment(
        &self,
        mut bucket_start: TimePoint,
        mut next_bucket_start: TimePoint,
        start: TimePoint,
        end: TimePoint,
    ) -> RangeAdjustment {
        if bucket_start <= self.latest_time && next_bucket_start > self.latest_time {
            next_bucket_start = self.latest_time + Duration::TICK;
            if next_bucket_start <= start {
                return RangeAdjustment::Zero;
            }
        }
        if start <= bucket_start && end >= next_bucket_start {
            return RangeAdjustment::Full;
        }
        let interval_start = start.max(bucket_start);
        let interval_end = end.min(next_bucket_start);
        let scale = (interval_end - interval_start).ticks() as f64
            / (next_bucket_start - bucket_start).ticks() as f64;
        RangeAdjustment::Partial(scale)
    }

    // ---- range queries (§4.5) -------------------------------------------

    pub fn count_range(&self, start: TimePoint, end: TimePoint) -> u64 {
        let mut total = 0u64;
        self.for_each_bucket_range(start, end, |b, bs, nbs| {
            let adj = self.range_adjustment(bs, nbs, start, end);
            total += match adj {
                RangeAdjustment::Zero => 0,
                RangeAdjustment::Full => b.count,
                RangeAdjustment::Partial(scale) => (b.count as f64 * scale) as u64,
            };
            true
        });
        total
    }

    pub fn sum_range(&self, start: TimePoint, end: TimePoint) -> V {
        let mut total = V::default();
        self.for_each_bucket_range(start, end, |b, bs, nbs| {
            let adj = self.range_adjustment(bs, nbs, start, end);
            total += match adj {
                RangeAdjustment::Zero => V::default(),
                RangeAdjustment::Full => b.sum,
                RangeAdjustment::Partial(scale) => b.sum.scale(scale),
            };
            true
        });
        total
    }

    pub fn avg_range(&self, start: TimePoint, end: TimePoint) -> f64 {
        let count = self.count_range(start, end);
        if count == 0 {
            0.0
        } else {
            self.sum_range(start, end).to_f64() / count as f64
        }
    }

    pub fn rate_range(&self, start: TimePoint, end: TimePoint, interval: Interval) -> f64 {
        let elapsed = self.elapsed_range(start, end, interval);
        if elapsed == 0.0 {
            0.0
        } else {
            self.sum_range(start, end).to_f64() / elapsed
        }
    }

    pub fn count_rate_range(&self, start: TimePoint, end: TimePoint, interval: Interval) -> f64 {
        let elapsed = self.elapsed_range(start, end, interval);
        if elapsed == 0.0 {
            0.0
        } else {
            self.count_range(start, end) as f64 / elapsed
        }
    }

    fn full_window(&self) -> (TimePoint, TimePoint) {
        (self.get_earliest_time(), self.latest_time + Duration::TICK)
    }

    pub fn count(&self) -> u64 {
        let (s, e) = self.full_window();
        self.count_range(s, e)
    }

    pub fn sum(&self) -> V {
        let (s, e) = self.full_window();
        self.sum_range(s, e)
    }

    pub fn avg(&self) -> f64 {
        let (s, e) = self.full_window();
        self.avg_range(s, e)
    }

    pub fn rate(&self, interval: Interval) -> f64 {
        let (s, e) = self.full_window();
        self.rate_range(s, e, interval)
    }

    pub fn count_rate(&self, interval: Interval) -> f64 {
        let (s, e) = self.full_window();
        self.count_rate_range(s, e, interval)
    }

    /// Visit every live bucket's `(bucketStart, nextBucketStart)` bounds.
    /// Exposed for introspection/testing of the slot-width distribution
    /// (§8 scenario 7); not part of the query surface.
    #[cfg(test)]
    pub(crate) fn bucket_bounds(&self) -> Vec<(TimePoint, TimePoint)> {
        let mut bounds = Vec::new();
        self.for_each_bucket(|_, bs, nbs| {
            bounds.push((bs, nbs));
            true
        });
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: i64) -> TimePoint {
        TimePoint::from_ticks(n)
    }
    fn dur(n: i64) -> Duration {
        Duration::from_ticks(n)
    }

    #[test]
    fn zero_buckets_is_a_config_error() {
        assert_eq!(
            BucketedRing::<i64>::new(0, dur(10)).unwrap_err(),
            ConfigError::ZeroBuckets
        );
    }

    #[test]
    fn nonpositive_duration_is_a_config_error() {
        assert_eq!(
            BucketedRing::<i64>::new(10, dur(0)).unwrap_err(),
            ConfigError::NonPositiveDuration
        );
    }

    #[test]
    fn n_buckets_clamped_to_duration() {
        let ring = BucketedRing::<i64>::new(100, dur(10)).unwrap();
        assert_eq!(ring.num_buckets(), 10);
    }

    /// §8 scenario 1: single ring, basic.
    #[test]
    fn scenario_single_ring_basic() {
        let mut ring = BucketedRing::<i64>::new(10, dur(10)).unwrap();
        let t0 = secs(0);
        ring.add_value_aggregated(t0, 10_000, 1);
        let t1 = secs(10);
        ring.add_value_aggregated(t1, 1, 1);
        ring.add_value_aggregated(t1, 2, 1);
        ring.add_value_aggregated(t1, 3, 1);

        assert_eq!(ring.count(), 3);
        assert_eq!(ring.sum(), 6);
        assert_eq!(ring.avg(), 2.0);
        assert_eq!(ring.rate(Interval::TICK), 0.6);
        assert_eq!(ring.count_rate(Interval::TICK), 0.3);
    }

    /// §8 scenario 4: forward jump greater than the full duration clears
    /// the ring entirely.
    #[test]
    fn scenario_forward_jump_beyond_duration_clears_ring() {
        let mut ring = BucketedRing::<i64>::new(10, dur(10)).unwrap();
        ring.add_value_aggregated(secs(0), 42, 1);
        ring.add_value_aggregated(secs(11), 7, 1);
        assert_eq!(ring.count(), 1);
        assert_eq!(ring.sum(), 7);
    }

    /// §8 scenario 5: a late arrival still inside the window is accepted.
    #[test]
    fn scenario_late_arrival_inside_window() {
        let mut ring = BucketedRing::<i64>::new(10, dur(10)).unwrap();
        ring.add_value_aggregated(secs(0), 1, 1);
        ring.add_value_aggregated(secs(3), 2, 1);
        assert!(ring.add_value_aggregated(secs(1), 3, 1));
        assert_eq!(ring.count(), 3);
        assert_eq!(ring.sum(), 6);
    }

    /// §8 scenario 6: a late arrival outside the window is rejected and
    /// leaves state untouched.
    #[test]
    fn scenario_late_arrival_outside_window_is_dropped() {
        let mut ring = BucketedRing::<i64>::new(10, dur(10)).unwrap();
        ring.add_value_aggregated(secs(0), 1, 1);
        ring.add_value_aggregated(secs(3), 2, 1);
        ring.add_value_aggregated(secs(1), 3, 1);
        ring.add_value_aggregated(secs(20), 9, 1);

        let before = (ring.count(), ring.sum());
        let accepted = ring.add_value_aggregated(secs(5), 99, 1);
        assert!(!accepted);
        assert_eq!((ring.count(), ring.sum()), before);
    }

    /// §8 scenario 7: D=28, N=10 slot widths repeat as {3,3,3,3,2}×2.
    #[test]
    fn scenario_bucket_width_distribution() {
        let mut ring = BucketedRing::<i64>::new(10, dur(28)).unwrap();
        ring.add_value_aggregated(secs(0), 1, 1);
        // Force the ring to have lived a full cycle so all ten slots are
        // populated with real (bucketStart, nextBucketStart) bounds.
        ring.add_value_aggregated(secs(27), 1, 1);

        let bounds = ring.bucket_bounds();
        assert_eq!(bounds.len(), 10);

        let widths: Vec<i64> = bounds
            .iter()
            .map(|(s, e)| (*e - *s).ticks())
            .collect();
        assert_eq!(widths.iter().sum::<i64>(), 28);
        let mut sorted = widths.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![2, 2, 3, 3, 3, 3, 3, 3, 3, 3]);

        // Contiguity: each slot's end is the next slot's start (I4).
        for w in bounds.windows(2) {
            assert_eq!(w[0].1, w[1].0);
        }
    }

    #[test]
    fn invariant_i1_total_equals_sum_of_buckets() {
        let mut ring = BucketedRing::<i64>::new(5, dur(50)).unwrap();
        for t in [0, 3, 12, 40, 52, 55].iter().map(|&n| secs(n)) {
            ring.add_value_aggregated(t, 7, 1);
            let sum_of_buckets: i64 = ring.buckets.iter().map(|b| b.sum).sum();
            let count_of_buckets: u64 = ring.buckets.iter().map(|b| b.count).sum();
            assert_eq!(ring.total.sum, sum_of_buckets);
            assert_eq!(ring.total.count, count_of_buckets);
        }
    }

    #[test]
    fn empty_ring_reports_zero_everywhere() {
        let ring = BucketedRing::<i64>::new(10, dur(10)).unwrap();
        assert!(ring.is_empty());
        assert_eq!(ring.count(), 0);
        assert_eq!(ring.sum(), 0);
        assert_eq!(ring.avg(), 0.0);
        assert_eq!(ring.rate(Interval::TICK), 0.0);
        assert_eq!(ring.elapsed(Interval::TICK), 0.0);
    }

    /// §4.10: zero samples must not mutate state, even on an empty ring.
    #[test]
    fn zero_sample_aggregated_write_is_a_true_no_op() {
        let mut ring = BucketedRing::<i64>::new(10, dur(50)).unwrap();
        assert!(ring.add_value_aggregated(secs(100), 0, 0));
        assert!(ring.is_empty());
        assert_eq!(ring.count(), 0);
        assert_eq!(ring.sum(), 0);

        ring.add_value_aggregated(secs(5), 42, 1);
        assert_eq!(ring.count(), 1);
        assert_eq!(ring.sum(), 42);
    }

    #[test]
    fn update_idempotent_when_called_twice_at_same_time() {
        let mut ring = BucketedRing::<i64>::new(10, dur(10)).unwrap();
        ring.add_value_aggregated(secs(0), 5, 1);
        ring.update(secs(5));
        let snapshot = (ring.count(), ring.sum(), ring.latest_time());
        ring.update(secs(5));
        assert_eq!((ring.count(), ring.sum(), ring.latest_time()), snapshot);
    }
}
