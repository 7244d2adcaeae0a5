//! Property tests for the invariants and laws listed in SPEC_FULL.md §8
//! (I1–I6, plus idempotence/flush-commutativity/monotonic-eviction).
//! Grounded on `agentreplay-core`'s use of `proptest` for its own
//! invariant suite.

use proptest::prelude::*;
use windowed_metrics::{BucketedRing, Duration, MultiLevelSeries, LevelSpec, TimePoint};

fn arb_write() -> impl Strategy<Value = (i64, i64, u64)> {
    (0i64..1000, -1000i64..1000, 1u64..5)
}

proptest! {
    /// I1: after any write, `total` equals the componentwise sum of the
    /// live buckets.
    #[test]
    fn i1_total_tracks_bucket_sum(writes in prop::collection::vec(arb_write(), 0..50)) {
        let mut ring = BucketedRing::<i64>::new(5, Duration::from_ticks(50)).unwrap();
        for (t, v, n) in writes {
            ring.add_value_aggregated(TimePoint::from_ticks(t), v, n);
            let (s, e) = (ring.get_earliest_time(), ring.latest_time() + Duration::from_ticks(1));
            prop_assert_eq!(ring.sum(), ring.sum_range(s, e));
            prop_assert_eq!(ring.count(), ring.count_range(s, e));
        }
    }

    /// I2: the retained window never exceeds the ring's configured
    /// duration.
    #[test]
    fn i2_earliest_time_bounded_by_duration(writes in prop::collection::vec(arb_write(), 1..50)) {
        let duration = Duration::from_ticks(50);
        let mut ring = BucketedRing::<i64>::new(5, duration).unwrap();
        for (t, v, n) in writes {
            ring.add_value_aggregated(TimePoint::from_ticks(t), v, n);
        }
        if !ring.is_empty() {
            let earliest = ring.get_earliest_time();
            prop_assert!(earliest >= ring.latest_time() - duration + Duration::from_ticks(1));
        }
    }

    /// I6: `avg(level) == sum(level) / count(level)` whenever nonempty,
    /// else 0 — checked on a two-level series.
    #[test]
    fn i6_avg_matches_sum_over_count(writes in prop::collection::vec(arb_write(), 0..50)) {
        let specs = [LevelSpec::windowed(5, Duration::from_ticks(50)), LevelSpec::windowed(5, Duration::from_ticks(500))];
        let mut series = MultiLevelSeries::<i64>::new(&specs).unwrap();
        for (t, v, n) in writes {
            series.add_value_aggregated(TimePoint::from_ticks(t), v, n);
        }
        series.flush();
        for level in 0..2 {
            let count = series.count(level);
            let avg = series.avg(level);
            if count == 0 {
                prop_assert_eq!(avg, 0.0);
            } else {
                prop_assert!((avg - series.sum(level) as f64 / count as f64).abs() < 1e-9);
            }
        }
    }

    /// Idempotence: calling `update` twice at the same time is a no-op.
    #[test]
    fn update_is_idempotent(writes in prop::collection::vec(arb_write(), 0..20), now in 0i64..2000) {
        let specs = [LevelSpec::windowed(5, Duration::from_ticks(50))];
        let mut series = MultiLevelSeries::<i64>::new(&specs).unwrap();
        for (t, v, n) in writes {
            series.add_value_aggregated(TimePoint::from_ticks(t), v, n);
        }
        series.update(TimePoint::from_ticks(now));
        let snapshot = (series.count(0), series.sum(0));
        series.update(TimePoint::from_ticks(now));
        prop_assert_eq!((series.count(0), series.sum(0)), snapshot);
    }

    /// Flush commutativity: two same-instant single-sample writes equal
    /// one aggregated write of their sum.
    #[test]
    fn flush_commutes_with_aggregation(v in -1000i64..1000, w in -1000i64..1000) {
        let specs_a = [LevelSpec::windowed(5, Duration::from_ticks(50))];
        let mut a = MultiLevelSeries::<i64>::new(&specs_a).unwrap();
        a.add_value(TimePoint::from_ticks(0), v);
        a.add_value(TimePoint::from_ticks(0), w);
        a.flush();

        let specs_b = [LevelSpec::windowed(5, Duration::from_ticks(50))];
        let mut b = MultiLevelSeries::<i64>::new(&specs_b).unwrap();
        b.add_value_aggregated(TimePoint::from_ticks(0), v + w, 2);
        b.flush();

        prop_assert_eq!(a.count(0), b.count(0));
        prop_assert_eq!(a.sum(0), b.sum(0));
    }

    /// Monotonic eviction: writing past a full duration clears the ring.
    #[test]
    fn monotonic_eviction_clears_ring(first in -1000i64..1000, second in -1000i64..1000) {
        let mut ring = BucketedRing::<i64>::new(5, Duration::from_ticks(10)).unwrap();
        ring.add_value_aggregated(TimePoint::from_ticks(0), first, 1);
        ring.add_value_aggregated(TimePoint::from_ticks(11), second, 1);
        prop_assert_eq!(ring.count(), 1);
        prop_assert_eq!(ring.sum(), second);
    }
}
