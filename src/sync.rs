//! `Guarded<T>`: the crate's opt-in single-lock wrapper.
//!
//! The core aggregation types (`BucketedRing`, `MultiLevelSeries`,
//! `ValueHistogram`) are deliberately plain and not internally
//! synchronized — see SPEC_FULL.md §5. Wrapping one in `Guarded` gives the
//! "single lock per ring/series/histogram" behavior the original design
//! recommends, applied from outside rather than baked into the aggregation
//! math.

use parking_lot::{Mutex, MutexGuard};

/// A `T` behind a `parking_lot::Mutex`. Locking never fails and never
/// suspends beyond ordinary contention, matching §5's "no blocking I/O, no
/// cancellation" constraint.
pub struct Guarded<T> {
    inner: Mutex<T>,
}

impl<T> Guarded<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
