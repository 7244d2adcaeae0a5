//! An in-process, time-windowed metrics aggregation core.
//!
//! Three layers, built bottom-up:
//!
//! - [`ring::BucketedRing`] — counts and sums over a fixed duration,
//!   divided into N recycled time slots.
//! - [`series::MultiLevelSeries`] — several rings of different durations
//!   fed from one write path, with same-instant writes coalesced.
//! - [`histogram::ValueHistogram`] — samples sharded by value range into
//!   many multi-level series, with percentile estimation by linear
//!   interpolation inside the located shard.
//!
//! None of these types are internally synchronized; wrap one in
//! [`sync::Guarded`] for concurrent access. See each module's docs for the
//! write/eviction/query semantics.

pub mod bucket;
pub mod error;
pub mod histogram;
pub mod report;
pub mod ring;
pub mod series;
pub mod sync;
pub mod time;
pub mod value;

pub use bucket::Bucket;
pub use error::ConfigError;
pub use histogram::ValueHistogram;
pub use report::Report;
pub use ring::BucketedRing;
pub use series::{LevelSpec, MultiLevelSeries};
pub use sync::Guarded;
pub use time::{units, Duration, Interval, TimePoint};
pub use value::SampleValue;
