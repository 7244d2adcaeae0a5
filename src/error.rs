//! Construction-time validation errors.
//!
//! Construction is the only fallible operation in this crate (§7 of
//! SPEC_FULL.md). Everything past construction either succeeds or returns a
//! documented sentinel (`false`, `V::default()`) — never an `Err`.

/// A configuration error raised by a constructor.
///
/// These are programmer errors (a call site passed a nonsensical shape),
/// not recoverable runtime conditions — callers are expected to treat them
/// the same way they'd treat any other misuse-of-API bug.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("numBuckets must be greater than zero")]
    ZeroBuckets,

    #[error("duration must be a positive number of ticks")]
    NonPositiveDuration,

    #[error("a multi-level series needs at least one duration level")]
    NoLevels,

    #[error("bucketSize must be greater than zero")]
    NonPositiveBucketSize,

    #[error("max - min must be at least bucketSize")]
    RangeTooSmall,
}
