//! The fixed-shape metric record external reporters consume.
//!
//! Grounded on `TimeseriesHistogram::getString` of the original source and
//! on the wire contract spelled out in SPEC_FULL.md §6. The core itself
//! never writes this anywhere — rendering/export is an external
//! collaborator's job — but the shape and its canonical rendering live
//! here since they are part of the crate's public query surface.

use serde::Serialize;

/// One level's worth of summary statistics, ready to key a reporter
/// record by metric name.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Report {
    pub count: u64,
    pub sum: f64,
    pub avg: f64,
    pub rate: f64,
    pub qps: f64,
    pub p99: f64,
    pub p90: f64,
    pub p80: f64,
}

impl Report {
    /// Render the exact wire snippet named in §6:
    /// `"<name>": { "count": .., "accu": .., "avg": .., "rate": .., "qps": .., "99%": .., "90%": .., "80%": .. }`
    /// with every number fixed at two fractional digits, in this field
    /// order.
    pub fn render(&self, name: &str) -> String {
        format!(
            "\"{name}\": {{ \"count\": {count}, \"accu\": {accu:.2}, \"avg\": {avg:.2}, \"rate\": {rate:.2}, \"qps\": {qps:.2}, \"99%\": {p99:.2}, \"90%\": {p90:.2}, \"80%\": {p80:.2} }}",
            name = name,
            count = self.count,
            accu = self.sum,
            avg = self.avg,
            rate = self.rate,
            qps = self.qps,
            p99 = self.p99,
            p90 = self.p90,
            p80 = self.p80,
        )
    }
}
