//! Wall-clock helpers.
//!
//! Everything persisted by the tracker is stamped in UTC at the moment the
//! tracker itself observed it, never with a timestamp taken from a payload.

use chrono::{DateTime, Utc};

/// Current instant in UTC.
#[inline]
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Round to two decimal places (half away from zero).
#[inline]
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
