//! Shared JSON parsing helpers used by all exchange modules.

use serde_json::Value;

/// Parse a JSON value (string or number) as a finite `f64`.
///
/// Handles the common exchange pattern where numeric values may be encoded
/// as either JSON strings (`"30000.5"`) or native numbers (`30000.5`).
/// `NaN` and infinities are rejected.
#[inline]
pub fn parse_str_f64(v: Option<&Value>) -> Option<f64> {
    let v = v?;
    let n = if let Some(s) = v.as_str() { fast_float2::parse(s.trim()).ok()? } else { v.as_f64()? };
    n.is_finite().then_some(n)
}

/// Parse a named field on a JSON object as `f64` (string or number).
#[inline]
pub fn parse_f64_field(v: &Value, key: &str) -> Option<f64> {
    parse_str_f64(v.get(key))
}

/// Parse element `idx` of the array stored under `key`, e.g. `c[0]`.
#[inline]
pub fn parse_f64_at(v: &Value, key: &str, idx: usize) -> Option<f64> {
    parse_str_f64(v.get(key)?.get(idx))
}

/// Volumes are stored as whole units for most exchanges.
#[inline]
pub fn round_volume(v: f64) -> f64 {
    v.round()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn strings_and_numbers() {
        assert_eq!(parse_str_f64(Some(&json!("30000.5"))), Some(30000.5));
        assert_eq!(parse_str_f64(Some(&json!(12))), Some(12.0));
        assert_eq!(parse_str_f64(Some(&json!(" 1.5 "))), Some(1.5));
    }

    #[test]
    fn rejects_non_numeric() {
        assert_eq!(parse_str_f64(None), None);
        assert_eq!(parse_str_f64(Some(&json!("abc"))), None);
        assert_eq!(parse_str_f64(Some(&json!(""))), None);
        assert_eq!(parse_str_f64(Some(&json!(null))), None);
        assert_eq!(parse_str_f64(Some(&json!(["1"]))), None);
        assert_eq!(parse_str_f64(Some(&json!("NaN"))), None);
        assert_eq!(parse_str_f64(Some(&json!("inf"))), None);
    }

    #[test]
    fn array_element() {
        let v = json!({"c": ["100.1", "0.5"], "o": "x"});
        assert_eq!(parse_f64_at(&v, "c", 0), Some(100.1));
        assert_eq!(parse_f64_at(&v, "c", 2), None);
        assert_eq!(parse_f64_at(&v, "o", 0), None);
    }

    #[test]
    fn volume_rounding() {
        assert_eq!(round_volume(5.7), 6.0);
        assert_eq!(round_volume(5.2), 5.0);
        assert_eq!(round_volume(0.0), 0.0);
    }
}
