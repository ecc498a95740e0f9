//! Aggregate statistics over JTL sample rows.
//!
//! All functions are pure and treat rows as read-only. Numeric fields are
//! parsed leniently: missing or non-numeric values count as `0`.

use crate::row::Row;

/// JTL column holding the sample's response time in milliseconds.
pub const ELAPSED: &str = "elapsed";
/// JTL column holding the sample start time in milliseconds since epoch.
pub const TIMESTAMP: &str = "timeStamp";
/// JTL column holding `true`/`false` per sample.
pub const SUCCESS: &str = "success";

/// Reported by [`percentage_change`] when the baseline is zero and the latest
/// value is not.
pub const CHANGE_NOT_APPLICABLE: &str = "N/A (Baseline is zero)";

/// Parse a cell as a finite number.
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn numeric_field(row: &Row, field: &str) -> f64 {
    row.get(field).and_then(parse_number).unwrap_or(0.0)
}

/// Mean of `field` across all rows. Returns 0 for an empty slice.
pub fn average(rows: &[Row], field: &str) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let sum: f64 = rows.iter().map(|r| numeric_field(r, field)).sum();
    sum / rows.len() as f64
}

/// Samples per second between the first and last row's `timeStamp`.
///
/// Rows must already be in chronological order; they are not sorted here.
/// Returns 0 with fewer than two rows, when either boundary timestamp is
/// missing or unparsable, or when the window is not positive.
pub fn throughput(rows: &[Row]) -> f64 {
    if rows.len() < 2 {
        return 0.0;
    }
    let (first, last) = (&rows[0], &rows[rows.len() - 1]);

    let boundary = |row: &Row| {
        row.get(TIMESTAMP)
            .filter(|ts| !ts.is_empty())
            .and_then(parse_number)
    };
    let (Some(start_ms), Some(end_ms)) = (boundary(first), boundary(last)) else {
        return 0.0;
    };

    let duration_secs = (end_ms - start_ms) / 1000.0;
    if duration_secs > 0.0 {
        rows.len() as f64 / duration_secs
    } else {
        0.0
    }
}

/// Percentage of rows whose `success` column is exactly `"false"`.
pub fn error_rate(rows: &[Row]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let errors = rows
        .iter()
        .filter(|r| r.get(SUCCESS) == Some("false"))
        .count();
    errors as f64 / rows.len() as f64 * 100.0
}

/// The p-th percentile of the `elapsed` column.
pub fn percentile(rows: &[Row], p: f64) -> f64 {
    field_percentile(rows, ELAPSED, p)
}

/// The p-th percentile of an arbitrary numeric column.
///
/// Uses the nearest-rank index `ceil(count * p / 100) - 1` over the ascending
/// values. Returns 0 for an empty slice or when the index falls outside the
/// data (p <= 0 or p > 100).
pub fn field_percentile(rows: &[Row], field: &str, p: f64) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = rows.iter().map(|r| numeric_field(r, field)).collect();
    sorted.sort_unstable_by(f64::total_cmp);

    let rank = (sorted.len() as f64 * p / 100.0).ceil();
    if rank.is_nan() || rank < 1.0 {
        return 0.0;
    }
    sorted.get(rank as usize - 1).copied().unwrap_or(0.0)
}

/// Relative change from `baseline` to `latest`, formatted as `"12.34%"`.
pub fn percentage_change(baseline: f64, latest: f64) -> String {
    if baseline == 0.0 {
        return if latest == 0.0 {
            "0.00%".to_string()
        } else {
            CHANGE_NOT_APPLICABLE.to_string()
        };
    }
    // `+ 0.0` folds a negative zero so "-0.00%" is never printed.
    let change = (latest - baseline) / baseline * 100.0 + 0.0;
    format!("{change:.2}%")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
