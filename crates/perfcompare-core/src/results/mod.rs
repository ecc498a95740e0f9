pub mod export;

use serde::ser::SerializeMap;
use serde::Serialize;

use crate::row::Row;
use crate::stats::{self, ELAPSED};

/// Key of the single entry in a warning-only report.
pub const WARNING_KEY: &str = "Warning";

/// Message used when either JTL side has no samples.
pub const MISSING_JTL_WARNING: &str = "JTL data is missing or incomplete for comparison.";

/// Note attached to tabular comparisons; the summarizer does the deep work.
pub const DELEGATION_NOTE: &str = "Detailed Splunk comparison and insight generation is \
handled by the AI summarizer using the raw text content.";

/// Percentiles of `elapsed` reported by [`compare_time_series`].
pub const REPORTED_PERCENTILES: [u32; 3] = [90, 95, 99];

// ---------------------------------------------------------------------------
// MetricResult
// ---------------------------------------------------------------------------

/// Display value of one side of a metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Exact integer count (e.g. number of samples).
    Count(usize),
    /// Value rounded to two decimals, e.g. `"123.46"`.
    Fixed(String),
}

impl MetricValue {
    pub fn fixed(value: f64) -> Self {
        MetricValue::Fixed(format!("{:.2}", value + 0.0))
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{n}"),
            MetricValue::Fixed(s) => f.write_str(s),
        }
    }
}

/// Baseline vs latest for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    #[serde(rename = "Baseline")]
    pub baseline: MetricValue,
    #[serde(rename = "Latest")]
    pub latest: MetricValue,
    /// Output of [`stats::percentage_change`] on the unrounded values.
    #[serde(rename = "Change")]
    pub change: String,
}

impl MetricResult {
    fn from_values(baseline: f64, latest: f64) -> Self {
        Self {
            baseline: MetricValue::fixed(baseline),
            latest: MetricValue::fixed(latest),
            change: stats::percentage_change(baseline, latest),
        }
    }
}

// ---------------------------------------------------------------------------
// ComparisonReport
// ---------------------------------------------------------------------------

/// Value of a single report entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportValue {
    Metric(MetricResult),
    Count(usize),
    Text(String),
}

/// Ordered mapping from metric name to value, built once per comparison.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonReport {
    entries: Vec<(String, ReportValue)>,
}

impl ComparisonReport {
    /// A report holding nothing but a [`WARNING_KEY`] entry.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            entries: vec![(WARNING_KEY.to_string(), ReportValue::Text(message.into()))],
        }
    }

    /// True when this report is the degenerate warning-only form.
    pub fn is_warning(&self) -> bool {
        self.entries.len() == 1 && self.entries[0].0 == WARNING_KEY
    }

    pub fn warning_message(&self) -> Option<&str> {
        match self.get(WARNING_KEY) {
            Some(ReportValue::Text(msg)) if self.is_warning() => Some(msg.as_str()),
            _ => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&ReportValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn metric(&self, name: &str) -> Option<&MetricResult> {
        match self.get(name) {
            Some(ReportValue::Metric(m)) => Some(m),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReportValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, name: impl Into<String>, value: ReportValue) {
        self.entries.push((name.into(), value));
    }
}

impl Serialize for ComparisonReport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Comparators
// ---------------------------------------------------------------------------

/// Compare two JTL sample sets metric by metric.
///
/// Returns a warning-only report when either side is empty.
pub fn compare_time_series(baseline: &[Row], latest: &[Row]) -> ComparisonReport {
    if baseline.is_empty() || latest.is_empty() {
        return ComparisonReport::warning(MISSING_JTL_WARNING);
    }

    let mut report = ComparisonReport::default();

    report.push(
        "Total Samples",
        ReportValue::Metric(MetricResult {
            baseline: MetricValue::Count(baseline.len()),
            latest: MetricValue::Count(latest.len()),
            change: stats::percentage_change(baseline.len() as f64, latest.len() as f64),
        }),
    );

    report.push(
        "Average Response Time (ms)",
        ReportValue::Metric(MetricResult::from_values(
            stats::average(baseline, ELAPSED),
            stats::average(latest, ELAPSED),
        )),
    );

    report.push(
        "Throughput (req/sec)",
        ReportValue::Metric(MetricResult::from_values(
            stats::throughput(baseline),
            stats::throughput(latest),
        )),
    );

    report.push(
        "Error Rate (%)",
        ReportValue::Metric(MetricResult::from_values(
            stats::error_rate(baseline),
            stats::error_rate(latest),
        )),
    );

    for p in REPORTED_PERCENTILES {
        report.push(
            format!("{p}th Percentile (ms)"),
            ReportValue::Metric(MetricResult::from_values(
                stats::percentile(baseline, f64::from(p)),
                stats::percentile(latest, f64::from(p)),
            )),
        );
    }

    report
}

/// Presence and record counts for tabular sources without metric semantics.
///
/// `None` means the parser produced no structured rows for that side.
pub fn compare_tabular_presence(
    baseline: Option<&[Row]>,
    latest: Option<&[Row]>,
) -> ComparisonReport {
    let found = |rows: Option<&[Row]>| {
        let yes = rows.is_some_and(|r| !r.is_empty());
        ReportValue::Text(if yes { "Yes" } else { "No" }.to_string())
    };
    let count = |rows: Option<&[Row]>| ReportValue::Count(rows.map_or(0, <[Row]>::len));

    let mut report = ComparisonReport::default();
    report.push("Structured Data Found (Baseline)", found(baseline));
    report.push("Structured Data Found (Latest)", found(latest));
    report.push("Baseline Splunk Records Count", count(baseline));
    report.push("Latest Splunk Records Count", count(latest));
    report.push(
        "AI Delegation Note",
        ReportValue::Text(DELEGATION_NOTE.to_string()),
    );
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
