//! Natural-language summary of a comparison via an external generative model.

pub mod gemini;

use std::future::Future;

use crate::error::CompareError;
use crate::results::ComparisonReport;

pub use gemini::{GeminiSummarizer, SummarizerConfig};

/// Marker appended to a raw-text snippet that was cut short.
pub const TRUNCATION_MARKER: &str = "\n... (truncated for brevity)";

/// Placeholder used when a side has no raw text.
pub const NO_RAW_TEXT: &str = "N/A (No raw text provided)";

/// Everything the summarizer is given about one comparison.
#[derive(Debug, Clone, Copy)]
pub struct SummaryInput<'a> {
    pub jtl: &'a ComparisonReport,
    pub splunk: &'a ComparisonReport,
    pub baseline_raw_text: &'a str,
    pub latest_raw_text: &'a str,
}

/// External collaborator producing an opaque report text.
pub trait Summarizer: Send + Sync {
    fn summarize(
        &self,
        input: &SummaryInput<'_>,
    ) -> impl Future<Output = Result<String, CompareError>> + Send;
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    if text.trim().is_empty() {
        return NO_RAW_TEXT.to_string();
    }
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Build the analyst prompt sent to the model.
pub fn build_prompt(input: &SummaryInput<'_>, snippet_chars: usize) -> Result<String, CompareError> {
    let jtl = serde_json::to_string_pretty(input.jtl)?;
    let splunk = serde_json::to_string_pretty(input.splunk)?;
    let baseline = snippet(input.baseline_raw_text, snippet_chars);
    let latest = snippet(input.latest_raw_text, snippet_chars);

    Ok(format!(
        "You are a senior performance test engineer. Compare a Baseline test run with a \
Latest test run and write an executive-level report.

--- JMeter (JTL) comparison ---
Structured KPIs per metric with Baseline, Latest and percentage Change. Quantify
changes in response time, throughput, error rate and the 90th/95th/99th percentiles.

{jtl}

--- Splunk system health ---
Structured extraction summary:

{splunk}

Read the raw Splunk report text below directly. Compare throughput, component and
server latency, errors or abnormal log patterns, resource utilisation (CPU, memory,
disk I/O) and any new servers or outliers. Correlate these with the JMeter findings.

Baseline Splunk report (first {snippet_chars} characters):
{baseline}

Latest Splunk report (first {snippet_chars} characters):
{latest}

--- Required structure (markdown) ---
1. Executive Summary: overall trend and the single most important finding.
2. JMeter Performance Analysis: direction and magnitude of each significant change.
3. Splunk System Health and Resource Analysis: throughput, latency per server,
   outliers and their likely impact.
4. Identified Issues and Regressions: ordered by severity, citing corroborating
   JMeter and Splunk evidence.
5. Recommendations: concrete next steps for each critical finding.
"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{compare_tabular_presence, MISSING_JTL_WARNING};

    #[test]
    fn snippet_keeps_short_text() {
        assert_eq!(snippet("cpu 40%", 100), "cpu 40%");
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let text = "ééééé";
        let cut = snippet(text, 3);
        assert_eq!(cut, format!("ééé{TRUNCATION_MARKER}"));
    }

    #[test]
    fn snippet_of_exact_length_is_not_marked() {
        assert_eq!(snippet("abcd", 4), "abcd");
    }

    #[test]
    fn snippet_of_blank_text_is_placeholder() {
        assert_eq!(snippet("", 10), NO_RAW_TEXT);
        assert_eq!(snippet("  \n", 10), NO_RAW_TEXT);
    }

    #[test]
    fn prompt_embeds_reports_and_snippets() {
        let jtl = ComparisonReport::warning(MISSING_JTL_WARNING);
        let splunk = compare_tabular_presence(None, None);
        let input = SummaryInput {
            jtl: &jtl,
            splunk: &splunk,
            baseline_raw_text: "baseline text",
            latest_raw_text: "",
        };
        let prompt = build_prompt(&input, 4000).unwrap();
        assert!(prompt.contains(MISSING_JTL_WARNING));
        assert!(prompt.contains("\"Structured Data Found (Baseline)\": \"No\""));
        assert!(prompt.contains("baseline text"));
        assert!(prompt.contains(NO_RAW_TEXT));
        assert!(prompt.contains("first 4000 characters"));
    }
}
