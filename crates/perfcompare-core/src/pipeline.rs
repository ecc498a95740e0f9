//! One comparison request from input paths to a finished outcome.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::CompareError;
use crate::parse::{parse_jtl, parse_report};
use crate::results::{compare_tabular_presence, compare_time_series, ComparisonReport};
use crate::summary::{Summarizer, SummaryInput};
use crate::tables::TableExtractor;
use crate::validation::ensure_readable;

/// Input files of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRequest {
    pub baseline_jtl: PathBuf,
    pub latest_jtl: PathBuf,
    pub baseline_splunk: PathBuf,
    pub latest_splunk: PathBuf,
    /// Format hint applied to both Splunk reports.
    pub splunk_format: String,
}

/// Everything produced by one comparison.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonOutcome {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub request: ComparisonRequest,
    pub jtl: ComparisonReport,
    pub splunk: ComparisonReport,
    pub baseline_raw_text: String,
    pub latest_raw_text: String,
    /// Soft failures from parsing, prefixed with the side they came from.
    pub warnings: Vec<String>,
}

impl ComparisonOutcome {
    pub fn summary_input(&self) -> SummaryInput<'_> {
        SummaryInput {
            jtl: &self.jtl,
            splunk: &self.splunk,
            baseline_raw_text: &self.baseline_raw_text,
            latest_raw_text: &self.latest_raw_text,
        }
    }
}

/// Validate, parse and compare the four inputs of `request`.
///
/// Inputs are validated in a fixed order (baseline JTL, latest JTL, baseline
/// Splunk, latest Splunk) and the first failure is returned. The four files
/// are then parsed concurrently; any hard parse error fails the request.
pub async fn run_comparison<E: TableExtractor>(
    request: &ComparisonRequest,
    extractor: &E,
) -> Result<ComparisonOutcome, CompareError> {
    ensure_readable(&request.baseline_jtl, "Baseline JTL").await?;
    ensure_readable(&request.latest_jtl, "Latest JTL").await?;
    ensure_readable(&request.baseline_splunk, "Baseline Splunk").await?;
    ensure_readable(&request.latest_splunk, "Latest Splunk").await?;

    let (baseline_jtl, latest_jtl, baseline_splunk, latest_splunk) = tokio::try_join!(
        parse_jtl(&request.baseline_jtl),
        parse_jtl(&request.latest_jtl),
        parse_report(&request.baseline_splunk, &request.splunk_format, extractor),
        parse_report(&request.latest_splunk, &request.splunk_format, extractor),
    )?;

    let jtl = compare_time_series(&baseline_jtl, &latest_jtl);
    let splunk = compare_tabular_presence(
        baseline_splunk.rows.as_deref(),
        latest_splunk.rows.as_deref(),
    );

    let warnings = baseline_splunk
        .warnings
        .iter()
        .map(|w| format!("Baseline Splunk: {w}"))
        .chain(
            latest_splunk
                .warnings
                .iter()
                .map(|w| format!("Latest Splunk: {w}")),
        )
        .collect();

    let outcome = ComparisonOutcome {
        id: Uuid::new_v4(),
        generated_at: Utc::now(),
        request: request.clone(),
        jtl,
        splunk,
        baseline_raw_text: baseline_splunk.raw_text,
        latest_raw_text: latest_splunk.raw_text,
        warnings,
    };

    tracing::info!(
        id = %outcome.id,
        baseline_samples = baseline_jtl.len(),
        latest_samples = latest_jtl.len(),
        warnings = outcome.warnings.len(),
        "comparison complete"
    );

    Ok(outcome)
}

/// Ask `summarizer` for a narrative report on a finished comparison.
pub async fn summarize_outcome<S: Summarizer>(
    outcome: &ComparisonOutcome,
    summarizer: &S,
) -> Result<String, CompareError> {
    summarizer.summarize(&outcome.summary_input()).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
