//! Format parsers normalizing every input encoding into [`RowSequence`]s.
//!
//! JTL files always go through the delimited parser. Splunk exports are
//! dispatched on a format hint; markup and document parsers may degrade to
//! raw text, which is reported through [`ParsedReport::warnings`] rather than
//! as an error.

pub mod delimited;
pub mod document;
pub mod markup;
pub mod structured;

use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CompareError;
use crate::row::RowSequence;
use crate::tables::TableExtractor;

pub use delimited::{parse_delimited_file, parse_delimited_str, read_delimited};
pub use markup::{parse_html_str, MarkupContent};
pub use structured::parse_json_str;

// ---------------------------------------------------------------------------
// ReportFormat
// ---------------------------------------------------------------------------

/// Encodings accepted for Splunk reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Csv,
    Json,
    Html,
    Pdf,
}

impl ReportFormat {
    /// Resolve a user-supplied identifier, ignoring case and a leading dot.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Some(ReportFormat::Csv),
            "json" => Some(ReportFormat::Json),
            "html" | "htm" => Some(ReportFormat::Html),
            "pdf" => Some(ReportFormat::Pdf),
            _ => None,
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_hint)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
            ReportFormat::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hint(s).ok_or_else(|| {
            CompareError::Validation(format!(
                "Unsupported report format '{s}' (expected csv, json, html or pdf)"
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// ParsedReport
// ---------------------------------------------------------------------------

/// Output of parsing one Splunk report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ParsedReport {
    /// Structured rows, or `None` when only text could be extracted.
    pub rows: Option<RowSequence>,
    /// Extracted document text. Empty for tabular formats.
    pub raw_text: String,
    /// Soft extraction failures encountered while parsing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ParsedReport {
    fn rows(rows: RowSequence) -> Self {
        Self {
            rows: Some(rows),
            ..Self::default()
        }
    }

    /// Number of structured rows, zero when none were extracted.
    pub fn row_count(&self) -> usize {
        self.rows.as_ref().map_or(0, Vec::len)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse a JMeter JTL results file.
pub async fn parse_jtl(path: impl AsRef<Path>) -> Result<RowSequence, CompareError> {
    parse_delimited_file(path, "JTL").await
}

/// Parse a Splunk report in the encoding named by `format_hint`.
///
/// An unrecognised hint yields an empty report carrying a warning. Content
/// that cannot be read or decoded is a [`CompareError::Parse`].
pub async fn parse_report<E: TableExtractor>(
    path: impl AsRef<Path>,
    format_hint: &str,
    extractor: &E,
) -> Result<ParsedReport, CompareError> {
    let path = path.as_ref();
    let Some(format) = ReportFormat::from_hint(format_hint) else {
        let message = format!("Unsupported Splunk report format: {format_hint}");
        tracing::warn!(path = %path.display(), "{message}");
        return Ok(ParsedReport {
            warnings: vec![message],
            ..ParsedReport::default()
        });
    };

    let shown = path.display().to_string();
    let parse_error = |message: String| CompareError::parse(format.as_str(), shown.as_str(), message);

    match format {
        ReportFormat::Csv => Ok(ParsedReport::rows(
            parse_delimited_file(path, format.as_str()).await?,
        )),
        ReportFormat::Json => {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| parse_error(e.to_string()))?;
            let rows = parse_json_str(&content).map_err(parse_error)?;
            tracing::info!(path = %shown, rows = rows.len(), "parsed Splunk JSON");
            Ok(ParsedReport::rows(rows))
        }
        ReportFormat::Html => {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| parse_error(e.to_string()))?;
            match parse_html_str(&content).map_err(parse_error)? {
                MarkupContent::Rows(rows) => {
                    tracing::info!(path = %shown, rows = rows.len(), "parsed Splunk HTML tables");
                    Ok(ParsedReport::rows(rows))
                }
                MarkupContent::Text(raw_text) => {
                    let message =
                        format!("No table rows found in HTML report {shown}; using raw text");
                    tracing::warn!("{message}");
                    Ok(ParsedReport {
                        rows: None,
                        raw_text,
                        warnings: vec![message],
                    })
                }
            }
        }
        ReportFormat::Pdf => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| parse_error(e.to_string()))?;
            let raw_text = document::extract_pdf_text(bytes.clone())
                .await
                .map_err(parse_error)?;
            tracing::info!(path = %shown, chars = raw_text.len(), "extracted PDF text");

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "report.pdf".to_string());
            let tables = document::extract_pdf_tables(extractor, bytes, &file_name).await;

            Ok(ParsedReport {
                rows: tables.rows,
                raw_text,
                warnings: tables
                    .failure
                    .map(|e| format!("Structured table extraction unavailable for {shown}: {e}"))
                    .into_iter()
                    .collect(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
