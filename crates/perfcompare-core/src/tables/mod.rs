//! Secondary structured-table extraction for PDF reports.
//!
//! Table extraction is best effort: the document parser always has the raw
//! text already, so every [`ExtractionError`] is downgraded to a warning by
//! the caller.

pub mod client;

use std::future::Future;
use std::time::Duration;

use crate::row::RowSequence;

pub use client::{HttpTableExtractor, TableExtractorBuilder};

/// Default upper bound on a single extraction call.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("table extraction service unreachable: {0}")]
    Unavailable(String),

    #[error("table extraction service error: {0}")]
    Service(String),

    #[error("table extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid response from table extraction service: {0}")]
    InvalidResponse(String),

    #[error("table extraction is disabled")]
    Disabled,
}

/// Out-of-process collaborator turning PDF bytes into tables of rows.
pub trait TableExtractor: Send + Sync {
    /// Extract every table found in the document, in page order.
    fn extract_tables(
        &self,
        pdf: Vec<u8>,
        file_name: &str,
    ) -> impl Future<Output = Result<Vec<RowSequence>, ExtractionError>> + Send;

    /// Deadline applied by the caller around [`Self::extract_tables`].
    fn timeout(&self) -> Duration {
        DEFAULT_EXTRACTION_TIMEOUT
    }
}

/// Extractor used when no table service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTableExtractor;

impl TableExtractor for DisabledTableExtractor {
    async fn extract_tables(
        &self,
        _pdf: Vec<u8>,
        _file_name: &str,
    ) -> Result<Vec<RowSequence>, ExtractionError> {
        Err(ExtractionError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_extractor_always_errors() {
        let result = DisabledTableExtractor
            .extract_tables(b"%PDF-1.4".to_vec(), "report.pdf")
            .await;
        assert!(matches!(result, Err(ExtractionError::Disabled)));
        assert_eq!(DisabledTableExtractor.timeout(), DEFAULT_EXTRACTION_TIMEOUT);
    }

    #[test]
    fn timeout_error_display() {
        let err = ExtractionError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "table extraction timed out after 5s");
    }
}
