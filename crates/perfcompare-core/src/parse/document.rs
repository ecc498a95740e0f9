use crate::row::RowSequence;
use crate::tables::{ExtractionError, TableExtractor};

/// Structured half of a PDF parse; the raw text is produced separately.
#[derive(Debug)]
pub struct TableOutcome {
    /// Flattened rows of every extracted table, or `None` when nothing usable
    /// came back.
    pub rows: Option<RowSequence>,
    /// Soft failure of the extraction call, if any.
    pub failure: Option<ExtractionError>,
}

/// Extract the full text layer of a PDF.
///
/// Runs on the blocking pool; a panic inside the PDF decoder is reported as
/// an error rather than unwinding into the caller.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, String> {
    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| format!("PDF text extraction aborted: {e}"))?
}

/// Ask the table-extraction collaborator for structured rows.
///
/// Every failure, including the extractor's deadline expiring, is returned
/// as data in [`TableOutcome::failure`]; this never fails the parse.
pub async fn extract_pdf_tables<E: TableExtractor>(
    extractor: &E,
    bytes: Vec<u8>,
    file_name: &str,
) -> TableOutcome {
    let deadline = extractor.timeout();
    let result = match tokio::time::timeout(deadline, extractor.extract_tables(bytes, file_name)).await
    {
        Ok(result) => result,
        Err(_) => Err(ExtractionError::Timeout(deadline)),
    };

    match result {
        Ok(tables) => {
            let rows: RowSequence = tables.into_iter().flatten().collect();
            if rows.is_empty() {
                tracing::info!(file = file_name, "table extraction found no structured data");
                TableOutcome {
                    rows: None,
                    failure: None,
                }
            } else {
                tracing::info!(file = file_name, rows = rows.len(), "extracted PDF tables");
                TableOutcome {
                    rows: Some(rows),
                    failure: None,
                }
            }
        }
        Err(err) => {
            tracing::warn!(file = file_name, error = %err, "PDF table extraction failed, keeping raw text only");
            TableOutcome {
                rows: None,
                failure: Some(err),
            }
        }
    }
}

/// Assemble a one-page PDF showing `text` in Helvetica, with a correct
/// cross-reference table.
#[cfg(test)]
pub(crate) fn single_page_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 18 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = pdf.len();
    let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        tail.push_str(&format!("{offset:010} 00000 n \n"));
    }
    tail.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(tail.as_bytes());
    pdf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
