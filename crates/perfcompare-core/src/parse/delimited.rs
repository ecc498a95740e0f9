use std::io::Read;
use std::path::Path;

use crate::error::CompareError;
use crate::row::{Row, RowSequence};

/// Read delimited text whose first record is the header.
///
/// Records are mapped to header names by position. Short records produce
/// sparse rows; fields past the header length are dropped. A record that is
/// not valid UTF-8 aborts the read.
pub fn read_delimited<R: Read>(reader: R) -> Result<RowSequence, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_string()
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.as_str(), v))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Parse in-memory delimited content.
pub fn parse_delimited_str(content: &str) -> Result<RowSequence, String> {
    read_delimited(content.as_bytes()).map_err(|e| e.to_string())
}

/// Stream a delimited file from disk on the blocking pool.
///
/// `format` labels any resulting [`CompareError::Parse`] (e.g. `"JTL"`).
pub async fn parse_delimited_file(
    path: impl AsRef<Path>,
    format: &str,
) -> Result<RowSequence, CompareError> {
    let path = path.as_ref().to_path_buf();
    let shown = path.display().to_string();

    let rows = tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&path).map_err(|e| e.to_string())?;
        read_delimited(std::io::BufReader::new(file)).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| CompareError::Internal(format!("delimited parse task failed: {e}")))?
    .map_err(|message| CompareError::parse(format, shown.as_str(), message))?;

    tracing::info!(path = %shown, rows = rows.len(), "parsed {format} file");
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const JTL: &str = "\
timeStamp,elapsed,label,responseCode,success
1700000000000,120,GET /home,200,true
1700000000500,340,GET /cart,500,false
1700000001000,95,GET /home,200,true
";

    #[test]
    fn header_defines_keys_and_rows_follow() {
        let rows = parse_delimited_str(JTL).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("timeStamp"), Some("1700000000000"));
        assert_eq!(rows[0].get("elapsed"), Some("120"));
        assert_eq!(rows[0].get("label"), Some("GET /home"));
        assert_eq!(rows[1].get("success"), Some("false"));
        let keys: Vec<&str> = rows[0].keys().collect();
        assert_eq!(keys, vec!["timeStamp", "elapsed", "label", "responseCode", "success"]);
    }

    #[test]
    fn quoted_fields_keep_embedded_delimiters() {
        let rows = parse_delimited_str("label,elapsed\n\"GET /a, b\",12\n").unwrap();
        assert_eq!(rows[0].get("label"), Some("GET /a, b"));
    }

    #[test]
    fn short_and_long_rows_are_kept() {
        let rows = parse_delimited_str("a,b,c\n1,2\n1,2,3,4\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0].get("c"), None);
        assert_eq!(rows[1].len(), 3);
        assert_eq!(rows[1].get("c"), Some("3"));
    }

    #[test]
    fn header_only_and_empty_inputs_yield_no_rows() {
        assert!(parse_delimited_str("a,b\n").unwrap().is_empty());
        assert!(parse_delimited_str("").unwrap().is_empty());
    }

    #[test]
    fn byte_order_mark_is_stripped_from_first_header() {
        let rows = parse_delimited_str("\u{feff}host,cpu\nweb-1,40\n").unwrap();
        assert_eq!(rows[0].get("host"), Some("web-1"));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let bytes: &[u8] = b"a,b\n\xff\xfe,1\n";
        assert!(read_delimited(bytes).is_err());
    }

    #[tokio::test]
    async fn file_with_n_rows_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("baseline.jtl");
        tokio::fs::write(&path, JTL).await.unwrap();

        let rows = parse_delimited_file(&path, "JTL").await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("elapsed"), Some("120"));
        assert_eq!(rows[0].get("responseCode"), Some("200"));
    }

    #[tokio::test]
    async fn missing_file_is_parse_error() {
        let err = parse_delimited_file("/nonexistent/results.jtl", "JTL")
            .await
            .unwrap_err();
        match err {
            CompareError::Parse { format, path, .. } => {
                assert_eq!(format, "JTL");
                assert_eq!(path, "/nonexistent/results.jtl");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
