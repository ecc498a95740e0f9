use scraper::{ElementRef, Html, Selector};

use crate::row::{Row, RowSequence};

/// Elements whose text is never shown to a reader.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Outcome of scanning an HTML document.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupContent {
    /// At least one data row was extracted from the document's tables.
    Rows(RowSequence),
    /// No table rows; the visible body text instead.
    Text(String),
}

struct TableSelectors {
    table: Selector,
    thead_th: Selector,
    tr: Selector,
    header_cell: Selector,
    body_tr: Selector,
    td: Selector,
    th: Selector,
    body: Selector,
}

impl TableSelectors {
    fn new() -> Result<Self, String> {
        let sel = |css: &str| Selector::parse(css).map_err(|e| format!("selector {css}: {e:?}"));
        Ok(Self {
            table: sel("table")?,
            thead_th: sel("thead th")?,
            tr: sel("tr")?,
            header_cell: sel("td, th")?,
            body_tr: sel("tbody tr")?,
            td: sel("td")?,
            th: sel("th")?,
            body: sel("body")?,
        })
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Extract every table of an HTML document into rows, in document order.
///
/// Headers come from `thead th`, or failing that from the cells of the
/// table's first row (which is then not emitted as data). Cells beyond the
/// header count, or under a blank header, are keyed `ColumnN` with N the
/// zero-based cell index. When no table yields a row the document's visible
/// text is returned instead.
pub fn parse_html_str(content: &str) -> Result<MarkupContent, String> {
    let selectors = TableSelectors::new()?;
    let document = Html::parse_document(content);

    let mut rows = Vec::new();
    for table in document.select(&selectors.table) {
        extract_table(table, &selectors, &mut rows);
    }

    if rows.is_empty() {
        Ok(MarkupContent::Text(visible_text(&document, &selectors)))
    } else {
        Ok(MarkupContent::Rows(rows))
    }
}

fn extract_table(table: ElementRef<'_>, selectors: &TableSelectors, rows: &mut RowSequence) {
    let mut headers: Vec<String> = table.select(&selectors.thead_th).map(cell_text).collect();
    let mut header_row = None;
    // Without a thead the first row is the header, whatever its cell type,
    // and it is deliberately not repeated as a data row.
    if headers.is_empty() {
        if let Some(first) = table.select(&selectors.tr).next() {
            headers = first.select(&selectors.header_cell).map(cell_text).collect();
            header_row = Some(first.id());
        }
    }

    for (j, tr) in table.select(&selectors.body_tr).enumerate() {
        if header_row == Some(tr.id()) {
            continue;
        }
        let cells: Vec<ElementRef<'_>> = tr.select(&selectors.td).collect();
        // A th-only row opening the body repeats the header.
        if j == 0
            && !headers.is_empty()
            && cells.is_empty()
            && tr.select(&selectors.th).next().is_some()
        {
            continue;
        }

        let mut row = Row::with_capacity(cells.len());
        for (k, cell) in cells.into_iter().enumerate() {
            match headers.get(k).filter(|h| !h.is_empty()) {
                Some(header) => row.insert(header.as_str(), cell_text(cell)),
                None => row.insert(format!("Column{k}"), cell_text(cell)),
            };
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
}

/// Body text a reader would see. Script, style, noscript and template
/// contents are intentionally excluded.
fn visible_text(document: &Html, selectors: &TableSelectors) -> String {
    let root = document
        .select(&selectors.body)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            text.push_str(fragment);
        }
    }
    text.trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_of(html: &str) -> RowSequence {
        match parse_html_str(html).unwrap() {
            MarkupContent::Rows(rows) => rows,
            MarkupContent::Text(text) => panic!("expected rows, got text {text:?}"),
        }
    }

    #[test]
    fn thead_headers_key_body_rows() {
        let rows = rows_of(
            "<table><thead><tr><th>a</th><th>b</th></tr></thead>\
             <tbody><tr><td>1</td><td>2</td></tr><tr><td>3</td><td>4</td></tr></tbody></table>",
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("a"), Some("1"));
        assert_eq!(rows[0].get("b"), Some("2"));
        assert_eq!(rows[1].get("a"), Some("3"));
        assert_eq!(rows[1].get("b"), Some("4"));
    }

    #[test]
    fn th_header_row_without_thead_is_skipped() {
        let rows = rows_of(
            "<table><tr><th>a</th><th>b</th></tr>\
             <tr><td>1</td><td>2</td></tr><tr><td>3</td><td>4</td></tr></table>",
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("b"), Some("4"));
    }

    #[test]
    fn first_td_row_becomes_headers() {
        let rows = rows_of(
            "<table><tr><td>host</td><td>cpu</td></tr>\
             <tr><td>web-1</td><td>40</td></tr></table>",
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("host"), Some("web-1"));
        assert_eq!(rows[0].get("cpu"), Some("40"));
    }

    #[test]
    fn extra_cells_get_synthetic_column_names() {
        let rows = rows_of(
            "<table><thead><tr><th>a</th></tr></thead>\
             <tbody><tr><td>1</td><td>2</td><td>3</td></tr></tbody></table>",
        );
        let keys: Vec<&str> = rows[0].keys().collect();
        assert_eq!(keys, vec!["a", "Column1", "Column2"]);
        assert_eq!(rows[0].get("Column2"), Some("3"));
    }

    #[test]
    fn ragged_rows_stay_sparse() {
        let rows = rows_of(
            "<table><thead><tr><th>a</th><th>b</th><th>c</th></tr></thead>\
             <tbody><tr><td>1</td></tr><tr><td>1</td><td>2</td><td>3</td></tr></tbody></table>",
        );
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn multiple_tables_concatenate_in_document_order() {
        let rows = rows_of(
            "<table><thead><tr><th>x</th></tr></thead><tbody><tr><td>first</td></tr></tbody></table>\
             <p>between</p>\
             <table><thead><tr><th>y</th></tr></thead><tbody><tr><td>second</td></tr></tbody></table>",
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("x"), Some("first"));
        assert_eq!(rows[1].get("y"), Some("second"));
    }

    #[test]
    fn cell_text_is_trimmed() {
        let rows = rows_of(
            "<table><thead><tr><th> name </th></tr></thead>\
             <tbody><tr><td>\n  <b>web</b>-1  </td></tr></tbody></table>",
        );
        assert_eq!(rows[0].get("name"), Some("web-1"));
    }

    #[test]
    fn document_without_tables_degrades_to_visible_text() {
        let html = "<html><head><title>t</title><style>p { color: red }</style></head>\
                    <body><h1>Splunk Report</h1><script>var x = 1;</script>\
                    <p>CPU peaked at 91%</p></body></html>";
        match parse_html_str(html).unwrap() {
            MarkupContent::Text(text) => assert_eq!(text, "Splunk ReportCPU peaked at 91%"),
            MarkupContent::Rows(rows) => panic!("expected text, got {} rows", rows.len()),
        }
    }

    #[test]
    fn table_with_only_headers_degrades_to_text() {
        let html = "<body><p>Summary</p><table><thead><tr><th>a</th></tr></thead></table></body>";
        match parse_html_str(html).unwrap() {
            MarkupContent::Text(text) => assert_eq!(text, "Summarya"),
            MarkupContent::Rows(_) => panic!("expected text"),
        }
    }
}
