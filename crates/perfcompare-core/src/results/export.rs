use chrono::SecondsFormat;
use serde::Serialize;

use super::{ComparisonReport, ReportValue};
use crate::pipeline::ComparisonOutcome;

// ---------------------------------------------------------------------------
// JSON export
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(flatten)]
    outcome: &'a ComparisonOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
}

/// Export a comparison outcome as pretty-printed JSON, with the AI summary
/// under `summary` when one was produced.
pub fn export_json(
    outcome: &ComparisonOutcome,
    summary: Option<&str>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonDocument { outcome, summary })
}

// ---------------------------------------------------------------------------
// Plain-text export
// ---------------------------------------------------------------------------

/// Render a comparison as aligned plain-text tables for a terminal.
pub fn render_text(outcome: &ComparisonOutcome, summary: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Comparison {}\n", outcome.id.hyphenated()));
    out.push_str(&format!(
        "Generated: {}\n",
        outcome
            .generated_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    out.push('\n');

    out.push_str("JMeter (JTL)\n");
    out.push_str(&text_table(&outcome.jtl));
    out.push('\n');

    out.push_str("Splunk\n");
    out.push_str(&text_table(&outcome.splunk));

    if !outcome.warnings.is_empty() {
        out.push_str("\nWarnings\n");
        for w in &outcome.warnings {
            out.push_str(&format!("  - {w}\n"));
        }
    }

    if let Some(summary) = summary {
        out.push_str("\nAI Summary\n\n");
        out.push_str(summary.trim_end());
        out.push('\n');
    }

    out
}

fn text_table(report: &ComparisonReport) -> String {
    let rows: Vec<[String; 4]> = report
        .iter()
        .map(|(name, value)| match value {
            ReportValue::Metric(m) => [
                name.to_string(),
                m.baseline.to_string(),
                m.latest.to_string(),
                m.change.clone(),
            ],
            ReportValue::Count(n) => [name.to_string(), n.to_string(), String::new(), String::new()],
            ReportValue::Text(t) => [name.to_string(), t.clone(), String::new(), String::new()],
        })
        .collect();

    let has_metrics = report
        .iter()
        .any(|(_, v)| matches!(v, ReportValue::Metric(_)));

    let header = ["Metric", "Baseline", "Latest", "Change"];
    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    if has_metrics {
        out.push_str(&pad_line(&header.map(str::to_string), &widths));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&format!("  {}\n", rule.join("  ")));
        for row in &rows {
            out.push_str(&pad_line(row, &widths));
        }
    } else {
        // Non-metric reports are key/value lines; the value may be long prose.
        for row in &rows {
            out.push_str(&format!("  {:<width$}  {}\n", row[0], row[1], width = widths[0]));
        }
    }
    out
}

fn pad_line(cells: &[String; 4], widths: &[usize; 4]) -> String {
    let line = cells
        .iter()
        .zip(widths.iter())
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    format!("  {}\n", line.trim_end())
}

// ---------------------------------------------------------------------------
// HTML export
// ---------------------------------------------------------------------------

/// Export a comparison as a standalone HTML page with inline CSS.
///
/// When `summary` is given it is included verbatim (escaped, whitespace
/// preserved) under its own heading.
pub fn export_html(outcome: &ComparisonOutcome, summary: Option<&str>) -> String {
    let generated = outcome
        .generated_at
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    let warnings_section = if outcome.warnings.is_empty() {
        String::new()
    } else {
        let items: String = outcome
            .warnings
            .iter()
            .map(|w| format!("  <li>{}</li>", html_escape(w)))
            .collect::<Vec<_>>()
            .join("\n");
        format!("<h2>Warnings</h2>\n<ul class=\"warnings\">\n{items}\n</ul>\n")
    };

    let summary_section = summary
        .map(|s| {
            format!(
                "<h2>AI Summary</h2>\n<pre class=\"summary\">{}</pre>\n",
                html_escape(s)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Performance Comparison Report</title>
<style>
  *, *::before, *::after {{ box-sizing: border-box; }}
  body {{
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    margin: 0; padding: 2rem;
    background: #0f172a; color: #e2e8f0; line-height: 1.5;
  }}
  h1 {{ font-size: 1.75rem; font-weight: 700; color: #f1f5f9; margin: 0 0 0.25rem; }}
  h2 {{ font-size: 1.125rem; font-weight: 600; color: #94a3b8;
        text-transform: uppercase; letter-spacing: 0.05em;
        margin: 2rem 0 0.75rem; border-bottom: 1px solid #1e293b; padding-bottom: 0.5rem; }}
  .meta {{ color: #64748b; font-size: 0.875rem; margin-bottom: 2rem; }}
  .meta span {{ margin-right: 1.5rem; }}
  .run-id {{ font-family: monospace; font-size: 0.8rem; color: #475569; }}
  table {{
    width: 100%; border-collapse: collapse; font-size: 0.875rem;
    background: #1e293b; border-radius: 0.5rem; overflow: hidden;
    margin-bottom: 2rem;
  }}
  thead {{ background: #0f172a; }}
  th, td {{ padding: 0.625rem 1rem; text-align: left; border-top: 1px solid #334155; }}
  th {{ font-weight: 600; color: #94a3b8; text-transform: uppercase; font-size: 0.75rem; }}
  td {{ color: #cbd5e1; }}
  td.metric {{ color: #94a3b8; font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.04em; }}
  .pos {{ color: #f87171; }}
  .neg {{ color: #34d399; }}
  .neutral {{ color: #94a3b8; }}
  ul.warnings {{ color: #fbbf24; }}
  pre.summary {{
    white-space: pre-wrap; background: #1e293b; border: 1px solid #334155;
    border-radius: 0.5rem; padding: 1rem 1.25rem; color: #e2e8f0;
  }}
  footer {{
    margin-top: 3rem; padding-top: 1rem; border-top: 1px solid #1e293b;
    color: #475569; font-size: 0.8125rem;
  }}
</style>
</head>
<body>
<h1>Performance Comparison Report</h1>
<div class="meta">
  <span>Baseline JTL: {baseline_jtl}</span>
  <span>Latest JTL: {latest_jtl}</span>
  <span class="run-id">ID: {id}</span>
</div>

<h2>JMeter (JTL)</h2>
{jtl_table}
<h2>Splunk</h2>
{splunk_table}
{warnings_section}{summary_section}
<footer>Generated by perfcompare &bull; {generated}</footer>
</body>
</html>
"#,
        baseline_jtl = html_escape(&outcome.request.baseline_jtl.display().to_string()),
        latest_jtl = html_escape(&outcome.request.latest_jtl.display().to_string()),
        id = outcome.id.hyphenated(),
        jtl_table = html_table(&outcome.jtl),
        splunk_table = html_table(&outcome.splunk),
        warnings_section = warnings_section,
        summary_section = summary_section,
        generated = generated,
    )
}

fn html_table(report: &ComparisonReport) -> String {
    let rows: String = report
        .iter()
        .map(|(name, value)| match value {
            ReportValue::Metric(m) => format!(
                "    <tr><td class=\"metric\">{}</td><td>{}</td><td>{}</td>\
                 <td class=\"{}\">{}</td></tr>",
                html_escape(name),
                html_escape(&m.baseline.to_string()),
                html_escape(&m.latest.to_string()),
                change_class(name, &m.change),
                html_escape(&m.change),
            ),
            ReportValue::Count(n) => format!(
                "    <tr><td class=\"metric\">{}</td><td colspan=\"3\">{n}</td></tr>",
                html_escape(name)
            ),
            ReportValue::Text(t) => format!(
                "    <tr><td class=\"metric\">{}</td><td colspan=\"3\">{}</td></tr>",
                html_escape(name),
                html_escape(t)
            ),
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<table>\n  <thead>\n    <tr><th>Metric</th><th>Baseline</th><th>Latest</th><th>Change</th></tr>\n  \
         </thead>\n  <tbody>\n{rows}\n  </tbody>\n</table>\n"
    )
}

/// Colour class for a change cell. Throughput is the only metric where a
/// rise is an improvement; sample counts are neutral.
fn change_class(metric: &str, change: &str) -> &'static str {
    let Some(delta) = change
        .strip_suffix('%')
        .and_then(|s| s.parse::<f64>().ok())
    else {
        return "neutral";
    };
    if metric.starts_with("Total Samples") {
        "neutral"
    } else if metric.starts_with("Throughput") {
        delta_class_higher_better(delta)
    } else {
        delta_class_lower_better(delta)
    }
}

fn delta_class_lower_better(d: f64) -> &'static str {
    if d > 0.001 { "pos" } else if d < -0.001 { "neg" } else { "neutral" }
}

fn delta_class_higher_better(d: f64) -> &'static str {
    if d > 0.001 { "neg" } else if d < -0.001 { "pos" } else { "neutral" }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
