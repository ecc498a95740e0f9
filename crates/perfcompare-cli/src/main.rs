//! `perfcompare` command-line front end.
//!
//! ```bash
//! perfcompare compare \
//!     --baseline-jtl base.jtl --latest-jtl latest.jtl \
//!     --baseline-splunk base.pdf --latest-splunk latest.pdf \
//!     --table-service http://localhost:5001/parse-pdf-tables \
//!     --summarize --output html --out report.html
//!
//! perfcompare inspect latest.html
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` to override the default filter.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use perfcompare_core::parse::{parse_jtl, parse_report, ReportFormat};
use perfcompare_core::results::export::{export_html, export_json, render_text};
use perfcompare_core::row::column_names;
use perfcompare_core::summary::{GeminiSummarizer, SummarizerConfig};
use perfcompare_core::tables::{
    DisabledTableExtractor, HttpTableExtractor, TableExtractor, DEFAULT_EXTRACTION_TIMEOUT,
};
use perfcompare_core::validation::ensure_readable;
use perfcompare_core::{run_comparison, summarize_outcome, ComparisonRequest};

#[derive(Parser)]
#[command(name = "perfcompare")]
#[command(version)]
#[command(about = "Compare a baseline and a latest performance-test run")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare JMeter results and Splunk reports of two runs
    Compare(CompareArgs),
    /// Parse a single file and describe what was extracted
    Inspect(InspectArgs),
}

#[derive(clap::Args)]
struct CompareArgs {
    #[arg(long)]
    baseline_jtl: PathBuf,

    #[arg(long)]
    latest_jtl: PathBuf,

    #[arg(long)]
    baseline_splunk: PathBuf,

    #[arg(long)]
    latest_splunk: PathBuf,

    /// Splunk report format (csv, json, html, pdf); guessed from the
    /// baseline file extension when omitted
    #[arg(long)]
    splunk_format: Option<String>,

    /// PDF table-extraction service endpoint
    #[arg(long, env = "PERFCOMPARE_TABLE_SERVICE")]
    table_service: Option<String>,

    /// Table-extraction timeout in seconds
    #[arg(long, default_value_t = DEFAULT_EXTRACTION_TIMEOUT.as_secs())]
    table_timeout: u64,

    /// Request an AI-written summary of the comparison
    #[arg(long)]
    summarize: bool,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Generative model used for the summary
    #[arg(long)]
    model: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args)]
struct InspectArgs {
    path: PathBuf,

    /// Input format (jtl, csv, json, html, pdf); guessed from the extension
    /// when omitted
    #[arg(long)]
    format: Option<String>,

    #[arg(long, env = "PERFCOMPARE_TABLE_SERVICE")]
    table_service: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Html,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Compare(args) => compare(args).await,
        Command::Inspect(args) => inspect(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("perfcompare={level},perfcompare_core={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn table_extractor(endpoint: &str, timeout: Duration) -> Result<HttpTableExtractor> {
    HttpTableExtractor::builder()
        .endpoint(endpoint)
        .timeout(timeout)
        .build()
        .context("building table-extraction client")
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

async fn compare(args: CompareArgs) -> Result<()> {
    let timeout = Duration::from_secs(args.table_timeout);
    match args.table_service.clone() {
        Some(endpoint) => {
            let extractor = table_extractor(&endpoint, timeout)?;
            compare_with(args, &extractor).await
        }
        None => compare_with(args, &DisabledTableExtractor).await,
    }
}

async fn compare_with<E: TableExtractor>(args: CompareArgs, extractor: &E) -> Result<()> {
    let splunk_format = match &args.splunk_format {
        Some(f) => f.clone(),
        None => ReportFormat::from_path(&args.baseline_splunk)
            .map(|f| f.as_str().to_string())
            .with_context(|| {
                format!(
                    "cannot infer Splunk format from {}; pass --splunk-format",
                    args.baseline_splunk.display()
                )
            })?,
    };

    // The summarizer is configured up front so a missing key fails before
    // any parsing work.
    let summarizer = if args.summarize {
        let mut config = SummarizerConfig::new(args.api_key.clone().unwrap_or_default());
        if let Some(model) = &args.model {
            config = config.model(model.as_str());
        }
        Some(GeminiSummarizer::new(config)?)
    } else {
        None
    };

    let request = ComparisonRequest {
        baseline_jtl: args.baseline_jtl,
        latest_jtl: args.latest_jtl,
        baseline_splunk: args.baseline_splunk,
        latest_splunk: args.latest_splunk,
        splunk_format,
    };

    let outcome = run_comparison(&request, extractor).await?;

    let summary = match &summarizer {
        Some(s) => Some(summarize_outcome(&outcome, s).await?),
        None => None,
    };

    let rendered = match args.output {
        OutputFormat::Text => render_text(&outcome, summary.as_deref()),
        OutputFormat::Json => export_json(&outcome, summary.as_deref())?,
        OutputFormat::Html => export_html(&outcome, summary.as_deref()),
    };

    write_output(args.out.as_deref(), &rendered).await
}

async fn write_output(out: Option<&Path>, rendered: &str) -> Result<()> {
    match out {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("writing report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

async fn inspect(args: InspectArgs) -> Result<()> {
    match args.table_service.clone() {
        Some(endpoint) => {
            let extractor = table_extractor(&endpoint, DEFAULT_EXTRACTION_TIMEOUT)?;
            inspect_with(args, &extractor).await
        }
        None => inspect_with(args, &DisabledTableExtractor).await,
    }
}

async fn inspect_with<E: TableExtractor>(args: InspectArgs, extractor: &E) -> Result<()> {
    let summary = describe_file(&args, extractor).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Parse one input file and summarise what was extracted.
async fn describe_file<E: TableExtractor>(
    args: &InspectArgs,
    extractor: &E,
) -> Result<serde_json::Value> {
    ensure_readable(&args.path, "Input").await?;

    let hint = match &args.format {
        Some(f) => f.trim().trim_start_matches('.').to_ascii_lowercase(),
        None => args
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .with_context(|| format!("{} has no extension; pass --format", args.path.display()))?,
    };

    let (rows, raw_len, warnings) = if hint == "jtl" {
        (Some(parse_jtl(&args.path).await?), 0, Vec::new())
    } else {
        if ReportFormat::from_hint(&hint).is_none() {
            bail!("unsupported format '{hint}' (expected jtl, csv, json, html or pdf)");
        }
        let report = parse_report(&args.path, &hint, extractor).await?;
        (report.rows, report.raw_text.chars().count(), report.warnings)
    };

    Ok(serde_json::json!({
        "path": args.path.display().to_string(),
        "format": hint,
        "rows": rows.as_ref().map_or(0, Vec::len),
        "columns": rows.as_deref().map(column_names).unwrap_or_default(),
        "rawTextChars": raw_len,
        "warnings": warnings,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
