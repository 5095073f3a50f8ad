use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;
use tracing::info;

use crate::cli::config::{AppConfig, OutputFormat};
use crate::dom::{Document, PageSnapshot};
use crate::fill::{FillReport, PathFileSource, SessionOutcome};
use crate::report::console::{format_console_report, format_scan_summary};
use crate::resolver::{HttpResolver, Resolver, StaticResolver};
use crate::scan::{
    ActionDescriptor, FieldDescriptor, JobContext, ScanResult, Scanner, extract_job_context,
};
use crate::trace::TraceLogger;
use crate::{AutofillOptions, run_autofill};

/// What `scan` prints.
#[derive(Debug, Serialize)]
pub struct ScanOutput {
    pub fields: Vec<FieldDescriptor>,
    pub actions: Vec<ActionDescriptor>,
    pub job: JobContext,
}

// ============================================================================
// scan subcommand
// ============================================================================

pub fn cmd_scan(
    page: &Path,
    exclude: &[String],
    format: OutputFormat,
    config: &AppConfig,
) -> anyhow::Result<String> {
    let mut doc = load_page(page)?;
    let scanner = Scanner::from_config(&config.scan);

    let exclude: HashSet<String> = exclude.iter().cloned().collect();
    let fields = scanner.scan_excluding(&mut doc, &exclude);
    let output = ScanOutput {
        fields,
        actions: scanner.scan_actions(&doc),
        job: extract_job_context(&doc),
    };
    info!(fields = output.fields.len(), "scan complete");

    let rendered = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&output).context("serialize scan result")?
        }
        OutputFormat::Yaml => serde_yaml::to_string(&output).context("serialize scan result")?,
        OutputFormat::Text => format_scan_summary(&ScanResult {
            fields: output.fields,
            actions: output.actions,
        }),
    };
    Ok(rendered)
}

// ============================================================================
// fill / autofill subcommands
// ============================================================================

/// Fill from a fixed mapping file. Returns the report.
pub fn cmd_fill(
    page: &Path,
    mapping: &Path,
    config: &AppConfig,
    out: Option<&Path>,
    report: Option<&Path>,
    trace: Option<&Path>,
) -> anyhow::Result<FillReport> {
    let resolver = StaticResolver::from_file(mapping)
        .with_context(|| format!("load mapping {}", mapping.display()))?;
    run_fill(page, &resolver, config, out, report, trace)
}

/// Fill from the matching backend. Returns the report.
pub fn cmd_autofill(
    page: &Path,
    config: &AppConfig,
    out: Option<&Path>,
    report: Option<&Path>,
    trace: Option<&Path>,
) -> anyhow::Result<FillReport> {
    let resolver = HttpResolver::new(&config.resolver).context("build resolver client")?;
    info!(endpoint = resolver.endpoint(), "using matching backend");
    run_fill(page, &resolver, config, out, report, trace)
}

fn run_fill(
    page: &Path,
    resolver: &dyn Resolver,
    config: &AppConfig,
    out: Option<&Path>,
    report_path: Option<&Path>,
    trace: Option<&Path>,
) -> anyhow::Result<FillReport> {
    let mut doc = load_page(page)?;
    let scanner = Scanner::from_config(&config.scan);

    let cover_letter = match &config.fill.cover_letter {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("read cover letter {}", path.display()))?,
        ),
        None => None,
    };
    let files = PathFileSource::new(config.files.clone());
    let tracer = trace.map(TraceLogger::new);

    let options = AutofillOptions {
        fill: config.fill.clone(),
        cover_letter,
        files: if files.is_empty() { None } else { Some(&files) },
        tracer: tracer.as_ref(),
    };
    let SessionOutcome { report, .. } = run_autofill(&mut doc, &scanner, resolver, options)
        .with_context(|| format!("fill {}", page.display()))?;

    print!("{}", format_console_report(&report));

    if let Some(path) = out {
        doc.to_snapshot()
            .save(path)
            .with_context(|| format!("write snapshot {}", path.display()))?;
    }
    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report).context("serialize report")?;
        fs::write(path, json).with_context(|| format!("write report {}", path.display()))?;
    }

    Ok(report)
}

fn load_page(path: &Path) -> anyhow::Result<Document> {
    let snapshot =
        PageSnapshot::load(path).with_context(|| format!("load page {}", path.display()))?;
    Ok(Document::from_snapshot(&snapshot))
}
