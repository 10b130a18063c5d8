//! Report model and output formatting.
//!
//! Supports three output formats:
//! - JSON: the full report for programmatic consumers
//! - Markdown: a structural map plus findings, for narrative tooling
//! - Pretty: colored terminal output for human readability

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::*;
use serde::{Deserialize, Serialize};

use crate::analysis::{FileStatus, SourceFile, Symbol, SymbolKind};
use crate::config::Thresholds;
use crate::detect::{Severity, SmellFinding, SmellKind};
use crate::discover::SkippedFile;
use crate::graph::{Cycle, DependencyEdge, ExternalDependency};
use crate::snapshot::Snapshot;

/// Findings listed per kind in markdown before the rest are summarized.
const MARKDOWN_FINDINGS_PER_KIND: usize = 15;
/// Symbol names listed per file in the markdown structural map.
const MARKDOWN_SYMBOLS_PER_FILE: usize = 12;
/// Import specifiers listed per file in the markdown structural map.
const MARKDOWN_IMPORTS_PER_FILE: usize = 8;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Pretty,
}

/// Per-kind symbol totals for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolCounts {
    pub functions: usize,
    pub methods: usize,
    pub types: usize,
    pub imports: usize,
    pub exports: usize,
}

impl SymbolCounts {
    fn of(file: &SourceFile) -> Self {
        Self {
            functions: file.count(SymbolKind::Function),
            methods: file.count(SymbolKind::Method),
            types: file.count(SymbolKind::Type),
            imports: file.count(SymbolKind::Import),
            exports: file.count(SymbolKind::Export),
        }
    }
}

/// One file of the structural map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub path: String,
    pub language: String,
    pub lines: usize,
    #[serde(flatten)]
    pub status: FileStatus,
    pub counts: SymbolCounts,
    pub symbols: Vec<Symbol>,
}

impl From<&SourceFile> for FileSummary {
    fn from(file: &SourceFile) -> Self {
        Self {
            path: file.path.clone(),
            language: file.language.clone(),
            lines: file.line_count,
            status: file.status.clone(),
            counts: SymbolCounts::of(file),
            symbols: file.symbols.clone(),
        }
    }
}

impl FileSummary {
    pub fn is_parsed(&self) -> bool {
        self.status == FileStatus::Parsed
    }
}

/// Totals over the whole report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub files: usize,
    pub unparsed: usize,
    pub skipped: usize,
    pub unsupported: usize,
    pub cycles: usize,
    pub findings: usize,
    /// Finding counts keyed by severity name.
    pub by_severity: BTreeMap<String, usize>,
    /// Finding counts keyed by smell kind.
    pub by_kind: BTreeMap<String, usize>,
}

/// The compiled result of one scan.
///
/// Files are sorted by path; findings follow [`SmellFinding::report_order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub version: String,
    pub root: String,
    pub snapshot: Snapshot,
    pub thresholds: Thresholds,
    pub files: Vec<FileSummary>,
    pub skipped: Vec<SkippedFile>,
    /// Files no adapter handles, per extension.
    pub unsupported: BTreeMap<String, usize>,
    pub external_dependencies: Vec<ExternalDependency>,
    pub edges: Vec<DependencyEdge>,
    pub cycles: Vec<Cycle>,
    pub findings: Vec<SmellFinding>,
    pub summary: Summary,
}

/// Inputs for [`Report::compile`], gathered by the scan stages.
pub struct ReportParts {
    pub root: String,
    pub snapshot: Snapshot,
    pub thresholds: Thresholds,
    pub files: Vec<SourceFile>,
    pub skipped: Vec<SkippedFile>,
    pub unsupported: BTreeMap<String, usize>,
    pub external_dependencies: Vec<ExternalDependency>,
    pub edges: Vec<DependencyEdge>,
    pub cycles: Vec<Cycle>,
    pub findings: Vec<SmellFinding>,
}

impl Report {
    /// Merge the stage outputs into one report and tally the summary.
    pub fn compile(parts: ReportParts) -> Self {
        let mut by_severity = BTreeMap::new();
        let mut by_kind = BTreeMap::new();
        for finding in &parts.findings {
            *by_severity.entry(finding.severity.to_string()).or_insert(0) += 1;
            *by_kind.entry(finding.kind.to_string()).or_insert(0) += 1;
        }

        let summary = Summary {
            files: parts.files.len(),
            unparsed: parts.files.iter().filter(|f| !f.is_parsed()).count(),
            skipped: parts.skipped.len(),
            unsupported: parts.unsupported.values().sum(),
            cycles: parts.cycles.len(),
            findings: parts.findings.len(),
            by_severity,
            by_kind,
        };

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            root: parts.root,
            snapshot: parts.snapshot,
            thresholds: parts.thresholds,
            files: parts.files.iter().map(FileSummary::from).collect(),
            skipped: parts.skipped,
            unsupported: parts.unsupported,
            external_dependencies: parts.external_dependencies,
            edges: parts.edges,
            cycles: parts.cycles,
            findings: parts.findings,
            summary,
        }
    }

    /// Highest severity among the findings.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    /// Whether any finding is at or above `severity`.
    pub fn has_findings_at(&self, severity: Severity) -> bool {
        self.findings.iter().any(|f| f.severity >= severity)
    }

    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        match format {
            OutputFormat::Json => render_json(self),
            OutputFormat::Markdown => Ok(render_markdown(self)),
            OutputFormat::Pretty => Ok(render_pretty(self)),
        }
    }
}

/// Write one rendered artifact, creating or truncating `path`.
pub fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

// =============================================================================
// JSON Format
// =============================================================================

pub fn render_json(report: &Report) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

// =============================================================================
// Markdown Format
// =============================================================================

/// Top-level directory of a project path, `.` for root files.
fn top_level(path: &str) -> &str {
    match path.split_once('/') {
        Some((dir, _)) => dir,
        None => ".",
    }
}

fn symbol_label(symbol: &Symbol) -> String {
    match symbol.kind {
        SymbolKind::Type => format!("{} (type)", symbol.name),
        SymbolKind::Method => format!("{}()", symbol.qualified_name()),
        _ => format!("{}()", symbol.name),
    }
}

fn capped(items: &[String], cap: usize) -> String {
    let mut out = items
        .iter()
        .take(cap)
        .map(|s| format!("`{}`", s))
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > cap {
        let _ = write!(out, ", and {} more", items.len() - cap);
    }
    out
}

pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Structural map: {}", report.root);
    let _ = writeln!(out);
    let _ = writeln!(out, "Snapshot: `{}`", report.snapshot);
    let _ = writeln!(out);

    let s = &report.summary;
    let _ = writeln!(out, "| Files | Unparsed | Skipped | Unsupported | Cycles | Findings |");
    let _ = writeln!(out, "|---|---|---|---|---|---|");
    let _ = writeln!(
        out,
        "| {} | {} | {} | {} | {} | {} |",
        s.files, s.unparsed, s.skipped, s.unsupported, s.cycles, s.findings
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Structure");
    let mut groups: BTreeMap<&str, Vec<&FileSummary>> = BTreeMap::new();
    for file in &report.files {
        groups.entry(top_level(&file.path)).or_default().push(file);
    }
    for (dir, files) in &groups {
        let _ = writeln!(out);
        let _ = writeln!(out, "### `{}`", dir);
        let _ = writeln!(out);
        for file in files {
            write_markdown_file(&mut out, file);
        }
    }

    if !report.cycles.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Import cycles");
        let _ = writeln!(out);
        for (i, cycle) in report.cycles.iter().enumerate() {
            let first = cycle.files.first().map(String::as_str).unwrap_or_default();
            let _ = writeln!(out, "{}. {} -> {}", i + 1, cycle.files.join(" -> "), first);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Findings");
    if report.findings.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "No findings.");
    }
    for severity in Severity::ALL {
        let findings: Vec<&SmellFinding> = report
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect();
        if findings.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "### {} ({})", capitalize(severity.as_str()), findings.len());
        for kind in SmellKind::ALL {
            let of_kind: Vec<&&SmellFinding> = findings.iter().filter(|f| f.kind == kind).collect();
            if of_kind.is_empty() {
                continue;
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "#### {} ({})", kind.title(), of_kind.len());
            let _ = writeln!(out);
            for finding in of_kind.iter().take(MARKDOWN_FINDINGS_PER_KIND) {
                let _ = writeln!(out, "- `{}`: {}", finding.location(), finding.message);
            }
            if of_kind.len() > MARKDOWN_FINDINGS_PER_KIND {
                let _ = writeln!(
                    out,
                    "- and {} more",
                    of_kind.len() - MARKDOWN_FINDINGS_PER_KIND
                );
            }
        }
    }

    if !report.skipped.is_empty() || !report.unsupported.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Not analyzed");
        let _ = writeln!(out);
        for skipped in &report.skipped {
            let _ = writeln!(out, "- `{}`: {}", skipped.path, skipped.reason);
        }
        for (ext, count) in &report.unsupported {
            let _ = writeln!(out, "- {} file(s) with extension `{}`", count, ext);
        }
    }

    out
}

fn write_markdown_file(out: &mut String, file: &FileSummary) {
    let _ = write!(out, "- `{}` ({}, {} lines)", file.path, file.language, file.lines);
    if let FileStatus::Unparsed { reason } = &file.status {
        let _ = writeln!(out, ": **unparsed**, {}", reason);
        return;
    }
    let _ = writeln!(out);

    let symbols: Vec<String> = file
        .symbols
        .iter()
        .filter(|s| matches!(s.kind, SymbolKind::Type | SymbolKind::Function | SymbolKind::Method))
        .map(symbol_label)
        .collect();
    if !symbols.is_empty() {
        let _ = writeln!(out, "  - defines: {}", capped(&symbols, MARKDOWN_SYMBOLS_PER_FILE));
    }

    let imports: Vec<String> = file
        .symbols
        .iter()
        .filter_map(|s| s.import().map(|spec| spec.raw.clone()))
        .collect();
    if !imports.is_empty() {
        let _ = writeln!(out, "  - imports: {}", capped(&imports, MARKDOWN_IMPORTS_PER_FILE));
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Pretty Format
// =============================================================================

pub fn render_pretty(report: &Report) -> String {
    let mut out = String::new();

    // Header
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  {} v{}",
        "treemap".cyan().bold(),
        report.version
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}{}", "Scanning: ".dimmed(), report.root);
    let _ = writeln!(out, "  {}{}", "Snapshot: ".dimmed(), report.snapshot);
    let _ = writeln!(out);

    let s = &report.summary;
    let _ = writeln!(
        out,
        "  {} files, {} unparsed, {} skipped, {} unsupported, {} import edges",
        s.files,
        s.unparsed,
        s.skipped,
        s.unsupported,
        report.edges.len()
    );
    let _ = writeln!(out);

    let unparsed: Vec<&FileSummary> = report.files.iter().filter(|f| !f.is_parsed()).collect();
    if !unparsed.is_empty() {
        let _ = writeln!(out, "  {} ({}):", "Unparsed".yellow().bold(), unparsed.len());
        for file in unparsed {
            if let FileStatus::Unparsed { reason } = &file.status {
                let _ = writeln!(out, "    {}  {}", file.path.blue(), reason.dimmed());
            }
        }
        let _ = writeln!(out);
    }

    if report.findings.is_empty() {
        let _ = writeln!(out, "  {}", "✓ No findings".green());
        let _ = writeln!(out);
        return out;
    }

    let _ = writeln!(out, "  {} ({}):", "Findings".bold(), report.findings.len());
    let _ = writeln!(out);
    for finding in &report.findings {
        let _ = write!(out, "    {} ", severity_tag(finding.severity));
        let _ = write!(out, "  {:<20}", finding.kind.as_str().dimmed());
        let _ = write!(out, "{}", finding.file.blue());
        if let Some(line) = finding.line {
            let _ = write!(out, "{}", format!(":{}", line).dimmed());
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "            {}", finding.message);
        let _ = writeln!(out);
    }

    let _ = write!(out, "  ");
    for severity in Severity::ALL {
        let count = s.by_severity.get(severity.as_str()).copied().unwrap_or(0);
        let _ = write!(out, "{} {}  ", severity_tag(severity), count);
    }
    let _ = writeln!(out);
    out
}

fn severity_tag(severity: Severity) -> ColoredString {
    match severity {
        Severity::High => "HIGH".red(),
        Severity::Medium => "MED ".yellow(),
        Severity::Low => "LOW ".blue(),
    }
}
