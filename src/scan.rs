//! Scan orchestration.
//!
//! Stages run strictly one after another, each reading the previous stage's
//! finished output: snapshot, discovery, parallel extraction, graph build,
//! parallel detection, compilation.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;
use tracing::info;

use crate::analysis::{extract_file, SourceFile};
use crate::config::Settings;
use crate::detect::Runner;
use crate::discover::{discover, Candidate, SkippedFile};
use crate::error::ConfigError;
use crate::graph::DependencyGraph;
use crate::report::{Report, ReportParts};
use crate::snapshot::Snapshot;

/// One scan of one project root.
pub struct Scanner<'a> {
    root: PathBuf,
    settings: &'a Settings,
    snapshot: Option<Snapshot>,
}

impl<'a> Scanner<'a> {
    pub fn new<P: AsRef<Path>>(root: P, settings: &'a Settings) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            settings,
            snapshot: None,
        }
    }

    /// Use a fixed repository marker instead of asking git.
    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn run(self) -> anyhow::Result<Report> {
        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("cannot read project root {}", self.root.display()))?;
        if !root.is_dir() {
            return Err(ConfigError::InvalidRoot(root.display().to_string()).into());
        }

        // Captured before any file is read so the report describes one state.
        let snapshot = self.snapshot.unwrap_or_else(|| Snapshot::capture(&root));

        let discovery = discover(&root, self.settings);
        info!(
            candidates = discovery.candidates.len(),
            skipped = discovery.skipped.len(),
            "files discovered"
        );

        let (files, skipped) = extract_all(&discovery.candidates, self.settings);
        let mut skipped: Vec<SkippedFile> = discovery.skipped.into_iter().chain(skipped).collect();
        skipped.sort_by(|a, b| a.path.cmp(&b.path));
        info!(
            files = files.len(),
            unparsed = files.iter().filter(|f| !f.is_parsed()).count(),
            "files extracted"
        );

        let graph = DependencyGraph::build(&files);
        info!(
            edges = graph.edges().len(),
            external = graph.external().len(),
            cycles = graph.cycles().len(),
            "dependency graph built"
        );

        let findings = Runner::new(self.settings).run(&files, &graph);
        info!(findings = findings.len(), "smells detected");

        let files = graph.annotate(files);
        Ok(Report::compile(ReportParts {
            root: root.display().to_string(),
            snapshot,
            thresholds: self.settings.thresholds,
            files,
            skipped,
            unsupported: discovery.unsupported,
            external_dependencies: graph.external().to_vec(),
            edges: graph.edges().to_vec(),
            cycles: graph.cycles().to_vec(),
            findings,
        }))
    }
}

/// Extract every candidate in parallel, then restore path order.
fn extract_all(candidates: &[Candidate], settings: &Settings) -> (Vec<SourceFile>, Vec<SkippedFile>) {
    let results: Vec<_> = candidates
        .par_iter()
        .map(|candidate| extract_file(candidate, settings.max_file_bytes, settings.parse_timeout))
        .collect();

    let mut files = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for result in results {
        match result {
            Ok(file) => files.push(file),
            Err(e) => skipped.push(SkippedFile::from(&e)),
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    (files, skipped)
}
