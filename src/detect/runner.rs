//! Detection runner that applies every active rule.

use rayon::prelude::*;
use tracing::debug;

use crate::analysis::SourceFile;
use crate::config::Settings;
use crate::graph::DependencyGraph;

use super::{
    detect_broad_exceptions, detect_deep_nesting, detect_excess_parameters,
    detect_import_cycles, detect_missing_docstrings, detect_overlong_functions,
    detect_oversized_file, detect_oversized_types, SmellFinding, SmellKind,
};

/// Applies the active rules of one [`Settings`] to extracted files.
pub struct Runner<'a> {
    settings: &'a Settings,
}

impl<'a> Runner<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Findings for every parsed file plus one per import cycle, in report order.
    pub fn run(&self, files: &[SourceFile], graph: &DependencyGraph) -> Vec<SmellFinding> {
        let mut findings: Vec<SmellFinding> = files
            .par_iter()
            .filter(|file| file.is_parsed())
            .flat_map_iter(|file| self.check_file(file))
            .collect();

        if self.settings.is_active(SmellKind::ImportCycle) {
            findings.extend(detect_import_cycles(graph));
        }

        findings.sort_by(SmellFinding::report_order);
        debug!(findings = findings.len(), "detection finished");
        findings
    }

    /// Findings of the file-scoped rules for one file.
    pub fn check_file(&self, file: &SourceFile) -> Vec<SmellFinding> {
        let settings = self.settings;
        let mut findings = Vec::new();

        if settings.is_active(SmellKind::OversizedType) {
            findings.extend(detect_oversized_types(file, settings));
        }
        if settings.is_active(SmellKind::OverlongFunction) {
            findings.extend(detect_overlong_functions(file, settings));
        }
        if settings.is_active(SmellKind::DeepNesting) {
            findings.extend(detect_deep_nesting(file, settings));
        }
        if settings.is_active(SmellKind::ExcessParameters) {
            findings.extend(detect_excess_parameters(file, settings));
        }
        if settings.is_active(SmellKind::OversizedFile) {
            findings.extend(detect_oversized_file(file, settings));
        }
        if settings.is_active(SmellKind::BroadException) {
            findings.extend(detect_broad_exceptions(file, settings));
        }
        if settings.is_active(SmellKind::MissingDocstring) {
            findings.extend(detect_missing_docstrings(file, settings));
        }

        findings
    }
}
