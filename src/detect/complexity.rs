//! Complexity rules: deep nesting and long parameter lists.

use crate::analysis::SourceFile;
use crate::config::Settings;

use super::{SmellFinding, SmellKind};

/// Flag functions whose control flow nests deeper than allowed.
///
/// Depth counts conditionals, loops and switches strictly inside the body;
/// `else if` chains stay at the depth of their first `if`.
pub fn detect_deep_nesting(file: &SourceFile, settings: &Settings) -> Vec<SmellFinding> {
    let threshold = settings.thresholds.nesting_depth;
    file.callables()
        .filter_map(|symbol| {
            let depth = symbol.function()?.max_nesting;
            (depth > threshold).then(|| {
                let name = symbol.qualified_name();
                SmellFinding::new(
                    SmellKind::DeepNesting,
                    &file.path,
                    depth,
                    threshold,
                    format!("`{}` nests {} levels deep, threshold {}", name, depth, threshold),
                )
                .at(symbol.span.start_line)
                .on_symbol(name)
            })
        })
        .collect()
}

/// Flag functions taking more parameters than allowed.
pub fn detect_excess_parameters(file: &SourceFile, settings: &Settings) -> Vec<SmellFinding> {
    let threshold = settings.thresholds.parameters;
    file.callables()
        .filter_map(|symbol| {
            let params = symbol.function()?.parameters;
            (params > threshold).then(|| {
                let name = symbol.qualified_name();
                SmellFinding::new(
                    SmellKind::ExcessParameters,
                    &file.path,
                    params,
                    threshold,
                    format!("`{}` takes {} parameters, threshold {}", name, params, threshold),
                )
                .at(symbol.span.start_line)
                .on_symbol(name)
            })
        })
        .collect()
}
