//! Size rules: oversized types, overlong functions, oversized files.

use crate::analysis::SourceFile;
use crate::config::Settings;

use super::{SmellFinding, SmellKind};

/// Flag types with more direct methods than allowed.
pub fn detect_oversized_types(file: &SourceFile, settings: &Settings) -> Vec<SmellFinding> {
    let threshold = settings.thresholds.type_methods;
    file.types()
        .filter_map(|symbol| {
            let methods = symbol.type_facts()?.methods;
            (methods > threshold).then(|| {
                SmellFinding::new(
                    SmellKind::OversizedType,
                    &file.path,
                    methods,
                    threshold,
                    format!(
                        "type `{}` has {} methods, threshold {}",
                        symbol.name, methods, threshold
                    ),
                )
                .at(symbol.span.start_line)
                .on_symbol(symbol.name.as_str())
            })
        })
        .collect()
}

/// Flag functions and methods spanning more lines than allowed.
pub fn detect_overlong_functions(file: &SourceFile, settings: &Settings) -> Vec<SmellFinding> {
    let threshold = settings.thresholds.function_lines;
    file.callables()
        .filter_map(|symbol| {
            let lines = symbol.function()?.lines;
            (lines > threshold).then(|| {
                let name = symbol.qualified_name();
                SmellFinding::new(
                    SmellKind::OverlongFunction,
                    &file.path,
                    lines,
                    threshold,
                    format!("{} `{}` is {} lines long, threshold {}", symbol.kind, name, lines, threshold),
                )
                .at(symbol.span.start_line)
                .on_symbol(name)
            })
        })
        .collect()
}

/// Flag the file itself when it has more lines than allowed.
pub fn detect_oversized_file(file: &SourceFile, settings: &Settings) -> Option<SmellFinding> {
    let threshold = settings.thresholds.file_lines;
    (file.line_count > threshold).then(|| {
        SmellFinding::new(
            SmellKind::OversizedFile,
            &file.path,
            file.line_count,
            threshold,
            format!("file has {} lines, threshold {}", file.line_count, threshold),
        )
    })
}
