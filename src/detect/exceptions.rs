//! Overbroad exception handling.
//!
//! Any catch-all handler is a finding. Handlers are grouped per enclosing
//! function, and handlers outside every function are grouped per file.

use crate::analysis::{HandlerSpan, SourceFile};
use crate::config::Settings;

use super::{Severity, SmellFinding, SmellKind};

/// Catch-all handlers in one scope at which severity rises a level.
const REPEAT_CATCH_ALL: usize = 2;

pub fn detect_broad_exceptions(file: &SourceFile, _settings: &Settings) -> Vec<SmellFinding> {
    let mut findings: Vec<SmellFinding> = file
        .callables()
        .filter_map(|symbol| {
            let facts = symbol.function()?;
            let name = symbol.qualified_name();
            let message = |count| {
                format!("`{}` has {} catch-all exception handler{}", name, count, plural(count))
            };
            finding(file, &facts.handlers, message).map(|f| f.on_symbol(name.as_str()))
        })
        .collect();

    let toplevel = finding(file, &file.toplevel_handlers, |count| {
        format!("module level has {} catch-all exception handler{}", count, plural(count))
    });
    findings.extend(toplevel);
    findings
}

fn finding(
    file: &SourceFile,
    handlers: &[HandlerSpan],
    message: impl Fn(usize) -> String,
) -> Option<SmellFinding> {
    let catch_all: Vec<&HandlerSpan> = handlers.iter().filter(|h| h.is_catch_all()).collect();
    let first = catch_all.first()?;
    let count = catch_all.len();
    let severity = if count >= REPEAT_CATCH_ALL {
        Severity::Medium.raised(1)
    } else {
        Severity::Medium
    };
    Some(
        SmellFinding::new(SmellKind::BroadException, &file.path, count, 0, message(count))
            .with_severity(severity)
            .at(first.span.start_line),
    )
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
