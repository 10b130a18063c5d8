//! Missing docstrings on public Python functions and classes (opt-in).

use crate::analysis::{SourceFile, SymbolKind};
use crate::config::Settings;

use super::{SmellFinding, SmellKind};

fn is_public(name: &str) -> bool {
    !name.starts_with('_') && !name.starts_with("test_")
}

fn is_test_path(path: &str) -> bool {
    path.starts_with("tests/") || path.contains("/tests/")
}

pub fn detect_missing_docstrings(file: &SourceFile, _settings: &Settings) -> Vec<SmellFinding> {
    if is_test_path(&file.path) {
        return Vec::new();
    }
    file.symbols
        .iter()
        .filter(|s| is_public(&s.name))
        .filter_map(|symbol| {
            let documented = match symbol.kind {
                SymbolKind::Type => symbol.type_facts()?.documented,
                SymbolKind::Function | SymbolKind::Method => symbol.function()?.documented,
                _ => None,
            };
            (documented == Some(false)).then(|| {
                let name = symbol.qualified_name();
                SmellFinding::new(
                    SmellKind::MissingDocstring,
                    &file.path,
                    0,
                    0,
                    format!("public {} `{}` has no docstring", symbol.kind, name),
                )
                .with_severity(SmellKind::MissingDocstring.base_severity())
                .at(symbol.span.start_line)
                .on_symbol(name)
            })
        })
        .collect()
}
