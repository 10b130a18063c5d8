//! Python adapter.

use tree_sitter::Node;

use crate::analysis::adapter::{
    last_segment, name_field, no_exports, no_receiver, text, LanguageAdapter, NodeKinds,
};
use crate::analysis::{HandlerKind, ImportSpec};
use crate::graph::index::{join, parent_dir};
use crate::graph::FileIndex;

/// Exception types that catch everything.
const CATCH_ALL_TYPES: &[&str] = &["Exception", "BaseException"];

pub fn adapter() -> LanguageAdapter {
    LanguageAdapter {
        tag: "python",
        extensions: &["py", "pyi"],
        interpreters: &["python", "python2", "python3"],
        grammar: || tree_sitter_python::LANGUAGE.into(),
        kinds: NodeKinds {
            functions: &["function_definition"],
            types: &["class_definition"],
            containers: &[],
            signatures: &[],
            fields: &["assignment"],
            imports: &["import_statement", "import_from_statement"],
            exports: &[],
            handlers: &["except_clause"],
            nesting: &["if_statement", "for_statement", "while_statement", "match_statement"],
            else_wrappers: &[],
        },
        name: name_field,
        parameters,
        receiver: no_receiver,
        handler,
        imports,
        exports: no_exports,
        docstring: Some(has_docstring),
        field_names: None,
        resolve,
    }
}

fn parameters(node: Node, source: &[u8]) -> usize {
    let Some(params) = node.child_by_field_name("parameters") else {
        return 0;
    };
    let mut cursor = params.walk();
    let names: Vec<Node> = params
        .named_children(&mut cursor)
        .filter(|p| {
            !p.is_extra() && !matches!(p.kind(), "keyword_separator" | "positional_separator")
        })
        .collect();

    // `self` / `cls` are receivers, not parameters.
    let skip_first = names
        .first()
        .map(|p| matches!(param_name(*p, source), "self" | "cls"))
        .unwrap_or(false);
    names.len() - usize::from(skip_first)
}

fn param_name<'a>(param: Node, source: &'a [u8]) -> &'a str {
    if param.kind() == "identifier" {
        return text(param, source);
    }
    let mut cursor = param.walk();
    let first = param
        .named_children(&mut cursor)
        .find(|c| c.kind() == "identifier")
        .map(|c| text(c, source))
        .unwrap_or("");
    first
}

fn handler(node: Node, source: &[u8]) -> Option<HandlerKind> {
    let mut cursor = node.walk();
    let clause = node
        .named_children(&mut cursor)
        .find(|c| !c.is_extra() && c.kind() != "block" && !c.kind().ends_with("_statement"));

    // bare `except:`
    let Some(mut clause) = clause else {
        return Some(HandlerKind::CatchAll);
    };
    if clause.kind() == "as_pattern" {
        if let Some(inner) = clause.named_child(0) {
            clause = inner;
        }
    }

    let caught = text(clause, source).trim_matches(|c| c == '(' || c == ')');
    let catch_all = caught
        .split(',')
        .map(last_segment)
        .any(|name| CATCH_ALL_TYPES.contains(&name));

    Some(if catch_all {
        HandlerKind::CatchAll
    } else {
        HandlerKind::Specific
    })
}

fn imports(node: Node, source: &[u8]) -> Vec<ImportSpec> {
    let mut cursor = node.walk();
    match node.kind() {
        "import_statement" => node
            .children_by_field_name("name", &mut cursor)
            .filter_map(|n| dotted_with_alias(n, source))
            .map(|(module, alias)| ImportSpec::new(module, false).with_alias(alias))
            .collect(),
        "import_from_statement" => {
            let Some(module) = node.child_by_field_name("module_name") else {
                return Vec::new();
            };
            let raw = text(module, source).to_string();
            let names = node
                .children_by_field_name("name", &mut cursor)
                .filter_map(|n| dotted_with_alias(n, source))
                .map(|(name, _)| name)
                .collect();
            let relative = raw.starts_with('.');
            vec![ImportSpec::new(raw, relative).with_names(names)]
        }
        _ => Vec::new(),
    }
}

fn dotted_with_alias(node: Node, source: &[u8]) -> Option<(String, Option<String>)> {
    match node.kind() {
        "aliased_import" => {
            let name = node.child_by_field_name("name")?;
            let alias = node
                .child_by_field_name("alias")
                .map(|a| text(a, source).to_string());
            Some((text(name, source).to_string(), alias))
        }
        _ => Some((text(node, source).to_string(), None)),
    }
}

fn has_docstring(node: Node, source: &[u8]) -> bool {
    let Some(body) = node.child_by_field_name("body") else {
        return true; // nothing to document
    };
    let mut cursor = body.walk();
    let first = body.named_children(&mut cursor).find(|c| !c.is_extra());
    match first {
        Some(stmt) if stmt.kind() == "expression_statement" => stmt
            .named_child(0)
            .map(|expr| expr.kind() == "string" || text(expr, source).starts_with("\"\"\""))
            .unwrap_or(false),
        _ => false,
    }
}

fn module_file(index: &FileIndex, base: &str) -> Option<usize> {
    if base.is_empty() {
        return index.lookup("__init__.py");
    }
    index.first_of([
        format!("{}.py", base),
        format!("{}.pyi", base),
        format!("{}/__init__.py", base),
    ])
}

fn resolve(spec: &ImportSpec, from: &str, index: &FileIndex) -> Option<usize> {
    let names: Vec<&str> = spec
        .names
        .iter()
        .map(String::as_str)
        .filter(|n| *n != "*")
        .collect();

    if spec.relative {
        let dots = spec.raw.chars().take_while(|c| *c == '.').count();
        let rest = spec.raw[dots..].replace('.', "/");
        let mut base = parent_dir(from).to_string();
        for _ in 1..dots {
            base = join(&base, "..")?;
        }
        let module_dir = join(&base, &rest)?;
        return names
            .iter()
            .find_map(|name| module_file(index, &join(&module_dir, name)?))
            .or_else(|| module_file(index, &module_dir));
    }

    let module = spec.raw.replace('.', "/");
    names
        .iter()
        .find_map(|name| module_file(index, &format!("{}/{}", module, name)))
        .or_else(|| module_file(index, &module))
        .or_else(|| index.find_suffix(&format!("{}.py", module)))
        .or_else(|| index.find_suffix(&format!("{}/__init__.py", module)))
}

#[cfg(test)]
mod tests {
    use crate::analysis::{extract_source, SymbolKind};

    use super::*;

    fn extract(source: &str) -> crate::analysis::SourceFile {
        extract_source(&adapter(), "mod.py", source.as_bytes(), None)
    }

    #[test]
    fn test_parameters_skip_self() {
        let file = extract(
            r#"
class Repo:
    def get(self, key, default=None, *args, **kwargs):
        return key

def free(a, b: int, *, c=1):
    return a
"#,
        );
        let get = file.symbols.iter().find(|s| s.name == "get").unwrap();
        assert_eq!(get.kind, SymbolKind::Method);
        assert_eq!(get.function().unwrap().parameters, 4);
        let free = file.symbols.iter().find(|s| s.name == "free").unwrap();
        assert_eq!(free.kind, SymbolKind::Function);
        assert_eq!(free.function().unwrap().parameters, 3);
    }

    #[test]
    fn test_catch_all_handlers() {
        let file = extract(
            r#"
def risky():
    try:
        work()
    except ValueError:
        pass
    try:
        work()
    except Exception as exc:
        log(exc)
    try:
        work()
    except:
        pass
    try:
        work()
    except (KeyError, BaseException):
        pass
"#,
        );
        let risky = file.symbols.iter().find(|s| s.name == "risky").unwrap();
        let facts = risky.function().unwrap();
        assert_eq!(facts.handlers.len(), 4);
        assert_eq!(facts.catch_all_count(), 3);
    }

    #[test]
    fn test_imports() {
        let file = extract(
            r#"
import os
import numpy as np
from collections import OrderedDict
from . import sibling
from ..pkg.mod import thing
"#,
        );
        let imports: Vec<_> = file.imports().collect();
        assert_eq!(imports.len(), 5);
        assert_eq!(imports[1].alias.as_deref(), Some("np"));
        assert_eq!(imports[2].names, vec!["OrderedDict".to_string()]);
        assert!(imports[3].relative);
        assert_eq!(imports[4].raw, "..pkg.mod");
    }

    #[test]
    fn test_class_methods_and_fields() {
        let file = extract(
            r#"
class Config:
    """Settings."""
    name = "x"
    size = 3

    def load(self):
        self.cache = {}

    @property
    def value(self):
        return 1
"#,
        );
        let config = file.types().next().unwrap();
        let facts = config.type_facts().unwrap();
        assert_eq!(facts.methods, 2);
        assert_eq!(facts.fields, 2);
        assert_eq!(facts.documented, Some(true));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let index = FileIndex::new(&["app/__init__.py", "app/models.py", "app/views.py", "main.py"]);
        let rel = ImportSpec::new(".", true).with_names(vec!["models".to_string()]);
        assert_eq!(resolve(&rel, "app/views.py", &index), Some(1));

        let abs = ImportSpec::new("app.models", false);
        assert_eq!(resolve(&abs, "main.py", &index), Some(1));

        let pkg = ImportSpec::new("app", false).with_names(vec!["views".to_string()]);
        assert_eq!(resolve(&pkg, "main.py", &index), Some(2));

        let external = ImportSpec::new("requests", false);
        assert_eq!(resolve(&external, "main.py", &index), None);
    }
}
