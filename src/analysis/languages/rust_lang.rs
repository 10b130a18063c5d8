//! Rust adapter.
//!
//! `impl` blocks are method containers: functions inside them are methods of
//! the implemented type, attributed back to the struct/enum/trait declared in
//! the same file. `match` arms catching every `Err` are the catch-all idiom.

use tree_sitter::Node;

use crate::analysis::adapter::{
    count_parameters, field_text, name_field, no_receiver, text, LanguageAdapter, NodeKinds,
};
use crate::analysis::{HandlerKind, ImportSpec};
use crate::graph::index::{file_name, join, parent_dir};
use crate::graph::FileIndex;

pub fn adapter() -> LanguageAdapter {
    LanguageAdapter {
        tag: "rust",
        extensions: &["rs"],
        interpreters: &[],
        grammar: || tree_sitter_rust::LANGUAGE.into(),
        kinds: NodeKinds {
            functions: &["function_item"],
            types: &["struct_item", "enum_item", "union_item", "trait_item"],
            containers: &["impl_item"],
            signatures: &["function_signature_item"],
            fields: &["field_declaration", "enum_variant"],
            imports: &["use_declaration"],
            exports: &["use_declaration"],
            handlers: &["match_arm"],
            nesting: &[
                "if_expression",
                "while_expression",
                "loop_expression",
                "for_expression",
                "match_expression",
            ],
            else_wrappers: &["else_clause"],
        },
        name,
        parameters,
        receiver: no_receiver,
        handler,
        imports,
        exports,
        docstring: None,
        field_names: None,
        resolve,
    }
}

/// Bare type name (`store::Cache<K, V>` -> `Cache`).
fn strip_generics(name: &str) -> String {
    let name = name.split('<').next().unwrap_or(name).trim();
    name.rsplit("::").next().unwrap_or(name).to_string()
}

fn name(node: Node, source: &[u8]) -> Option<String> {
    if node.kind() == "impl_item" {
        return field_text(node, "type", source).map(|t| strip_generics(&t));
    }
    name_field(node, source)
}

fn parameters(node: Node, _source: &[u8]) -> usize {
    count_parameters(node, &["self_parameter", "attribute_item"])
}

fn handler(node: Node, source: &[u8]) -> Option<HandlerKind> {
    let pattern = node.child_by_field_name("pattern")?;
    let pattern = text(pattern, source).trim();
    let inner = pattern.strip_prefix("Err(")?.strip_suffix(')')?.trim();

    let binds_anything = inner == "_"
        || inner == ".."
        || inner
            .strip_prefix("ref ")
            .unwrap_or(inner)
            .trim_start_matches("mut ")
            .chars()
            .all(|c| c == '_' || c.is_ascii_lowercase() || c.is_ascii_digit());
    Some(if binds_anything {
        HandlerKind::CatchAll
    } else {
        HandlerKind::Specific
    })
}

/// Flatten a use tree into `(path, alias)` leaves.
fn flatten_use(node: Node, prefix: &str, source: &[u8], out: &mut Vec<(String, Option<String>)>) {
    let join_path = |tail: &str| {
        if prefix.is_empty() {
            tail.to_string()
        } else {
            format!("{}::{}", prefix, tail)
        }
    };
    match node.kind() {
        "use_as_clause" => {
            if let Some(path) = node.child_by_field_name("path") {
                let alias = field_text(node, "alias", source);
                out.push((join_path(text(path, source)), alias));
            }
        }
        "scoped_use_list" => {
            let base = node
                .child_by_field_name("path")
                .map(|p| join_path(text(p, source)))
                .unwrap_or_else(|| prefix.to_string());
            if let Some(list) = node.child_by_field_name("list") {
                flatten_use(list, &base, source, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor).filter(|c| !c.is_extra()) {
                flatten_use(child, prefix, source, out);
            }
        }
        "use_wildcard" => {
            let path = node
                .named_child(0)
                .map(|p| format!("{}::*", text(p, source)))
                .unwrap_or_else(|| "*".to_string());
            out.push((join_path(&path), None));
        }
        _ => out.push((join_path(text(node, source)), None)),
    }
}

fn use_leaves(node: Node, source: &[u8]) -> Vec<(String, Option<String>)> {
    let mut leaves = Vec::new();
    if let Some(argument) = node.child_by_field_name("argument") {
        flatten_use(argument, "", source, &mut leaves);
    }
    leaves
}

fn is_relative(path: &str) -> bool {
    let head = path.split("::").next().unwrap_or("");
    matches!(head, "crate" | "self" | "super")
}

fn imports(node: Node, source: &[u8]) -> Vec<ImportSpec> {
    use_leaves(node, source)
        .into_iter()
        .map(|(path, alias)| {
            let relative = is_relative(&path);
            ImportSpec::new(path, relative).with_alias(alias)
        })
        .collect()
}

/// `pub use` re-exports.
fn exports(node: Node, source: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    let public = node
        .children(&mut cursor)
        .any(|c| c.kind() == "visibility_modifier");
    if !public {
        return Vec::new();
    }
    use_leaves(node, source)
        .into_iter()
        .map(|(path, alias)| alias.unwrap_or_else(|| path.rsplit("::").next().unwrap_or("").to_string()))
        .collect()
}

/// Directory holding the child modules of the module defined by `path`.
fn module_dir(path: &str) -> String {
    let dir = parent_dir(path);
    match file_name(path) {
        "mod.rs" | "lib.rs" | "main.rs" => dir.to_string(),
        name => {
            let stem = name.strip_suffix(".rs").unwrap_or(name);
            if dir.is_empty() {
                stem.to_string()
            } else {
                format!("{}/{}", dir, stem)
            }
        }
    }
}

/// Nearest ancestor directory holding a crate root file.
fn crate_root(from: &str, index: &FileIndex) -> Option<String> {
    let mut dir = parent_dir(from).to_string();
    loop {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };
        if index
            .first_of([format!("{}lib.rs", prefix), format!("{}main.rs", prefix)])
            .is_some()
        {
            return Some(dir);
        }
        if dir.is_empty() {
            return None;
        }
        dir = parent_dir(&dir).to_string();
    }
}

/// The file defining the module whose children live in `dir`.
fn module_file(dir: &str, crate_dir: Option<&str>, index: &FileIndex) -> Option<usize> {
    let prefix = if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir)
    };
    if Some(dir) == crate_dir {
        return index.first_of([format!("{}lib.rs", prefix), format!("{}main.rs", prefix)]);
    }
    index.first_of([format!("{}.rs", dir), format!("{}mod.rs", prefix)])
}

fn resolve(spec: &ImportSpec, from: &str, index: &FileIndex) -> Option<usize> {
    if !spec.relative {
        return None;
    }
    let crate_dir = crate_root(from, index);
    let mut segments = spec.raw.split("::").peekable();

    let mut base = match segments.peek().copied() {
        Some("crate") => {
            segments.next();
            crate_dir.clone()?
        }
        Some("self") => {
            segments.next();
            module_dir(from)
        }
        _ => module_dir(from),
    };
    while segments.peek() == Some(&"super") {
        segments.next();
        base = join(&base, "..")?;
    }

    let rest: Vec<&str> = segments.filter(|s| *s != "*" && !s.is_empty()).collect();
    let found = (1..=rest.len())
        .rev()
        .find_map(|n| module_file(&join(&base, &rest[..n].join("/"))?, None, index))
        .or_else(|| module_file(&base, crate_dir.as_deref(), index))?;
    // items of an inline `mod` resolve back to the importing file
    (Some(found) != index.lookup(from)).then_some(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{extract_source, SourceFile, SymbolKind};

    fn extract(source: &str) -> SourceFile {
        extract_source(&adapter(), "src/store.rs", source.as_bytes(), None)
    }

    #[test]
    fn test_impl_methods_attach_to_struct() {
        let file = extract(
            r#"
pub struct Store {
    items: Vec<String>,
    limit: usize,
}

impl Store {
    pub fn new(limit: usize) -> Self {
        Self { items: Vec::new(), limit }
    }

    pub fn push(&mut self, item: String) -> bool {
        if self.items.len() < self.limit {
            self.items.push(item);
            true
        } else {
            false
        }
    }
}

pub trait Backend {
    fn load(&self) -> Vec<String>;
    fn name(&self) -> &str { "memory" }
}
"#,
        );
        let store = file.types().find(|t| t.name == "Store").unwrap();
        assert_eq!(store.type_facts().unwrap().methods, 2);
        assert_eq!(store.type_facts().unwrap().fields, 2);

        let backend = file.types().find(|t| t.name == "Backend").unwrap();
        assert_eq!(backend.type_facts().unwrap().methods, 2);

        let push = file.symbols.iter().find(|s| s.name == "push").unwrap();
        assert_eq!(push.kind, SymbolKind::Method);
        assert_eq!(push.qualified_name(), "Store.push");
        assert_eq!(push.function().unwrap().parameters, 1);
        assert_eq!(push.function().unwrap().max_nesting, 1);
    }

    #[test]
    fn test_err_arms() {
        let file = extract(
            r#"
fn read() {
    match load() {
        Ok(v) => use_it(v),
        Err(_) => {}
    }
    match load() {
        Ok(v) => use_it(v),
        Err(Error::NotFound) => retry(),
        Err(e) => log(e),
    }
}
"#,
        );
        let read = file.callables().next().unwrap();
        let facts = read.function().unwrap();
        assert_eq!(facts.handlers.len(), 3);
        assert_eq!(facts.catch_all_count(), 2);
    }

    #[test]
    fn test_use_trees_and_reexports() {
        let file = extract(
            r#"
use std::collections::HashMap;
use crate::graph::{FileIndex, index::join};
use super::facts as f;
pub use self::report::Report;
"#,
        );
        let raws: Vec<_> = file.imports().map(|i| i.raw.as_str()).collect();
        assert_eq!(
            raws,
            vec![
                "std::collections::HashMap",
                "crate::graph::FileIndex",
                "crate::graph::index::join",
                "super::facts",
                "self::report::Report",
            ]
        );
        let exports: Vec<_> = file
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Export)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(exports, vec!["Report"]);
    }

    #[test]
    fn test_resolve_module_paths() {
        let index = FileIndex::new(&[
            "src/graph/index.rs",
            "src/graph/mod.rs",
            "src/lib.rs",
            "src/report.rs",
        ]);
        let spec = |raw: &str| ImportSpec::new(raw, true);
        assert_eq!(resolve(&spec("crate::graph::FileIndex"), "src/report.rs", &index), Some(1));
        assert_eq!(resolve(&spec("crate::graph::index::join"), "src/report.rs", &index), Some(0));
        assert_eq!(resolve(&spec("super::FileIndex"), "src/graph/index.rs", &index), Some(1));
        assert_eq!(resolve(&spec("self::index::join"), "src/graph/mod.rs", &index), Some(0));
        assert_eq!(resolve(&spec("crate::Settings"), "src/report.rs", &index), Some(2));
        assert_eq!(resolve(&spec("self::inline::Item"), "src/report.rs", &index), None);
        assert_eq!(resolve(&ImportSpec::new("serde::Serialize", false), "src/lib.rs", &index), None);
    }
}
