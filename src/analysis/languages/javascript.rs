//! JavaScript adapter. The TypeScript adapters reuse its routines.

use tree_sitter::Node;

use crate::analysis::adapter::{
    any_descendant, field_text, name_field, no_receiver, text, unquote, LanguageAdapter, NodeKinds,
};
use crate::analysis::{HandlerKind, ImportSpec};
use crate::graph::index::{join, parent_dir};
use crate::graph::FileIndex;

pub(super) const FUNCTIONS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "generator_function",
    "arrow_function",
    "method_definition",
];

pub(super) const NESTING: &[&str] = &[
    "if_statement",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "switch_statement",
];

pub(super) const IMPORTS: &[&str] = &["import_statement", "export_statement", "call_expression"];

/// Extensions tried, in order, for an extensionless relative specifier.
const RESOLVE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts", ".js", ".jsx", ".mjs", ".cjs"];

pub fn adapter() -> LanguageAdapter {
    LanguageAdapter {
        tag: "javascript",
        extensions: &["js", "jsx", "mjs", "cjs"],
        interpreters: &["node", "nodejs"],
        grammar: || tree_sitter_javascript::LANGUAGE.into(),
        kinds: NodeKinds {
            functions: FUNCTIONS,
            types: &["class_declaration", "class"],
            containers: &[],
            signatures: &[],
            fields: &["field_definition"],
            imports: IMPORTS,
            exports: &["export_statement"],
            handlers: &["catch_clause"],
            nesting: NESTING,
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

/// Declared name, or the name of whatever binds an anonymous function.
pub(super) fn name(node: Node, source: &[u8]) -> Option<String> {
    if let Some(name) = name_field(node, source) {
        return Some(name);
    }
    let parent = node.parent()?;
    match parent.kind() {
        "variable_declarator" => field_text(parent, "name", source),
        "pair" => field_text(parent, "key", source),
        "assignment_expression" => field_text(parent, "left", source),
        "field_definition" => field_text(parent, "property", source),
        "public_field_definition" => field_text(parent, "name", source),
        _ => None,
    }
}

pub(super) fn parameters(node: Node, source: &[u8]) -> usize {
    // `x => x + 1`
    if node.child_by_field_name("parameter").is_some() {
        return 1;
    }
    let Some(params) = node.child_by_field_name("parameters") else {
        return 0;
    };
    let mut cursor = params.walk();
    let count = params
        .named_children(&mut cursor)
        .filter(|p| !p.is_extra())
        // TypeScript `this: Foo` annotates the receiver
        .filter(|p| {
            p.child_by_field_name("pattern")
                .map(|pat| text(pat, source) != "this")
                .unwrap_or(true)
        })
        .count();
    count
}

/// JavaScript has no typed `catch`; a handler is specific only when it
/// rethrows or narrows the error with `instanceof`.
pub(super) fn handler(node: Node, source: &[u8]) -> Option<HandlerKind> {
    let body = node.child_by_field_name("body")?;
    let narrows = any_descendant(body, &mut |n| match n.kind() {
        "throw_statement" => true,
        "binary_expression" => n
            .child_by_field_name("operator")
            .map(|op| text(op, source) == "instanceof")
            .unwrap_or(false),
        _ => false,
    });
    Some(if narrows {
        HandlerKind::Specific
    } else {
        HandlerKind::CatchAll
    })
}

fn is_relative(raw: &str) -> bool {
    raw == "." || raw == ".." || raw.starts_with("./") || raw.starts_with("../")
}

fn string_spec(node: Node, source: &[u8]) -> ImportSpec {
    let raw = unquote(text(node, source));
    let relative = is_relative(&raw);
    ImportSpec::new(raw, relative)
}

pub(super) fn imports(node: Node, source: &[u8]) -> Vec<ImportSpec> {
    match node.kind() {
        "import_statement" => {
            let Some(src) = node.child_by_field_name("source") else {
                return Vec::new();
            };
            let mut alias = None;
            let mut names = Vec::new();
            let mut cursor = node.walk();
            for clause in node
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "import_clause")
            {
                let mut inner = clause.walk();
                for part in clause.named_children(&mut inner) {
                    match part.kind() {
                        "identifier" => alias = Some(text(part, source).to_string()),
                        "namespace_import" => {
                            alias = part.named_child(0).map(|n| text(n, source).to_string())
                        }
                        "named_imports" => {
                            let mut specs = part.walk();
                            names.extend(
                                part.named_children(&mut specs)
                                    .filter_map(|s| field_text(s, "name", source)),
                            );
                        }
                        _ => {}
                    }
                }
            }
            vec![string_spec(src, source).with_alias(alias).with_names(names)]
        }
        // export { x } from './y'
        "export_statement" => node
            .child_by_field_name("source")
            .map(|src| vec![string_spec(src, source)])
            .unwrap_or_default(),
        // require('x') / import('x')
        "call_expression" => {
            let Some(function) = node.child_by_field_name("function") else {
                return Vec::new();
            };
            let is_loader = function.kind() == "import"
                || (function.kind() == "identifier" && text(function, source) == "require");
            if !is_loader {
                return Vec::new();
            }
            node.child_by_field_name("arguments")
                .and_then(|args| args.named_child(0))
                .filter(|arg| arg.kind() == "string")
                .map(|arg| vec![string_spec(arg, source)])
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

pub(super) fn exports(node: Node, source: &[u8]) -> Vec<String> {
    if let Some(decl) = node.child_by_field_name("declaration") {
        if matches!(decl.kind(), "lexical_declaration" | "variable_declaration") {
            let mut cursor = decl.walk();
            let names = decl
                .named_children(&mut cursor)
                .filter(|d| d.kind() == "variable_declarator")
                .filter_map(|d| field_text(d, "name", source))
                .collect();
            return names;
        }
        return vec![name_field(decl, source).unwrap_or_else(|| "default".to_string())];
    }
    if node.child_by_field_name("value").is_some() {
        return vec!["default".to_string()];
    }

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for clause in node
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "export_clause")
    {
        let mut inner = clause.walk();
        names.extend(
            clause
                .named_children(&mut inner)
                .filter(|s| s.kind() == "export_specifier")
                .filter_map(|s| {
                    field_text(s, "alias", source).or_else(|| field_text(s, "name", source))
                }),
        );
    }
    if names.is_empty() && node.child_by_field_name("source").is_some() {
        names.push("*".to_string());
    }
    names
}

pub(super) fn resolve(spec: &ImportSpec, from: &str, index: &FileIndex) -> Option<usize> {
    if !spec.relative {
        return None;
    }
    let base = join(parent_dir(from), &spec.raw)?;

    let mut candidates = vec![base.clone()];
    // ESM TypeScript imports name the emitted `.js` file
    for js_ext in [".js", ".jsx", ".mjs"] {
        if let Some(stem) = base.strip_suffix(js_ext) {
            candidates.push(format!("{}.ts", stem));
            candidates.push(format!("{}.tsx", stem));
        }
    }
    candidates.extend(RESOLVE_EXTENSIONS.iter().map(|ext| format!("{}{}", base, ext)));
    candidates.extend(
        RESOLVE_EXTENSIONS
            .iter()
            .map(|ext| format!("{}/index{}", base, ext)),
    );
    index.first_of(candidates)
}

#[cfg(test)]
mod tests {
    use crate::analysis::{extract_source, SourceFile, SymbolKind};

    use super::*;

    fn extract(source: &str) -> SourceFile {
        extract_source(&adapter(), "src/app.js", source.as_bytes(), None)
    }

    #[test]
    fn test_named_arrow_functions_and_methods() {
        let file = extract(
            r#"
const add = (a, b) => a + b;
const inc = x => x + 1;
function legacy(a, b, c) { return a; }

class Store {
  items = [];
  get(key) { return this.items[key]; }
  put(key, value) { this.items[key] = value; }
}
"#,
        );
        let add = file.symbols.iter().find(|s| s.name == "add").unwrap();
        assert_eq!(add.kind, SymbolKind::Function);
        assert_eq!(add.function().unwrap().parameters, 2);
        let inc = file.symbols.iter().find(|s| s.name == "inc").unwrap();
        assert_eq!(inc.function().unwrap().parameters, 1);

        let store = file.types().next().unwrap();
        assert_eq!(store.name, "Store");
        assert_eq!(store.type_facts().unwrap().methods, 2);
        assert_eq!(store.type_facts().unwrap().fields, 1);
        let put = file.symbols.iter().find(|s| s.name == "put").unwrap();
        assert_eq!(put.kind, SymbolKind::Method);
    }

    #[test]
    fn test_catch_clauses() {
        let file = extract(
            r#"
function load() {
  try { a(); } catch (e) { console.log(e); }
  try { b(); } catch (e) { if (e instanceof TypeError) { return; } }
  try { c(); } catch (e) { throw new Wrapped(e); }
}
"#,
        );
        let load = file.symbols.iter().find(|s| s.name == "load").unwrap();
        let facts = load.function().unwrap();
        assert_eq!(facts.handlers.len(), 3);
        assert_eq!(facts.catch_all_count(), 1);
    }

    #[test]
    fn test_imports_and_exports() {
        let file = extract(
            r#"
import React from 'react';
import * as util from './util';
import { a, b } from "../lib/ab.js";
const fs = require('fs');
export { helper } from './helper';
export function run() {}
export const x = 1, y = 2;
"#,
        );
        let imports: Vec<_> = file.imports().collect();
        let raws: Vec<_> = imports.iter().map(|i| i.raw.as_str()).collect();
        assert_eq!(raws, vec!["react", "./util", "../lib/ab.js", "fs", "./helper"]);
        assert_eq!(imports[1].alias.as_deref(), Some("util"));
        assert_eq!(imports[2].names, vec!["a".to_string(), "b".to_string()]);
        assert!(imports[1].relative && !imports[3].relative);

        let exports: Vec<_> = file
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Export)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(exports, vec!["helper", "run", "x", "y"]);
    }

    #[test]
    fn test_resolve() {
        let index = FileIndex::new(&["src/app.js", "src/lib/ab.ts", "src/util/index.js"]);
        let util = ImportSpec::new("./util", true);
        assert_eq!(resolve(&util, "src/app.js", &index), Some(2));
        let ab = ImportSpec::new("./lib/ab.js", true);
        assert_eq!(resolve(&ab, "src/app.js", &index), Some(1));
        let pkg = ImportSpec::new("react", false);
        assert_eq!(resolve(&pkg, "src/app.js", &index), None);
    }
}
