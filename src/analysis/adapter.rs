//! Language adapter records and the process-wide registry.
//!
//! An adapter is plain data plus function pointers: the grammar, the tables
//! saying which tree-sitter node kinds play which structural role, and the
//! small per-language routines for names, parameters, handlers, imports and
//! import resolution. Adding a language means adding one record in
//! `languages/` and listing it in `languages::all()`.

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Language, Node};

use super::facts::{HandlerKind, ImportSpec};
use super::languages;
use crate::graph::FileIndex;

/// Which node kinds play which structural role in a grammar.
#[derive(Debug, Clone, Copy)]
pub struct NodeKinds {
    /// Function-like nodes (functions, methods, constructors, lambdas bound to names).
    pub functions: &'static [&'static str],
    /// Type-like nodes (classes, structs, interfaces, modules).
    pub types: &'static [&'static str],
    /// Nodes that hold methods for a type declared elsewhere (Rust `impl`).
    pub containers: &'static [&'static str],
    /// Body-less method declarations that still count toward a type's methods.
    pub signatures: &'static [&'static str],
    /// Field declarations counted on the nearest enclosing type.
    pub fields: &'static [&'static str],
    /// Nodes that may carry import specifiers.
    pub imports: &'static [&'static str],
    /// Nodes that may export names.
    pub exports: &'static [&'static str],
    /// Nodes that may be exception handlers.
    pub handlers: &'static [&'static str],
    /// Conditional / loop / switch nodes that add one nesting level.
    pub nesting: &'static [&'static str],
    /// Wrapper kinds whose `if` child is an `else if`, not a new level.
    pub else_wrappers: &'static [&'static str],
}

/// Resolve an import of `from` against the project's file set.
pub type ResolveFn = fn(spec: &ImportSpec, from: &str, index: &FileIndex) -> Option<usize>;

/// A language adapter: grammar plus node classification.
#[derive(Clone, Copy)]
pub struct LanguageAdapter {
    /// Stable language tag (e.g. "python").
    pub tag: &'static str,
    /// File extensions handled, without dot.
    pub extensions: &'static [&'static str],
    /// Interpreter names recognised on a `#!` line.
    pub interpreters: &'static [&'static str],
    /// Grammar constructor.
    pub grammar: fn() -> Language,
    pub kinds: NodeKinds,
    /// Name of a function-like, type-like or container node.
    pub name: fn(Node, &[u8]) -> Option<String>,
    /// Parameter count of a function-like node.
    pub parameters: fn(Node, &[u8]) -> usize,
    /// Receiver type of a method declared outside its type.
    pub receiver: fn(Node, &[u8]) -> Option<String>,
    /// Classify a handler-like node; `None` means it is not a handler.
    pub handler: fn(Node, &[u8]) -> Option<HandlerKind>,
    /// Import specifiers carried by an import-like node.
    pub imports: fn(Node, &[u8]) -> Vec<ImportSpec>,
    /// Names exported by an export-like node.
    pub exports: fn(Node, &[u8]) -> Vec<String>,
    /// Docstring presence for a function or type node.
    pub docstring: Option<fn(Node, &[u8]) -> bool>,
    /// Field names a field-like node declares, counted once per type even
    /// inside method bodies. `None` counts one field per field-like node
    /// directly inside the type.
    pub field_names: Option<fn(Node, &[u8]) -> Vec<String>>,
    pub resolve: ResolveFn,
}

impl LanguageAdapter {
    /// Build a grammar-bound tree-sitter parser.
    pub fn parser(&self) -> anyhow::Result<tree_sitter::Parser> {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&(self.grammar)())?;
        Ok(parser)
    }

    pub fn handles_extension(&self, ext: &str) -> bool {
        self.extensions.contains(&ext)
    }
}

impl std::fmt::Debug for LanguageAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageAdapter")
            .field("tag", &self.tag)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// Read-only registry of all adapters.
pub struct Registry {
    adapters: Vec<LanguageAdapter>,
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| Registry {
    adapters: languages::all(),
});

static SHEBANG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#!\s*(?:\S*/)?(?:env\s+(?:-\S+\s+)*)?([A-Za-z][\w.+-]*)").expect("valid shebang regex")
});

/// The process-wide registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

impl Registry {
    /// All adapters, in registration order.
    pub fn adapters(&self) -> &[LanguageAdapter] {
        &self.adapters
    }

    /// Get an adapter for a file extension (without dot).
    pub fn for_extension(&self, ext: &str) -> Option<&LanguageAdapter> {
        let ext = ext.to_ascii_lowercase();
        self.adapters.iter().find(|a| a.handles_extension(&ext))
    }

    /// Get an adapter by language tag.
    pub fn for_tag(&self, tag: &str) -> Option<&LanguageAdapter> {
        self.adapters.iter().find(|a| a.tag == tag)
    }

    /// Get an adapter from a `#!` line.
    pub fn for_shebang(&self, first_line: &str) -> Option<&LanguageAdapter> {
        let interpreter = SHEBANG.captures(first_line.trim_end())?.get(1)?.as_str();
        // python3.11 -> python3
        let base = interpreter
            .split_once('.')
            .map(|(head, _)| head)
            .unwrap_or(interpreter);
        self.adapters
            .iter()
            .find(|a| a.interpreters.contains(&interpreter) || a.interpreters.contains(&base))
    }

    /// Registered language tags.
    pub fn tags(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.tag).collect()
    }
}

// =============================================================================
// Shared helpers for adapter implementations
// =============================================================================

/// Text of a node.
pub fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Text of a named field, if present.
pub fn field_text(node: Node, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .map(|n| text(n, source).to_string())
        .filter(|s| !s.is_empty())
}

/// Name from the `name` field.
pub fn name_field(node: Node, source: &[u8]) -> Option<String> {
    field_text(node, "name", source)
}

/// Count named children of the `parameters` field, skipping the given kinds.
pub fn count_parameters(node: Node, skip: &[&str]) -> usize {
    let Some(params) = node.child_by_field_name("parameters") else {
        return 0;
    };
    let mut cursor = params.walk();
    let count = params
        .named_children(&mut cursor)
        .filter(|p| !p.is_extra() && !skip.contains(&p.kind()))
        .count();
    count
}

/// Strip surrounding quotes from a string literal.
pub fn unquote(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

/// Whether any descendant of `node` satisfies `pred` (iterative, pre-order).
pub fn any_descendant(node: Node, pred: &mut dyn FnMut(Node) -> bool) -> bool {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current != node && pred(current) {
            return true;
        }
        let mut cursor = current.walk();
        stack.extend(current.named_children(&mut cursor));
    }
    false
}

/// Last segment of a dotted or scoped name (`java.lang.Exception` -> `Exception`).
pub fn last_segment(name: &str) -> &str {
    name.rsplit(['.', ':']).next().unwrap_or(name).trim()
}

pub fn no_receiver(_node: Node, _source: &[u8]) -> Option<String> {
    None
}

pub fn no_exports(_node: Node, _source: &[u8]) -> Vec<String> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_extension() {
        let reg = registry();
        assert_eq!(reg.for_extension("py").map(|a| a.tag), Some("python"));
        assert_eq!(reg.for_extension("PY").map(|a| a.tag), Some("python"));
        assert_eq!(reg.for_extension("tsx").map(|a| a.tag), Some("tsx"));
        assert_eq!(reg.for_extension("rs").map(|a| a.tag), Some("rust"));
        assert!(reg.for_extension("md").is_none());
    }

    #[test]
    fn test_for_shebang() {
        let reg = registry();
        let tag = |line: &str| reg.for_shebang(line).map(|a| a.tag);
        assert_eq!(tag("#!/usr/bin/env python3"), Some("python"));
        assert_eq!(tag("#!/usr/bin/python3.11"), Some("python"));
        assert_eq!(tag("#!/usr/bin/env -S node --harmony"), Some("javascript"));
        assert_eq!(tag("#! /usr/local/bin/ruby -w"), Some("ruby"));
        assert_eq!(tag("#!/bin/bash"), None);
        assert_eq!(tag("print('no shebang')"), None);
    }

    #[test]
    fn test_every_grammar_loads() {
        for adapter in registry().adapters() {
            assert!(adapter.parser().is_ok(), "grammar for {} should load", adapter.tag);
        }
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("java.lang.Exception"), "Exception");
        assert_eq!(last_segment("std::io::Error"), "Error");
        assert_eq!(last_segment("Exception"), "Exception");
    }
}
