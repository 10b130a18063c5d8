//! TypeScript and TSX adapters, built on the JavaScript routines.

use tree_sitter::Language;

use super::javascript;
use crate::analysis::adapter::{no_receiver, LanguageAdapter, NodeKinds};

const KINDS: NodeKinds = NodeKinds {
    functions: javascript::FUNCTIONS,
    types: &[
        "class_declaration",
        "class",
        "abstract_class_declaration",
        "interface_declaration",
        "type_alias_declaration",
    ],
    containers: &[],
    signatures: &["method_signature", "abstract_method_signature"],
    fields: &["public_field_definition", "property_signature"],
    imports: javascript::IMPORTS,
    exports: &["export_statement"],
    handlers: &["catch_clause"],
    nesting: javascript::NESTING,
    else_wrappers: &["else_clause"],
};

fn build(
    tag: &'static str,
    extensions: &'static [&'static str],
    interpreters: &'static [&'static str],
    grammar: fn() -> Language,
) -> LanguageAdapter {
    LanguageAdapter {
        tag,
        extensions,
        interpreters,
        grammar,
        kinds: KINDS,
        name: javascript::name,
        parameters: javascript::parameters,
        receiver: no_receiver,
        handler: javascript::handler,
        imports: javascript::imports,
        exports: javascript::exports,
        docstring: None,
        field_names: None,
        resolve: javascript::resolve,
    }
}

pub fn typescript() -> LanguageAdapter {
    build(
        "typescript",
        &["ts", "mts", "cts"],
        &["ts-node", "deno"],
        || tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    )
}

pub fn tsx() -> LanguageAdapter {
    build("tsx", &["tsx"], &[], || tree_sitter_typescript::LANGUAGE_TSX.into())
}
