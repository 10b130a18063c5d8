//! Ruby adapter.

use tree_sitter::Node;

use crate::analysis::adapter::{
    count_parameters, last_segment, name_field, no_exports, no_receiver, text, unquote,
    LanguageAdapter, NodeKinds,
};
use crate::analysis::{HandlerKind, ImportSpec};
use crate::graph::index::{join, parent_dir};
use crate::graph::FileIndex;

/// Rescued classes that catch everything a bare `rescue` would, or more.
const CATCH_ALL_TYPES: &[&str] = &["Exception", "StandardError"];

const LOADERS: &[&str] = &["require", "require_relative", "load"];

/// Class macros that declare attributes.
const ATTRIBUTE_MACROS: &[&str] = &["attr_accessor", "attr_reader", "attr_writer", "attr"];

pub fn adapter() -> LanguageAdapter {
    LanguageAdapter {
        tag: "ruby",
        extensions: &["rb", "rake", "gemspec"],
        interpreters: &["ruby"],
        grammar: || tree_sitter_ruby::LANGUAGE.into(),
        kinds: NodeKinds {
            functions: &["method", "singleton_method"],
            types: &["class", "module"],
            containers: &[],
            signatures: &[],
            fields: &["call", "assignment", "operator_assignment"],
            imports: &["call"],
            exports: &[],
            handlers: &["rescue", "rescue_modifier"],
            nesting: &[
                "if",
                "unless",
                "while",
                "until",
                "for",
                "case",
                "case_match",
                "if_modifier",
                "unless_modifier",
                "while_modifier",
                "until_modifier",
            ],
            else_wrappers: &[],
        },
        name: name_field,
        parameters,
        receiver: no_receiver,
        handler,
        imports,
        exports: no_exports,
        docstring: None,
        field_names: Some(field_names),
        resolve,
    }
}

fn parameters(node: Node, _source: &[u8]) -> usize {
    count_parameters(node, &[])
}

fn handler(node: Node, source: &[u8]) -> Option<HandlerKind> {
    // `value = risky rescue nil`
    if node.kind() == "rescue_modifier" {
        return Some(HandlerKind::CatchAll);
    }
    let Some(exceptions) = node.child_by_field_name("exceptions") else {
        return Some(HandlerKind::CatchAll);
    };
    let catch_all = text(exceptions, source)
        .split(',')
        .map(last_segment)
        .any(|name| CATCH_ALL_TYPES.contains(&name));
    Some(if catch_all {
        HandlerKind::CatchAll
    } else {
        HandlerKind::Specific
    })
}

/// Attribute macros name their fields; `@ivar` assignments name one each.
fn field_names(node: Node, source: &[u8]) -> Vec<String> {
    if node.kind() == "call" {
        return attribute_names(node, source);
    }
    let Some(left) = node.child_by_field_name("left") else {
        return Vec::new();
    };
    let mut cursor = left.walk();
    let targets: Vec<Node> = if left.kind() == "left_assignment_list" {
        left.named_children(&mut cursor).collect()
    } else {
        vec![left]
    };
    targets
        .into_iter()
        .filter(|target| target.kind() == "instance_variable")
        .map(|target| text(target, source).trim_start_matches('@').to_string())
        .collect()
}

fn attribute_names(node: Node, source: &[u8]) -> Vec<String> {
    if node.child_by_field_name("receiver").is_some() {
        return Vec::new();
    }
    let is_macro = node
        .child_by_field_name("method")
        .is_some_and(|method| ATTRIBUTE_MACROS.contains(&text(method, source)));
    let Some(args) = node.child_by_field_name("arguments").filter(|_| is_macro) else {
        return Vec::new();
    };
    let mut cursor = args.walk();
    args.named_children(&mut cursor)
        .filter_map(|arg| match arg.kind() {
            "simple_symbol" => Some(text(arg, source).trim_start_matches(':').to_string()),
            "string" => Some(unquote(text(arg, source))),
            _ => None,
        })
        .collect()
}

fn imports(node: Node, source: &[u8]) -> Vec<ImportSpec> {
    if node.child_by_field_name("receiver").is_some() {
        return Vec::new();
    }
    let Some(method) = node.child_by_field_name("method") else {
        return Vec::new();
    };
    let method = text(method, source);
    if !LOADERS.contains(&method) {
        return Vec::new();
    }
    let Some(arg) = node
        .child_by_field_name("arguments")
        .and_then(|args| args.named_child(0))
        .filter(|arg| arg.kind() == "string")
    else {
        return Vec::new();
    };
    let raw = unquote(text(arg, source));
    let relative = method == "require_relative" || raw.starts_with("./") || raw.starts_with("../");
    vec![ImportSpec::new(raw, relative)]
}

fn with_rb(path: &str) -> String {
    if path.ends_with(".rb") {
        path.to_string()
    } else {
        format!("{}.rb", path)
    }
}

fn resolve(spec: &ImportSpec, from: &str, index: &FileIndex) -> Option<usize> {
    if spec.relative {
        let path = join(parent_dir(from), &spec.raw)?;
        return index.lookup(&with_rb(&path));
    }
    let path = with_rb(&spec.raw);
    index
        .first_of([format!("lib/{}", path), path.clone()])
        .or_else(|| index.find_suffix(&path))
}
