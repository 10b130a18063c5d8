//! Go adapter.
//!
//! Methods are declared outside their type and carry a receiver; the
//! extractor attributes them to the same-named `type` in the file. A call to
//! `recover()` is Go's only way to swallow every panic, so it is the
//! catch-all idiom here.

use tree_sitter::Node;

use crate::analysis::adapter::{
    field_text, name_field, no_exports, text, unquote, LanguageAdapter, NodeKinds,
};
use crate::analysis::{HandlerKind, ImportSpec};
use crate::graph::index::{join, parent_dir};
use crate::graph::FileIndex;

pub fn adapter() -> LanguageAdapter {
    LanguageAdapter {
        tag: "go",
        extensions: &["go"],
        interpreters: &[],
        grammar: || tree_sitter_go::LANGUAGE.into(),
        kinds: NodeKinds {
            functions: &["function_declaration", "method_declaration", "func_literal"],
            types: &["type_spec", "type_alias"],
            containers: &[],
            signatures: &["method_elem", "method_spec"],
            fields: &["field_declaration"],
            imports: &["import_declaration"],
            exports: &[],
            handlers: &["call_expression"],
            nesting: &[
                "if_statement",
                "for_statement",
                "expression_switch_statement",
                "type_switch_statement",
                "select_statement",
            ],
            else_wrappers: &[],
        },
        name: name_field,
        parameters,
        receiver,
        handler,
        imports,
        exports: no_exports,
        docstring: None,
        field_names: None,
        resolve,
    }
}

fn parameters(node: Node, _source: &[u8]) -> usize {
    let Some(params) = node.child_by_field_name("parameters") else {
        return 0;
    };
    let mut cursor = params.walk();
    let decls: Vec<Node> = params.named_children(&mut cursor).collect();
    decls
        .into_iter()
        .map(|decl| match decl.kind() {
            // `a, b int` declares two parameters; `int` alone declares one
            "parameter_declaration" => {
                let mut names = decl.walk();
                decl.children_by_field_name("name", &mut names).count().max(1)
            }
            "variadic_parameter_declaration" => 1,
            _ => 0,
        })
        .sum()
}

/// `func (s *Server[T]) Run()` -> `Server`.
fn receiver(node: Node, source: &[u8]) -> Option<String> {
    let list = node.child_by_field_name("receiver")?;
    let mut cursor = list.walk();
    let decl = list
        .named_children(&mut cursor)
        .find(|c| c.kind() == "parameter_declaration")?;
    let ty = field_text(decl, "type", source)?;
    let ty = ty.trim_start_matches('*');
    let ty = ty.split('[').next().unwrap_or(ty).trim();
    (!ty.is_empty()).then(|| ty.to_string())
}

fn handler(node: Node, source: &[u8]) -> Option<HandlerKind> {
    let function = node.child_by_field_name("function")?;
    (function.kind() == "identifier" && text(function, source) == "recover")
        .then_some(HandlerKind::CatchAll)
}

fn imports(node: Node, source: &[u8]) -> Vec<ImportSpec> {
    let mut specs = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == "import_spec" {
            if let Some(path) = current.child_by_field_name("path") {
                let raw = unquote(text(path, source));
                let relative = raw.starts_with("./") || raw.starts_with("../");
                let alias = field_text(current, "name", source);
                specs.push(ImportSpec::new(raw, relative).with_alias(alias));
            }
            continue;
        }
        let mut cursor = current.walk();
        let children: Vec<Node> = current.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    specs
}

/// Standard-library paths have no dot in their first element.
fn is_module_path(raw: &str) -> bool {
    raw.split('/').next().map(|head| head.contains('.')).unwrap_or(false)
}

/// Package directory for an import path: the longest project directory the
/// path ends with, then its first non-test `.go` file.
fn resolve(spec: &ImportSpec, from: &str, index: &FileIndex) -> Option<usize> {
    let target = if spec.relative {
        join(parent_dir(from), &spec.raw)?
    } else {
        spec.raw.clone()
    };
    let suffix_ok = spec.relative || is_module_path(&target);

    let dir = index
        .dirs()
        .filter(|dir| !dir.is_empty())
        .filter(|dir| {
            target == *dir || (suffix_ok && target.ends_with(&format!("/{}", dir)))
        })
        .max_by_key(|dir| dir.len())?;

    index.dir_files(dir).iter().copied().find(|idx| {
        let path = index.path(*idx);
        path.ends_with(".go") && !path.ends_with("_test.go")
    })
}
