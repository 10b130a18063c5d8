//! Java adapter.

use tree_sitter::Node;

use crate::analysis::adapter::{
    count_parameters, last_segment, name_field, no_exports, no_receiver, text, LanguageAdapter,
    NodeKinds,
};
use crate::analysis::{HandlerKind, ImportSpec};
use crate::graph::FileIndex;

/// Catch types that swallow every failure.
const CATCH_ALL_TYPES: &[&str] = &["Exception", "Throwable"];

pub fn adapter() -> LanguageAdapter {
    LanguageAdapter {
        tag: "java",
        extensions: &["java"],
        interpreters: &[],
        grammar: || tree_sitter_java::LANGUAGE.into(),
        kinds: NodeKinds {
            functions: &[
                "method_declaration",
                "constructor_declaration",
                "compact_constructor_declaration",
            ],
            types: &[
                "class_declaration",
                "interface_declaration",
                "enum_declaration",
                "record_declaration",
                "annotation_type_declaration",
            ],
            containers: &[],
            signatures: &[],
            fields: &["variable_declarator", "enum_constant"],
            imports: &["import_declaration"],
            exports: &[],
            handlers: &["catch_clause"],
            nesting: &[
                "if_statement",
                "for_statement",
                "enhanced_for_statement",
                "while_statement",
                "do_statement",
                "switch_expression",
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
        field_names: None,
        resolve,
    }
}

fn parameters(node: Node, _source: &[u8]) -> usize {
    count_parameters(node, &["receiver_parameter"])
}

fn handler(node: Node, source: &[u8]) -> Option<HandlerKind> {
    let mut cursor = node.walk();
    let param = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "catch_formal_parameter")?;
    let mut inner = param.walk();
    let catch_type = param
        .named_children(&mut inner)
        .find(|c| c.kind() == "catch_type")?;

    // multi-catch `IOException | Exception e`
    let catch_all = text(catch_type, source)
        .split('|')
        .map(last_segment)
        .any(|name| CATCH_ALL_TYPES.contains(&name));
    Some(if catch_all {
        HandlerKind::CatchAll
    } else {
        HandlerKind::Specific
    })
}

fn imports(node: Node, source: &[u8]) -> Vec<ImportSpec> {
    let raw = text(node, source)
        .trim()
        .trim_start_matches("import")
        .trim_end_matches(';')
        .trim();
    let (is_static, path) = match raw.strip_prefix("static") {
        Some(rest) if rest.starts_with(char::is_whitespace) => (true, rest.trim()),
        _ => (false, raw),
    };
    let path: String = path.chars().filter(|c| !c.is_whitespace()).collect();
    if path.is_empty() {
        return Vec::new();
    }
    let spec = ImportSpec::new(path, false);
    if is_static {
        vec![spec.with_names(vec!["static".to_string()])]
    } else {
        vec![spec]
    }
}

/// `a.b.C` maps to `a/b/C.java`; nested classes and static members drop
/// trailing segments until a file matches; `a.b.*` is the package directory.
fn resolve(spec: &ImportSpec, _from: &str, index: &FileIndex) -> Option<usize> {
    let segments: Vec<&str> = spec.raw.split('.').filter(|s| !s.is_empty()).collect();
    let is_static = spec.names.iter().any(|n| n == "static");

    match segments.split_last() {
        Some((&"*", package)) if !is_static => package_file(&package.join("/"), index),
        Some((&"*", class)) => class_file(class, index),
        Some(_) => class_file(&segments, index),
        None => None,
    }
}

fn class_file(segments: &[&str], index: &FileIndex) -> Option<usize> {
    let min = if segments.len() > 1 { 2 } else { 1 };
    (min..=segments.len())
        .rev()
        .find_map(|n| index.find_suffix(&format!("{}.java", segments[..n].join("/"))))
}

fn package_file(dir: &str, index: &FileIndex) -> Option<usize> {
    let tail = format!("/{}", dir);
    let found = index
        .dirs()
        .filter(|d| *d == dir || d.ends_with(&tail))
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))?;
    index
        .dir_files(found)
        .iter()
        .copied()
        .find(|idx| index.path(*idx).ends_with(".java"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{extract_source, SourceFile, SymbolKind};

    fn extract(source: &str) -> SourceFile {
        extract_source(
            &adapter(),
            "src/main/java/com/acme/Orders.java",
            source.as_bytes(),
            None,
        )
    }

    #[test]
    fn test_class_shape() {
        let file = extract(
            r#"
package com.acme;

import java.util.List;
import static com.acme.util.Strings.join;
import com.acme.model.*;

public class Orders {
    private final List<Order> items;
    private int count, limit;

    public Orders(List<Order> items) {
        this.items = items;
    }

    public void add(Order order, int qty, String note) {
        for (Order o : items) {
            if (o == order) {
                while (qty > 0) { qty--; }
            }
        }
    }

    interface Listener {
        void changed(Order order);
    }
}
"#,
        );
        let orders = file.types().find(|t| t.name == "Orders").unwrap();
        assert_eq!(orders.type_facts().unwrap().methods, 2);
        assert_eq!(orders.type_facts().unwrap().fields, 3);

        let listener = file.types().find(|t| t.name == "Listener").unwrap();
        assert_eq!(listener.type_facts().unwrap().methods, 1);

        let add = file.symbols.iter().find(|s| s.name == "add").unwrap();
        assert_eq!(add.kind, SymbolKind::Method);
        let facts = add.function().unwrap();
        assert_eq!(facts.parameters, 3);
        assert_eq!(facts.max_nesting, 3);

        let raws: Vec<_> = file.imports().map(|i| i.raw.as_str()).collect();
        assert_eq!(
            raws,
            vec!["java.util.List", "com.acme.util.Strings.join", "com.acme.model.*"]
        );
    }

    #[test]
    fn test_catch_types() {
        let file = extract(
            r#"
class Loader {
    void load() {
        try { read(); } catch (IOException e) { log(e); }
        try { read(); } catch (IOException | Exception e) { log(e); }
        try { read(); } catch (java.lang.Throwable t) { log(t); }
    }
}
"#,
        );
        let load = file.callables().next().unwrap();
        let facts = load.function().unwrap();
        assert_eq!(facts.handlers.len(), 3);
        assert_eq!(facts.catch_all_count(), 2);
    }

    #[test]
    fn test_resolve_classes_and_packages() {
        let index = FileIndex::new(&[
            "src/main/java/com/acme/Orders.java",
            "src/main/java/com/acme/model/Order.java",
            "src/main/java/com/acme/util/Strings.java",
        ]);
        let from = "src/main/java/com/acme/Orders.java";
        let class = ImportSpec::new("com.acme.util.Strings", false);
        assert_eq!(resolve(&class, from, &index), Some(2));
        let member = ImportSpec::new("com.acme.util.Strings.join", false)
            .with_names(vec!["static".to_string()]);
        assert_eq!(resolve(&member, from, &index), Some(2));
        let package = ImportSpec::new("com.acme.model.*", false);
        assert_eq!(resolve(&package, from, &index), Some(1));
        let jdk = ImportSpec::new("java.util.List", false);
        assert_eq!(resolve(&jdk, from, &index), None);
    }
}
