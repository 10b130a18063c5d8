//! Single-pass structural extraction.
//!
//! One iterative walk over the syntax tree collects every symbol of a file.
//! Each stack entry carries the nearest owner (function, type or method
//! container) and the current nesting depth, so nothing is looked up twice
//! and deep trees cannot overflow the call stack.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::time::Duration;

use tracing::{debug, warn};
use tree_sitter::Node;

use super::adapter::LanguageAdapter;
use super::facts::{
    FileStatus, FunctionFacts, HandlerSpan, SourceFile, Span, Symbol, SymbolDetail, SymbolKind,
    TypeFacts,
};
use crate::discover::Candidate;
use crate::error::FileError;

/// Name recorded for function-like nodes nothing names.
pub const ANONYMOUS: &str = "<anonymous>";

/// Leading bytes inspected for NUL when sniffing binary content.
const BINARY_SNIFF_BYTES: usize = 8 * 1024;

/// Nearest enclosing function, type or method container.
#[derive(Debug, Clone, Copy)]
enum Owner {
    File,
    Function,
    Type(usize),
    /// Index into `Walker::containers`.
    Container(usize),
}

#[derive(Debug, Clone, Copy)]
struct Ctx {
    owner: Owner,
    /// Innermost enclosing function symbol.
    function: Option<usize>,
    /// Innermost enclosing type, seen through its methods.
    ty: Option<usize>,
    depth: usize,
}

struct Walker<'a> {
    adapter: &'a LanguageAdapter,
    source: &'a [u8],
    symbols: Vec<Symbol>,
    toplevel_handlers: Vec<HandlerSpan>,
    containers: Vec<Option<String>>,
    /// Named fields per type symbol, for adapters that report names.
    type_fields: HashMap<usize, BTreeSet<String>>,
}

impl<'a> Walker<'a> {
    fn new(adapter: &'a LanguageAdapter, source: &'a [u8]) -> Self {
        Self {
            adapter,
            source,
            symbols: Vec::new(),
            toplevel_handlers: Vec::new(),
            containers: Vec::new(),
            type_fields: HashMap::new(),
        }
    }

    fn function_mut(&mut self, idx: usize) -> Option<&mut FunctionFacts> {
        match &mut self.symbols[idx].detail {
            SymbolDetail::Function(f) => Some(f),
            _ => None,
        }
    }

    fn type_mut(&mut self, idx: usize) -> Option<&mut TypeFacts> {
        match &mut self.symbols[idx].detail {
            SymbolDetail::Type(t) => Some(t),
            _ => None,
        }
    }

    fn push(&mut self, kind: SymbolKind, name: String, node: Node, detail: SymbolDetail) -> usize {
        self.symbols.push(Symbol {
            kind,
            name,
            span: Span::from_node(node),
            detail,
        });
        self.symbols.len() - 1
    }

    fn walk(&mut self, root: Node) {
        let root_ctx = Ctx {
            owner: Owner::File,
            function: None,
            ty: None,
            depth: 0,
        };
        let mut stack = vec![(root, root_ctx)];
        while let Some((node, ctx)) = stack.pop() {
            let child_ctx = self.visit(node, ctx);
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev().map(|child| (child, child_ctx)));
        }
    }

    /// Record whatever `node` contributes and return the context for its children.
    fn visit(&mut self, node: Node, ctx: Ctx) -> Ctx {
        let adapter = self.adapter;
        let kinds = &adapter.kinds;
        let kind = node.kind();
        let mut child_ctx = ctx;

        if kinds.functions.contains(&kind) {
            child_ctx = self.visit_function(node, ctx);
        } else if kinds.types.contains(&kind) {
            let name = (adapter.name)(node, self.source).unwrap_or_else(|| ANONYMOUS.into());
            let facts = TypeFacts {
                documented: adapter.docstring.map(|doc| doc(node, self.source)),
                ..Default::default()
            };
            let idx = self.push(SymbolKind::Type, name, node, SymbolDetail::Type(facts));
            child_ctx = Ctx {
                owner: Owner::Type(idx),
                function: None,
                ty: Some(idx),
                depth: 0,
            };
        } else if kinds.containers.contains(&kind) {
            self.containers.push((adapter.name)(node, self.source));
            child_ctx = Ctx {
                owner: Owner::Container(self.containers.len() - 1),
                function: None,
                ty: None,
                depth: 0,
            };
        }

        if let Owner::Type(t) = ctx.owner {
            if kinds.signatures.contains(&kind) {
                if let Some(facts) = self.type_mut(t) {
                    facts.methods += 1;
                }
            }
            if kinds.fields.contains(&kind) && adapter.field_names.is_none() {
                if let Some(facts) = self.type_mut(t) {
                    facts.fields += 1;
                }
            }
        }

        if let (Some(field_names), Some(t)) = (adapter.field_names, ctx.ty) {
            if kinds.fields.contains(&kind) {
                let names = field_names(node, self.source);
                if !names.is_empty() {
                    self.type_fields.entry(t).or_default().extend(names);
                }
            }
        }

        if kinds.imports.contains(&kind) {
            for spec in (adapter.imports)(node, self.source) {
                let name = spec.raw.clone();
                let detail = SymbolDetail::Import {
                    spec,
                    resolved: None,
                };
                self.push(SymbolKind::Import, name, node, detail);
            }
        }

        if kinds.exports.contains(&kind) {
            for name in (adapter.exports)(node, self.source) {
                self.push(SymbolKind::Export, name, node, SymbolDetail::Export);
            }
        }

        if kinds.handlers.contains(&kind) {
            if let Some(handler_kind) = (adapter.handler)(node, self.source) {
                let handler = HandlerSpan {
                    span: Span::from_node(node),
                    kind: handler_kind,
                };
                match ctx.function {
                    Some(f) => {
                        if let Some(facts) = self.function_mut(f) {
                            facts.handlers.push(handler);
                        }
                    }
                    None => self.toplevel_handlers.push(handler),
                }
            }
        }

        if kinds.nesting.contains(&kind) && !self.is_else_if(node) {
            if let Some(f) = ctx.function {
                child_ctx.depth = ctx.depth + 1;
                if let Some(facts) = self.function_mut(f) {
                    facts.max_nesting = facts.max_nesting.max(child_ctx.depth);
                }
            }
        }

        child_ctx
    }

    fn visit_function(&mut self, node: Node, ctx: Ctx) -> Ctx {
        let adapter = self.adapter;
        let name = (adapter.name)(node, self.source).unwrap_or_else(|| ANONYMOUS.into());

        let in_type = matches!(ctx.owner, Owner::Type(_));
        let receiver = match ctx.owner {
            Owner::Container(c) => self.containers[c].clone(),
            Owner::Type(_) => None,
            _ => (adapter.receiver)(node, self.source),
        };
        let is_method = in_type || matches!(ctx.owner, Owner::Container(_)) || receiver.is_some();

        if let Owner::Type(t) = ctx.owner {
            if let Some(facts) = self.type_mut(t) {
                facts.methods += 1;
            }
        }

        let facts = FunctionFacts {
            parameters: (adapter.parameters)(node, self.source),
            lines: Span::from_node(node).line_count(),
            max_nesting: 0,
            handlers: Vec::new(),
            receiver,
            documented: adapter.docstring.map(|doc| doc(node, self.source)),
        };
        let kind = if is_method {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };
        let idx = self.push(kind, name, node, SymbolDetail::Function(facts));
        Ctx {
            owner: Owner::Function,
            function: Some(idx),
            ty: ctx.ty,
            depth: 0,
        }
    }

    /// `else if` continues a chain instead of opening a new level.
    fn is_else_if(&self, node: Node) -> bool {
        let Some(parent) = node.parent() else {
            return false;
        };
        if self.adapter.kinds.else_wrappers.contains(&parent.kind()) {
            return true;
        }
        parent.kind() == node.kind() && parent.child_by_field_name("alternative") == Some(node)
    }

    /// Credit methods declared outside their type (Go receivers, Rust `impl`)
    /// to the same-named type of this file.
    fn attribute_receivers(&mut self) {
        let receivers: Vec<String> = self
            .symbols
            .iter()
            .filter_map(|s| s.function().and_then(|f| f.receiver.clone()))
            .collect();
        for receiver in receivers {
            let target = self
                .symbols
                .iter()
                .position(|s| s.kind == SymbolKind::Type && s.name == receiver);
            if let Some(t) = target {
                if let Some(facts) = self.type_mut(t) {
                    facts.methods += 1;
                }
            }
        }
    }

    fn finish(mut self, path: &str) -> SourceFile {
        self.attribute_receivers();
        for (t, names) in std::mem::take(&mut self.type_fields) {
            if let Some(facts) = self.type_mut(t) {
                facts.fields += names.len();
            }
        }
        let mut symbols = self.symbols;
        symbols.sort_by_key(|s| (s.span.start_line, s.span.start_col));
        SourceFile {
            path: path.to_string(),
            language: self.adapter.tag.to_string(),
            line_count: 0,
            status: FileStatus::Parsed,
            symbols,
            toplevel_handlers: self.toplevel_handlers,
        }
    }
}

/// Line count as an editor shows it: a trailing newline does not open a line.
pub fn count_lines(source: &[u8]) -> usize {
    let newlines = source.iter().filter(|b| **b == b'\n').count();
    if source.is_empty() || source.ends_with(b"\n") {
        newlines
    } else {
        newlines + 1
    }
}

/// A NUL byte near the start marks binary content.
pub fn looks_binary(source: &[u8]) -> bool {
    source.iter().take(BINARY_SNIFF_BYTES).any(|b| *b == 0)
}

/// First line holding an error or missing node.
fn first_error_line(root: Node) -> usize {
    let mut stack = vec![root];
    let mut first = root.start_position().row + 1;
    let mut found = false;
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let line = node.start_position().row + 1;
            if !found || line < first {
                first = line;
                found = true;
            }
            continue;
        }
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor).filter(|c| c.has_error() || c.is_missing()));
    }
    first
}

/// Extract the structure of one in-memory source file.
///
/// Malformed syntax and parse timeouts never fail: the result is an
/// `unparsed` record carrying the line count and the cause.
pub fn extract_source(
    adapter: &LanguageAdapter,
    rel_path: &str,
    source: &[u8],
    timeout: Option<Duration>,
) -> SourceFile {
    let line_count = count_lines(source);
    let unparsed = |reason: String| SourceFile::unparsed(rel_path, adapter.tag, line_count, reason);

    let mut parser = match adapter.parser() {
        Ok(parser) => parser,
        Err(e) => return unparsed(format!("grammar failed to load: {}", e)),
    };
    if let Some(timeout) = timeout {
        parser.set_timeout_micros(timeout.as_micros().try_into().unwrap_or(u64::MAX));
    }
    let Some(tree) = parser.parse(source, None) else {
        return unparsed("parse timed out".to_string());
    };
    let root = tree.root_node();
    if root.has_error() {
        return unparsed(format!("syntax error at line {}", first_error_line(root)));
    }

    let mut walker = Walker::new(adapter, source);
    walker.walk(root);
    let mut file = walker.finish(rel_path);
    file.line_count = line_count;
    file
}

/// Read and extract one discovered file.
pub fn extract_file(
    candidate: &Candidate,
    max_bytes: u64,
    timeout: Option<Duration>,
) -> Result<SourceFile, FileError> {
    let unreadable = |source| FileError::Unreadable {
        path: candidate.rel.clone(),
        source,
    };
    let bytes = fs::metadata(&candidate.path).map_err(unreadable)?.len();
    if bytes > max_bytes {
        return Err(FileError::TooLarge {
            path: candidate.rel.clone(),
            bytes,
            limit: max_bytes,
        });
    }
    let source = fs::read(&candidate.path).map_err(unreadable)?;
    if looks_binary(&source) {
        return Err(FileError::Binary {
            path: candidate.rel.clone(),
        });
    }

    debug!(path = %candidate.rel, language = candidate.adapter.tag, "extracting");
    let file = extract_source(candidate.adapter, &candidate.rel, &source, timeout);
    if let FileStatus::Unparsed { reason } = &file.status {
        warn!(path = %candidate.rel, %reason, "file not parsed");
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::registry;

    fn python(source: &str) -> SourceFile {
        let adapter = registry().for_tag("python").unwrap();
        extract_source(adapter, "app/mod.py", source.as_bytes(), None)
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(b""), 0);
        assert_eq!(count_lines(b"a"), 1);
        assert_eq!(count_lines(b"a\nb\n"), 2);
        assert_eq!(count_lines(b"a\nb"), 2);
        assert_eq!(count_lines(b"\n\n"), 2);
    }

    #[test]
    fn test_looks_binary() {
        assert!(looks_binary(b"abc\0def"));
        assert!(!looks_binary(b"def main():\n    pass\n"));
    }

    #[test]
    fn test_function_span_and_nesting() {
        let file = python(
            r#"def outer(x):
    if x:
        for i in range(x):
            while i:
                i -= 1
    elif x is None:
        pass

    def inner():
        if True:
            pass
    return inner
"#,
        );
        assert!(file.is_parsed());
        assert_eq!(file.line_count, 12);

        let outer = file.callables().find(|s| s.name == "outer").unwrap();
        let facts = outer.function().unwrap();
        assert_eq!(facts.lines, 12);
        assert_eq!(facts.max_nesting, 3);

        let inner = file.callables().find(|s| s.name == "inner").unwrap();
        assert_eq!(inner.function().unwrap().max_nesting, 1);
        assert_eq!(inner.kind, SymbolKind::Function);
    }

    #[test]
    fn test_flat_function_has_depth_zero() {
        let file = python("def f(a):\n    return a\n");
        let f = file.callables().next().unwrap();
        assert_eq!(f.function().unwrap().max_nesting, 0);
        assert_eq!(f.function().unwrap().lines, 2);
    }

    #[test]
    fn test_toplevel_handlers() {
        let file = python("try:\n    import yaml\nexcept ImportError:\n    yaml = None\n");
        assert_eq!(file.toplevel_handlers.len(), 1);
        assert!(!file.toplevel_handlers[0].is_catch_all());
        assert_eq!(file.imports().count(), 1);
    }

    #[test]
    fn test_malformed_source_is_unparsed() {
        let file = python("def broken(:\n    return\n\nx = 1\n");
        assert!(!file.is_parsed());
        assert_eq!(file.line_count, 4);
        assert!(file.symbols.is_empty());
        match &file.status {
            FileStatus::Unparsed { reason } => assert!(reason.contains("line 1"), "{}", reason),
            FileStatus::Parsed => unreachable!(),
        }
    }

    #[test]
    fn test_symbols_in_source_order() {
        let file = python(
            "import os\n\nclass A:\n    def m(self):\n        pass\n\ndef f():\n    pass\n",
        );
        let names: Vec<_> = file.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["os", "A", "m", "f"]);
    }
}
