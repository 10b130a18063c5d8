//! Fact structures extracted from AST analysis.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source location span with line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed, inclusive).
    pub end_line: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: (end.row + 1).max(start.row + 1),
        }
    }

    /// Number of lines covered, inclusive of both ends.
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Kind of extracted symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Type,
    Import,
    Export,
}

impl SymbolKind {
    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Type => "type",
            SymbolKind::Import => "import",
            SymbolKind::Export => "export",
        }
    }

    /// Check if this is a callable (function or method).
    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an exception handler matches specific failures or everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Specific,
    CatchAll,
}

/// An exception/error handler found in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSpan {
    pub span: Span,
    pub kind: HandlerKind,
}

impl HandlerSpan {
    pub fn is_catch_all(&self) -> bool {
        self.kind == HandlerKind::CatchAll
    }
}

/// Measurements taken for a function or method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionFacts {
    /// Parameter count as written (receivers like `self` excluded).
    pub parameters: usize,
    /// Inclusive line span of the whole declaration.
    pub lines: usize,
    /// Maximum conditional/loop/switch nesting inside the body.
    pub max_nesting: usize,
    /// Handlers whose innermost enclosing function is this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handlers: Vec<HandlerSpan>,
    /// For methods declared outside their type: the receiver type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// Docstring presence, for languages that have docstrings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documented: Option<bool>,
}

impl FunctionFacts {
    /// Number of catch-all handlers directly inside this function.
    pub fn catch_all_count(&self) -> usize {
        self.handlers.iter().filter(|h| h.is_catch_all()).count()
    }
}

/// Measurements taken for a type (class, struct, interface, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFacts {
    /// Direct methods, not inherited ones.
    pub methods: usize,
    pub fields: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documented: Option<bool>,
}

/// An import specifier as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    /// The module or path specifier (e.g. `os.path`, `./util`, `crate::graph`).
    pub raw: String,
    /// Whether the specifier is relative to the importing file.
    pub relative: bool,
    /// Optional alias (e.g. `import numpy as np` -> alias is "np").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Names pulled from the module (`from x import a, b`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

impl ImportSpec {
    pub fn new(raw: impl Into<String>, relative: bool) -> Self {
        Self {
            raw: raw.into(),
            relative,
            alias: None,
            names: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }
}

/// Kind-specific attributes of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolDetail {
    Function(FunctionFacts),
    Type(TypeFacts),
    Import {
        spec: ImportSpec,
        /// Project-relative path of the file the import resolved to.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolved: Option<String>,
    },
    Export,
}

/// A named structural unit extracted from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    pub span: Span,
    pub detail: SymbolDetail,
}

impl Symbol {
    /// Function measurements, for functions and methods.
    pub fn function(&self) -> Option<&FunctionFacts> {
        match &self.detail {
            SymbolDetail::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Type measurements, for types.
    pub fn type_facts(&self) -> Option<&TypeFacts> {
        match &self.detail {
            SymbolDetail::Type(t) => Some(t),
            _ => None,
        }
    }

    /// The import specifier, for imports.
    pub fn import(&self) -> Option<&ImportSpec> {
        match &self.detail {
            SymbolDetail::Import { spec, .. } => Some(spec),
            _ => None,
        }
    }

    /// Get the qualified name (receiver.name for methods declared outside their type).
    pub fn qualified_name(&self) -> String {
        match self.function().and_then(|f| f.receiver.as_deref()) {
            Some(recv) => format!("{}.{}", recv, self.name),
            None => self.name.clone(),
        }
    }
}

/// Whether structural extraction succeeded for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Parsed,
    Unparsed { reason: String },
}

/// All facts extracted from a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Project-relative path with `/` separators.
    pub path: String,
    /// Adapter tag (e.g. "python").
    pub language: String,
    pub line_count: usize,
    #[serde(flatten)]
    pub status: FileStatus,
    /// Symbols in source order.
    pub symbols: Vec<Symbol>,
    /// Handlers that are not inside any function.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toplevel_handlers: Vec<HandlerSpan>,
}

impl SourceFile {
    /// Record for a file whose syntax could not be extracted.
    pub fn unparsed(path: &str, language: &str, line_count: usize, reason: String) -> Self {
        Self {
            path: path.to_string(),
            language: language.to_string(),
            line_count,
            status: FileStatus::Unparsed { reason },
            symbols: Vec::new(),
            toplevel_handlers: Vec::new(),
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.status == FileStatus::Parsed
    }

    /// Get all functions and methods.
    pub fn callables(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.kind.is_callable())
    }

    /// Get all types.
    pub fn types(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.kind == SymbolKind::Type)
    }

    /// Raw import specifiers in source order.
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.symbols.iter().filter_map(|s| s.import())
    }

    /// Count symbols of the given kind.
    pub fn count(&self, kind: SymbolKind) -> usize {
        self.symbols.iter().filter(|s| s.kind == kind).count()
    }
}
