//! AST-backed structural extraction.
//!
//! Every supported language is described by a [`LanguageAdapter`] record in
//! the process-wide [`Registry`]. Extraction walks one file's syntax tree once
//! and produces a [`SourceFile`]: its symbols with their measurements, its raw
//! import specifiers and its exception handlers.
//!
//! # Adding a New Language
//!
//! 1. Create a module in `src/analysis/languages/` returning a `LanguageAdapter`
//! 2. Fill in the node-kind tables for the grammar
//! 3. Supply the name, parameter, handler, import and resolve routines
//! 4. List the adapter in `languages::all()`
//!
//! See `languages/go.rs` for a compact example.

pub mod adapter;
mod extract;
mod facts;
mod languages;

pub use adapter::{registry, LanguageAdapter, NodeKinds, Registry};
pub use extract::{count_lines, extract_file, extract_source, looks_binary, ANONYMOUS};
pub use facts::{
    FileStatus, FunctionFacts, HandlerKind, HandlerSpan, ImportSpec, SourceFile, Span, Symbol,
    SymbolDetail, SymbolKind, TypeFacts,
};
