//! Treemap - structural mapper and code smell detector.
//!
//! Treemap parses every supported source file of a project with tree-sitter,
//! records its functions, types, imports and exports, resolves imports into a
//! file dependency graph and evaluates threshold rules against the result.
//!
//! # Architecture
//!
//! A scan is a one-way pipeline; each stage reads the finished output of the
//! one before it:
//!
//! - `discover`: walks the root and picks files some adapter handles
//! - `analysis`: language adapters and the per-file structural extractor
//! - `graph`: import resolution and cycle detection
//! - `detect`: smell rules over extracted facts and the graph
//! - `report`: the compiled report and its output formats
//! - `scan`: runs the stages in order
//! - `config`: YAML configuration and validated settings
//!
//! # Adding a New Language
//!
//! See `src/analysis/languages/` for examples. Write a function returning a
//! `LanguageAdapter` and add it to `languages::all()`.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detect;
pub mod discover;
pub mod error;
pub mod graph;
pub mod report;
pub mod scan;
pub mod snapshot;

pub use analysis::{registry, LanguageAdapter, SourceFile, Symbol, SymbolKind};
pub use config::{Config, Settings, Thresholds};
pub use detect::{Runner, Severity, SmellFinding, SmellKind};
pub use error::{ConfigError, FileError};
pub use graph::DependencyGraph;
pub use report::{OutputFormat, Report};
pub use scan::Scanner;
pub use snapshot::Snapshot;
