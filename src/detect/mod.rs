//! Smell detection over extracted files and the dependency graph.
//!
//! Every rule is a pure function of one file's facts (or of the graph, for
//! cycles) and the validated settings.

mod complexity;
mod cycles;
mod docstrings;
mod exceptions;
mod runner;
mod size;
mod types;

pub use complexity::{detect_deep_nesting, detect_excess_parameters};
pub use cycles::detect_import_cycles;
pub use docstrings::detect_missing_docstrings;
pub use exceptions::detect_broad_exceptions;
pub use runner::Runner;
pub use size::{detect_overlong_functions, detect_oversized_file, detect_oversized_types};
pub use types::{Measurement, Severity, SmellFinding, SmellKind};
