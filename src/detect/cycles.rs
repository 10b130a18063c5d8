//! Import cycles, one finding per cycle in the dependency graph.

use crate::graph::{Cycle, DependencyGraph};

use super::{SmellFinding, SmellKind};

pub fn detect_import_cycles(graph: &DependencyGraph) -> Vec<SmellFinding> {
    graph.cycles().iter().map(finding).collect()
}

fn finding(cycle: &Cycle) -> SmellFinding {
    let first = cycle.files.first().map(String::as_str).unwrap_or_default();
    let message = if cycle.len() == 1 {
        format!("import cycle: {} imports itself", first)
    } else {
        format!("import cycle: {} -> {}", cycle.files.join(" -> "), first)
    };
    let mut finding = SmellFinding::new(SmellKind::ImportCycle, first, cycle.len(), 0, message)
        .with_severity(SmellKind::ImportCycle.base_severity());
    finding.cycle = cycle.files.clone();
    finding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{extract_source, registry, SourceFile};
    use crate::detect::Severity;

    fn javascript(path: &str, source: &str) -> SourceFile {
        let adapter = registry().for_tag("javascript").unwrap();
        extract_source(adapter, path, source.as_bytes(), None)
    }

    #[test]
    fn test_cycle_finding() {
        let files = vec![
            javascript("src/a.js", "import { b } from './b';\n"),
            javascript("src/b.js", "import { c } from './c.js';\n"),
            javascript("src/c.js", "const a = require('./a');\n"),
            javascript("src/d.js", "import { a } from './a';\n"),
        ];
        let graph = DependencyGraph::build(&files);
        let findings = detect_import_cycles(&graph);
        assert_eq!(findings.len(), 1);

        let finding = &findings[0];
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.file, "src/a.js");
        assert_eq!(finding.measurement.value, 3);
        assert_eq!(finding.cycle, vec!["src/a.js", "src/b.js", "src/c.js"]);
        assert_eq!(
            finding.message,
            "import cycle: src/a.js -> src/b.js -> src/c.js -> src/a.js"
        );
    }

    #[test]
    fn test_no_cycles_no_findings() {
        let files = vec![
            javascript("a.js", "import b from './b';\n"),
            javascript("b.js", "export default 1;\n"),
        ];
        let graph = DependencyGraph::build(&files);
        assert!(detect_import_cycles(&graph).is_empty());
    }
}
