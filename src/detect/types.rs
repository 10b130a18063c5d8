//! Core types for detection results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Severity levels for findings, ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Raise by `steps` levels, capped at `High`.
    pub fn raised(self, steps: usize) -> Severity {
        let mut severity = self;
        for _ in 0..steps {
            severity = match severity {
                Severity::Low => Severity::Medium,
                Severity::Medium | Severity::High => Severity::High,
            };
        }
        severity
    }

    /// Severity of a measurement over its threshold: the base level, one
    /// level higher at twice the threshold, two levels higher at four times.
    pub fn banded(base: Severity, value: usize, threshold: usize) -> Severity {
        let steps = if value >= threshold.saturating_mul(4) {
            2
        } else if value >= threshold.saturating_mul(2) {
            1
        } else {
            0
        };
        base.raised(steps)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Smell kinds, one per rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmellKind {
    OversizedType,
    OverlongFunction,
    DeepNesting,
    ExcessParameters,
    OversizedFile,
    BroadException,
    ImportCycle,
    MissingDocstring,
}

impl SmellKind {
    pub const ALL: [SmellKind; 8] = [
        SmellKind::OversizedType,
        SmellKind::OverlongFunction,
        SmellKind::DeepNesting,
        SmellKind::ExcessParameters,
        SmellKind::OversizedFile,
        SmellKind::BroadException,
        SmellKind::ImportCycle,
        SmellKind::MissingDocstring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SmellKind::OversizedType => "oversized_type",
            SmellKind::OverlongFunction => "overlong_function",
            SmellKind::DeepNesting => "deep_nesting",
            SmellKind::ExcessParameters => "excess_parameters",
            SmellKind::OversizedFile => "oversized_file",
            SmellKind::BroadException => "broad_exception",
            SmellKind::ImportCycle => "import_cycle",
            SmellKind::MissingDocstring => "missing_docstring",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Level before any banding.
    pub fn base_severity(&self) -> Severity {
        match self {
            SmellKind::ImportCycle => Severity::High,
            SmellKind::OversizedFile | SmellKind::MissingDocstring => Severity::Low,
            _ => Severity::Medium,
        }
    }

    /// Opt-in kinds stay off unless enabled explicitly.
    pub fn on_by_default(&self) -> bool {
        !matches!(self, SmellKind::MissingDocstring)
    }

    /// Human-readable title for reports.
    pub fn title(&self) -> &'static str {
        match self {
            SmellKind::OversizedType => "Oversized type",
            SmellKind::OverlongFunction => "Overlong function",
            SmellKind::DeepNesting => "Deep nesting",
            SmellKind::ExcessParameters => "Excess parameters",
            SmellKind::OversizedFile => "Oversized file",
            SmellKind::BroadException => "Overbroad exception handling",
            SmellKind::ImportCycle => "Import cycle",
            SmellKind::MissingDocstring => "Missing docstring",
        }
    }
}

impl std::fmt::Display for SmellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The number that triggered a finding and the limit it crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: usize,
    pub threshold: usize,
}

/// A single detected smell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmellFinding {
    pub kind: SmellKind,
    pub severity: Severity,
    /// Project-relative path of the triggering file.
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub message: String,
    pub measurement: Measurement,
    /// Member files in cycle order, for import cycles.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<String>,
}

impl SmellFinding {
    /// A finding banded from its measurement.
    pub fn new(kind: SmellKind, file: &str, value: usize, threshold: usize, message: String) -> Self {
        Self {
            kind,
            severity: Severity::banded(kind.base_severity(), value, threshold),
            file: file.to_string(),
            line: None,
            symbol: None,
            message,
            measurement: Measurement { value, threshold },
            cycle: Vec::new(),
        }
    }

    pub fn at(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn on_symbol(mut self, name: impl Into<String>) -> Self {
        self.symbol = Some(name.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Report order: severity descending, then path, line, kind and symbol.
    pub fn report_order(a: &SmellFinding, b: &SmellFinding) -> Ordering {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.symbol.cmp(&b.symbol))
            .then_with(|| a.message.cmp(&b.message))
    }

    /// Location as `file:line`, or just the file.
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{}", self.file, line),
            None => self.file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banding_is_monotonic() {
        let base = Severity::Medium;
        assert_eq!(Severity::banded(base, 60, 50), Severity::Medium);
        assert_eq!(Severity::banded(base, 99, 50), Severity::Medium);
        assert_eq!(Severity::banded(base, 100, 50), Severity::High);
        assert_eq!(Severity::banded(Severity::Low, 600, 500), Severity::Low);
        assert_eq!(Severity::banded(Severity::Low, 1000, 500), Severity::Medium);
        assert_eq!(Severity::banded(Severity::Low, 2000, 500), Severity::High);

        let mut last = Severity::Low;
        for value in 501..3000 {
            let severity = Severity::banded(Severity::Low, value, 500);
            assert!(severity >= last);
            last = severity;
        }
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in SmellKind::ALL {
            assert_eq!(SmellKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(SmellKind::parse("god_class"), None);
        assert!(!SmellKind::MissingDocstring.on_by_default());
    }

    #[test]
    fn test_report_order() {
        let finding = |severity, file: &str, line| SmellFinding {
            kind: SmellKind::DeepNesting,
            severity,
            file: file.to_string(),
            line: Some(line),
            symbol: None,
            message: String::new(),
            measurement: Measurement {
                value: 5,
                threshold: 4,
            },
            cycle: Vec::new(),
        };
        let mut findings = vec![
            finding(Severity::Low, "a.py", 1),
            finding(Severity::High, "b.py", 9),
            finding(Severity::High, "b.py", 2),
            finding(Severity::Medium, "a.py", 5),
        ];
        findings.sort_by(SmellFinding::report_order);
        let order: Vec<_> = findings.iter().map(|f| (f.severity, f.line)).collect();
        assert_eq!(
            order,
            vec![
                (Severity::High, Some(2)),
                (Severity::High, Some(9)),
                (Severity::Medium, Some(5)),
                (Severity::Low, Some(1)),
            ]
        );
    }
}
