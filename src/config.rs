//! Scan configuration.
//!
//! A [`Config`] is what the user wrote (YAML file plus command-line
//! overrides); [`Config::validate`] turns it into the immutable [`Settings`]
//! every stage reads. Validation is the only place a scan can fail fatally.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::detect::SmellKind;
use crate::error::ConfigError;

/// Config file names looked up in the project root, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["treemap.yaml", ".treemap.yaml"];

/// Directory names never descended into.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "__pycache__",
    "venv",
    ".venv",
    "env",
    "dist",
    "build",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    ".next",
    ".nuxt",
    "target",
    "out",
    ".eggs",
    "*.egg-info",
    ".claude",
    ".idea",
    ".vscode",
    "coverage",
    "htmlcov",
    "vendor",
];

pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_PARSE_TIMEOUT_MS: u64 = 5_000;

/// Default contents written by `treemap init`.
pub const DEFAULT_CONFIG_YAML: &str = include_str!("templates/treemap.yaml");

/// Threshold values as written; validated into [`Thresholds`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ThresholdOverrides {
    #[serde(default)]
    pub type_methods: Option<i64>,
    #[serde(default)]
    pub function_lines: Option<i64>,
    #[serde(default)]
    pub nesting_depth: Option<i64>,
    #[serde(default)]
    pub parameters: Option<i64>,
    #[serde(default)]
    pub file_lines: Option<i64>,
}

/// User configuration, before validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
    /// Smell kinds to suppress entirely.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Opt-in smell kinds to turn on.
    #[serde(default)]
    pub enabled: Vec<String>,
    /// Extra directory-name globs to skip during discovery.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub max_file_bytes: Option<u64>,
    /// Per-file parse budget; `0` disables the timeout.
    #[serde(default)]
    pub parse_timeout_ms: Option<u64>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::parse_str(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn parse_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(content)
    }

    /// Find a config file in `root`.
    pub fn discover(root: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    /// Check every value and produce the settings a scan runs with.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let defaults = Thresholds::default();
        let t = &self.thresholds;
        let thresholds = Thresholds {
            type_methods: positive("type_methods", t.type_methods, defaults.type_methods)?,
            function_lines: positive("function_lines", t.function_lines, defaults.function_lines)?,
            nesting_depth: positive("nesting_depth", t.nesting_depth, defaults.nesting_depth)?,
            parameters: positive("parameters", t.parameters, defaults.parameters)?,
            file_lines: positive("file_lines", t.file_lines, defaults.file_lines)?,
        };

        let enabled = parse_kinds(&self.enabled)?;
        let disabled = parse_kinds(&self.disabled)?;
        let active = SmellKind::ALL
            .into_iter()
            .filter(|k| k.on_by_default() || enabled.contains(k))
            .filter(|k| !disabled.contains(k))
            .collect();

        let max_file_bytes = self.max_file_bytes.unwrap_or(DEFAULT_MAX_FILE_BYTES);
        if max_file_bytes == 0 {
            return Err(ConfigError::ZeroSizeCeiling);
        }
        let parse_timeout = match self.parse_timeout_ms.unwrap_or(DEFAULT_PARSE_TIMEOUT_MS) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        Ok(Settings {
            thresholds,
            active,
            excludes: Excludes::new(&self.exclude)?,
            max_file_bytes,
            parse_timeout,
        })
    }
}

fn positive(name: &'static str, value: Option<i64>, default: usize) -> Result<usize, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) if v > 0 => Ok(v as usize),
        Some(v) => Err(ConfigError::NonPositiveThreshold { name, value: v }),
    }
}

fn parse_kinds(names: &[String]) -> Result<BTreeSet<SmellKind>, ConfigError> {
    names
        .iter()
        .map(|name| {
            SmellKind::parse(name.trim()).ok_or_else(|| ConfigError::UnknownSmellKind(name.clone()))
        })
        .collect()
}

/// Validated per-rule thresholds. A rule fires when a measurement is
/// strictly greater than its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub type_methods: usize,
    pub function_lines: usize,
    pub nesting_depth: usize,
    pub parameters: usize,
    pub file_lines: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            type_methods: 15,
            function_lines: 50,
            nesting_depth: 4,
            parameters: 5,
            file_lines: 500,
        }
    }
}

/// Directory-name exclusion globs, defaults first.
#[derive(Debug, Clone)]
pub struct Excludes {
    patterns: Vec<String>,
    set: GlobSet,
}

impl Excludes {
    fn new(extra: &[String]) -> Result<Self, ConfigError> {
        let patterns: Vec<String> = DEFAULT_EXCLUDES
            .iter()
            .map(|p| p.to_string())
            .chain(extra.iter().map(|p| p.trim().trim_end_matches('/').to_string()))
            .filter(|p| !p.is_empty())
            .collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidExclude {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| ConfigError::InvalidExclude {
            pattern: patterns.join(", "),
            source,
        })?;
        Ok(Self { patterns, set })
    }

    /// Whether a directory with this name is skipped.
    pub fn matches(&self, dir_name: &str) -> bool {
        self.set.is_match(dir_name)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Immutable settings shared by every stage of one scan.
#[derive(Debug, Clone)]
pub struct Settings {
    pub thresholds: Thresholds,
    /// Smell kinds that run.
    pub active: BTreeSet<SmellKind>,
    pub excludes: Excludes,
    pub max_file_bytes: u64,
    pub parse_timeout: Option<Duration>,
}

impl Settings {
    pub fn is_active(&self, kind: SmellKind) -> bool {
        self.active.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
thresholds:
  function_lines: 80
  parameters: 7
disabled: [deep_nesting]
enabled: [missing_docstring]
exclude: [fixtures, "*.generated"]
max_file_bytes: 2048
parse_timeout_ms: 0
"#;
        let config = Config::parse_str(yaml).unwrap();
        let settings = config.validate().unwrap();
        assert_eq!(settings.thresholds.function_lines, 80);
        assert_eq!(settings.thresholds.parameters, 7);
        assert_eq!(settings.thresholds.type_methods, 15);
        assert!(!settings.is_active(SmellKind::DeepNesting));
        assert!(settings.is_active(SmellKind::MissingDocstring));
        assert!(settings.is_active(SmellKind::ImportCycle));
        assert!(settings.excludes.matches("fixtures"));
        assert!(settings.excludes.matches("api.generated"));
        assert!(settings.excludes.matches("node_modules"));
        assert!(settings.excludes.matches("pkg.egg-info"));
        assert!(!settings.excludes.matches("src"));
        assert_eq!(settings.max_file_bytes, 2048);
        assert_eq!(settings.parse_timeout, None);
    }

    #[test]
    fn test_defaults() {
        let settings = Config::default().validate().unwrap();
        assert_eq!(settings.thresholds, Thresholds::default());
        assert!(!settings.is_active(SmellKind::MissingDocstring));
        assert_eq!(settings.active.len(), SmellKind::ALL.len() - 1);
        assert_eq!(settings.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert_eq!(settings.parse_timeout, Some(Duration::from_millis(5_000)));
    }

    #[test]
    fn test_default_template_is_valid() {
        let config = Config::parse_str(DEFAULT_CONFIG_YAML).unwrap();
        let settings = config.validate().unwrap();
        assert_eq!(settings.thresholds, Thresholds::default());
    }

    #[test]
    fn test_rejects_nonsense() {
        let mut config = Config::default();
        config.thresholds.nesting_depth = Some(-1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveThreshold {
                name: "nesting_depth",
                value: -1
            })
        ));

        let mut config = Config::default();
        config.thresholds.file_lines = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.disabled = vec!["god_object".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::UnknownSmellKind(_))));

        let mut config = Config::default();
        config.max_file_bytes = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroSizeCeiling)));

        let mut config = Config::default();
        config.exclude = vec!["[unclosed".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::InvalidExclude { .. })));
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = Config::parse_str("  \n").unwrap();
        assert!(config.validate().is_ok());
    }
}
