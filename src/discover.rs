//! File discovery.
//!
//! Walks the project root without following symlinks, prunes excluded
//! directories by name, and classifies every remaining file as a candidate
//! (some adapter handles it), unsupported (tallied per extension) or skipped
//! (unreadable or over the size ceiling).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::analysis::{registry, LanguageAdapter};
use crate::config::Settings;
use crate::error::FileError;

/// Bytes read from an extensionless file to find its `#!` line.
const SHEBANG_SNIFF_BYTES: usize = 256;

/// Key used when tallying files without an extension.
pub const NO_EXTENSION: &str = "(none)";

/// A file some adapter can extract.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Project-relative path with `/` separators.
    pub rel: String,
    pub adapter: &'static LanguageAdapter,
}

/// Why a file was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Binary,
    TooLarge { bytes: u64, limit: u64 },
    Unreadable { error: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Binary => write!(f, "binary"),
            SkipReason::TooLarge { bytes, limit } => {
                write!(f, "too large ({} bytes, limit {})", bytes, limit)
            }
            SkipReason::Unreadable { error } => write!(f, "unreadable: {}", error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

impl From<&FileError> for SkippedFile {
    fn from(err: &FileError) -> Self {
        let reason = match err {
            FileError::Binary { .. } => SkipReason::Binary,
            FileError::TooLarge { bytes, limit, .. } => SkipReason::TooLarge {
                bytes: *bytes,
                limit: *limit,
            },
            FileError::Unreadable { source, .. } => SkipReason::Unreadable {
                error: source.to_string(),
            },
        };
        Self {
            path: err.path().to_string(),
            reason,
        }
    }
}

/// Outcome of walking the project root.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Sorted by relative path.
    pub candidates: Vec<Candidate>,
    pub skipped: Vec<SkippedFile>,
    /// Files no adapter handles, per lowercase extension.
    pub unsupported: BTreeMap<String, usize>,
}

/// Relative path of `path` under `root`, `/`-separated.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn first_line(path: &Path) -> std::io::Result<String> {
    let mut buf = Vec::with_capacity(SHEBANG_SNIFF_BYTES);
    File::open(path)?
        .take(SHEBANG_SNIFF_BYTES as u64)
        .read_to_end(&mut buf)?;
    let line = buf.split(|b| *b == b'\n').next().unwrap_or(&[]);
    Ok(String::from_utf8_lossy(line).into_owned())
}

/// Walk `root` and classify its files.
pub fn discover(root: &Path, settings: &Settings) -> Discovery {
    let mut discovery = Discovery::default();
    let registry = registry();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !settings.excludes.matches(&e.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let rel = e
                    .path()
                    .map(|p| relative_path(root, p))
                    .unwrap_or_else(|| relative_path(root, root));
                warn!(path = %rel, error = %e, "skipping unreadable entry");
                discovery.skipped.push(SkippedFile {
                    path: rel,
                    reason: SkipReason::Unreadable {
                        error: e.to_string(),
                    },
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let rel = relative_path(root, path);
        let extension = path.extension().map(|e| e.to_string_lossy().to_lowercase());

        let adapter = match &extension {
            Some(ext) => registry.for_extension(ext),
            None => match first_line(path) {
                Ok(line) => registry.for_shebang(&line),
                Err(e) => {
                    warn!(path = %rel, error = %e, "skipping unreadable file");
                    discovery.skipped.push(SkippedFile {
                        path: rel,
                        reason: SkipReason::Unreadable {
                            error: e.to_string(),
                        },
                    });
                    continue;
                }
            },
        };
        let Some(adapter) = adapter else {
            let key = extension.unwrap_or_else(|| NO_EXTENSION.to_string());
            *discovery.unsupported.entry(key).or_insert(0) += 1;
            continue;
        };

        match entry.metadata() {
            Ok(meta) if meta.len() > settings.max_file_bytes => {
                warn!(path = %rel, bytes = meta.len(), "skipping file above size ceiling");
                discovery.skipped.push(SkippedFile {
                    path: rel,
                    reason: SkipReason::TooLarge {
                        bytes: meta.len(),
                        limit: settings.max_file_bytes,
                    },
                });
            }
            Ok(_) => discovery.candidates.push(Candidate {
                path: path.to_path_buf(),
                rel,
                adapter,
            }),
            Err(e) => {
                warn!(path = %rel, error = %e, "skipping unreadable file");
                discovery.skipped.push(SkippedFile {
                    path: rel,
                    reason: SkipReason::Unreadable {
                        error: e.to_string(),
                    },
                });
            }
        }
    }

    discovery.candidates.sort_by(|a, b| a.rel.cmp(&b.rel));
    discovery.skipped.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(
        candidates = discovery.candidates.len(),
        skipped = discovery.skipped.len(),
        unsupported = discovery.unsupported.values().sum::<usize>(),
        "discovery finished"
    );
    discovery
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::config::Config;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn rels(discovery: &Discovery) -> Vec<&str> {
        discovery.candidates.iter().map(|c| c.rel.as_str()).collect()
    }

    #[test]
    fn test_sorted_candidates_and_default_excludes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/b.py", "x = 1\n");
        write(root, "src/a.py", "x = 1\n");
        write(root, "a.py", "x = 1\n");
        write(root, "node_modules/lib/index.js", "module.exports = 1;\n");
        write(root, ".git/hooks/pre-commit.py", "pass\n");
        write(root, "pkg.egg-info/setup.py", "pass\n");
        write(root, ".claude/hooks/notify.py", "pass\n");
        write(root, "README.md", "# readme\n");
        write(root, "Makefile", "all:\n");

        let settings = Config::default().validate().unwrap();
        let discovery = discover(root, &settings);
        assert_eq!(rels(&discovery), vec!["a.py", "src/a.py", "src/b.py"]);
        assert_eq!(discovery.unsupported.get("md"), Some(&1));
        assert_eq!(discovery.unsupported.get(NO_EXTENSION), Some(&1));
        assert!(discovery.skipped.is_empty());
    }

    #[test]
    fn test_user_excludes_and_shebang() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "fixtures/case.py", "x = 1\n");
        write(root, "bin/tool", "#!/usr/bin/env python3\nprint('hi')\n");
        write(root, "bin/run", "#!/bin/sh\necho hi\n");

        let config = Config {
            exclude: vec!["fixtures".to_string()],
            ..Default::default()
        };
        let settings = config.validate().unwrap();
        let discovery = discover(root, &settings);
        assert_eq!(rels(&discovery), vec!["bin/tool"]);
        assert_eq!(discovery.candidates[0].adapter.tag, "python");
        assert_eq!(discovery.unsupported.get(NO_EXTENSION), Some(&1));
    }

    #[test]
    fn test_size_ceiling() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "big.py", &"x = 1\n".repeat(100));
        write(root, "small.py", "x = 1\n");

        let config = Config {
            max_file_bytes: Some(64),
            ..Default::default()
        };
        let settings = config.validate().unwrap();
        let discovery = discover(root, &settings);
        assert_eq!(rels(&discovery), vec!["small.py"]);
        assert_eq!(
            discovery.skipped,
            vec![SkippedFile {
                path: "big.py".to_string(),
                reason: SkipReason::TooLarge {
                    bytes: 600,
                    limit: 64
                },
            }]
        );
    }

    #[test]
    fn test_relative_path() {
        let root = Path::new("/tmp/project");
        assert_eq!(
            relative_path(root, Path::new("/tmp/project/src/app.py")),
            "src/app.py"
        );
    }
}
