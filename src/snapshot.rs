//! Repository-state marker captured once at the start of a scan.

use std::fmt;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const UNVERSIONED: &str = "unversioned";

/// The repository state a report describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Snapshot {
    Commit { hash: String, subject: String },
    Unversioned,
}

impl Snapshot {
    /// Read the latest commit of the repository holding `root`.
    ///
    /// Falls back to [`Snapshot::Unversioned`] when git is missing or `root`
    /// is not inside a work tree.
    pub fn capture(root: &Path) -> Self {
        match last_commit(root) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => Snapshot::Unversioned,
            Err(e) => {
                debug!(error = %e, "git unavailable, scan is unversioned");
                Snapshot::Unversioned
            }
        }
    }

    /// Short marker for headings, e.g. `3f2a9c1 Fix parser`.
    pub fn marker(&self) -> String {
        match self {
            Snapshot::Commit { hash, subject } => {
                let short = hash.get(..7).unwrap_or(hash);
                format!("{} {}", short, subject)
            }
            Snapshot::Unversioned => UNVERSIONED.to_string(),
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

fn last_commit(root: &Path) -> std::io::Result<Option<Snapshot>> {
    let output = Command::new("git")
        .args(["log", "-1", "--format=%H %s"])
        .current_dir(root)
        .output()?;
    if !output.status.success() {
        return Ok(None);
    }
    Ok(parse_log_line(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_log_line(line: &str) -> Option<Snapshot> {
    let line = line.trim();
    let (hash, subject) = line.split_once(' ').unwrap_or((line, ""));
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(Snapshot::Commit {
        hash: hash.to_string(),
        subject: subject.to_string(),
    })
}
