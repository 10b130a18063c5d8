//! Lookup structure over the project's file set, used by import resolvers.

use std::collections::{BTreeMap, HashMap};

/// Immutable index of project-relative paths (`/`-separated).
///
/// Built once from the complete file list before any resolution runs, so a
/// resolver never depends on the order in which files are processed.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    paths: Vec<String>,
    by_path: HashMap<String, usize>,
    by_dir: BTreeMap<String, Vec<usize>>,
}

impl FileIndex {
    /// Index the given paths; position in the slice is the file index.
    pub fn new<S: AsRef<str>>(paths: &[S]) -> Self {
        let mut index = Self::default();
        for (i, path) in paths.iter().enumerate() {
            let path = path.as_ref().to_string();
            index
                .by_dir
                .entry(parent_dir(&path).to_string())
                .or_default()
                .push(i);
            index.by_path.insert(path.clone(), i);
            index.paths.push(path);
        }
        for files in index.by_dir.values_mut() {
            files.sort_by(|a, b| index.paths[*a].cmp(&index.paths[*b]));
        }
        index
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Path of a file index.
    pub fn path(&self, idx: usize) -> &str {
        &self.paths[idx]
    }

    /// Exact lookup of a normalized path.
    pub fn lookup(&self, path: &str) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    /// First path in `candidates` that exists.
    pub fn first_of<I, S>(&self, candidates: I) -> Option<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        candidates.into_iter().find_map(|c| self.lookup(c.as_ref()))
    }

    /// Files directly inside `dir`, sorted by path.
    pub fn dir_files(&self, dir: &str) -> &[usize] {
        self.by_dir.get(dir).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All directories holding at least one file.
    pub fn dirs(&self) -> impl Iterator<Item = &str> {
        self.by_dir.keys().map(String::as_str)
    }

    /// A file equal to `suffix` or ending in `/suffix`.
    ///
    /// The shortest match wins, then the lexicographically first one.
    pub fn find_suffix(&self, suffix: &str) -> Option<usize> {
        if suffix.is_empty() {
            return None;
        }
        let tail = format!("/{}", suffix);
        self.paths
            .iter()
            .enumerate()
            .filter(|(_, p)| p.as_str() == suffix || p.ends_with(&tail))
            .min_by(|(_, a), (_, b)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .map(|(i, _)| i)
    }
}

/// Directory part of a relative path (`""` for files at the root).
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// File name part of a relative path.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

/// Join and normalize `base` and `rel`, resolving `.` and `..`.
///
/// Returns `None` when `..` climbs above the project root.
pub fn join(base: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for part in rel.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join("src/app", "./util").as_deref(), Some("src/app/util"));
        assert_eq!(join("src/app", "../lib/x").as_deref(), Some("src/lib/x"));
        assert_eq!(join("", "a/b").as_deref(), Some("a/b"));
        assert_eq!(join("src", "../../x"), None);
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent_dir("a/b/c.py"), "a/b");
        assert_eq!(parent_dir("c.py"), "");
        assert_eq!(file_name("a/b/c.py"), "c.py");
    }

    #[test]
    fn test_lookup_and_dirs() {
        let index = FileIndex::new(&["pkg/b.py", "pkg/a.py", "main.py"]);
        assert_eq!(index.lookup("pkg/a.py"), Some(1));
        assert_eq!(index.lookup("missing.py"), None);
        let in_pkg: Vec<_> = index.dir_files("pkg").iter().map(|i| index.path(*i)).collect();
        assert_eq!(in_pkg, vec!["pkg/a.py", "pkg/b.py"]);
        assert_eq!(index.dir_files("").len(), 1);
    }

    #[test]
    fn test_find_suffix_prefers_shortest() {
        let index = FileIndex::new(&["src/deep/pkg/mod.py", "src/pkg/mod.py", "xpkg/mod.py"]);
        let found = index.find_suffix("pkg/mod.py").map(|i| index.path(i));
        assert_eq!(found, Some("src/pkg/mod.py"));
        assert_eq!(index.find_suffix(""), None);
    }
}
