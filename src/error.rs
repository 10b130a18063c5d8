//! Error types.
//!
//! `ConfigError` aborts a run before any file is read. `FileError` is
//! recovered per file and lands in the report's skipped list.

use thiserror::Error;

/// Configuration problems. These are the only fatal conditions of a scan and
/// are reported before any source file is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Threshold `{name}` must be a positive integer, got {value}")]
    NonPositiveThreshold { name: &'static str, value: i64 },

    #[error("Unknown smell kind: {0}")]
    UnknownSmellKind(String),

    #[error("max_file_bytes must be greater than zero")]
    ZeroSizeCeiling,

    #[error("Invalid exclude pattern `{pattern}`: {source}")]
    InvalidExclude {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Root is not a directory: {0}")]
    InvalidRoot(String),
}

/// Per-file failures. A scan records these and moves on.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Binary content in {path}")]
    Binary { path: String },

    #[error("{path} is {bytes} bytes, above the {limit} byte limit")]
    TooLarge { path: String, bytes: u64, limit: u64 },
}

impl FileError {
    /// Project-relative path of the failing file.
    pub fn path(&self) -> &str {
        match self {
            FileError::Unreadable { path, .. }
            | FileError::Binary { path }
            | FileError::TooLarge { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ConfigError::NonPositiveThreshold {
            name: "function_lines",
            value: -3,
        };
        assert_eq!(
            err.to_string(),
            "Threshold `function_lines` must be a positive integer, got -3"
        );

        let err = FileError::TooLarge {
            path: "big.py".to_string(),
            bytes: 10,
            limit: 5,
        };
        assert_eq!(err.path(), "big.py");
        assert!(err.to_string().contains("above the 5 byte limit"));
    }
}
