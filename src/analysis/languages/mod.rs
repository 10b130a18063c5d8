//! Language adapters.

mod go;
mod java;
mod javascript;
mod python;
mod ruby;
mod rust_lang;
mod typescript;

use super::adapter::LanguageAdapter;

/// Every supported language, in registration order.
///
/// Extension lookups take the first adapter claiming an extension, so no two
/// entries may share one.
pub fn all() -> Vec<LanguageAdapter> {
    vec![
        python::adapter(),
        javascript::adapter(),
        typescript::typescript(),
        typescript::tsx(),
        rust_lang::adapter(),
        go::adapter(),
        java::adapter(),
        ruby::adapter(),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_extensions_are_unique() {
        let mut seen = HashSet::new();
        for adapter in all() {
            for ext in adapter.extensions {
                assert!(seen.insert(*ext), "extension {} claimed twice", ext);
            }
        }
    }

    #[test]
    fn test_tags_are_unique() {
        let tags = crate::analysis::registry().tags();
        let unique: HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
        assert_eq!(tags.len(), 8);
    }
}
