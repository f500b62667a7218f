//! Paper catalog
//!
//! Maps the logical paper identifiers used by the host to document sources.

use std::collections::BTreeMap;

/// Papers known without any configuration
pub const BUILTIN_PAPERS: &[(&str, &str)] = &[
    (
        "meta-symbolic-language",
        "./towards-a-universal-meta-symbolic-language.pdf",
    ),
    (
        "symbolic-languages",
        "./universal-symbolic-languages-bridging-human-cognition-and-ai-consciousness.pdf",
    ),
];

/// Identifier → source mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperCatalog {
    papers: BTreeMap<String, String>,
}

impl Default for PaperCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PaperCatalog {
    /// Catalog without any papers
    pub fn empty() -> Self {
        Self {
            papers: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for (id, source) in BUILTIN_PAPERS {
            catalog.insert(id, source);
        }
        catalog
    }

    pub fn insert(&mut self, id: &str, source: &str) {
        self.papers.insert(id.to_string(), source.to_string());
    }

    /// Source of paper `id`
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.papers.get(id).map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.papers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// Merge `id=source,id=source` entries over this catalog.
    /// Malformed entries are skipped.
    pub fn with_overrides(mut self, entries: &str) -> Self {
        for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((id, source)) if !id.trim().is_empty() && !source.trim().is_empty() => {
                    self.insert(id.trim(), source.trim());
                }
                _ => tracing::warn!(entry = %entry, "Ignoring malformed catalog entry"),
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_papers() {
        let catalog = PaperCatalog::default();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.resolve("meta-symbolic-language"),
            Some("./towards-a-universal-meta-symbolic-language.pdf")
        );
        assert!(catalog.resolve("symbolic-languages").unwrap().ends_with("consciousness.pdf"));
        assert_eq!(catalog.resolve("unknown"), None);
    }

    #[test]
    fn test_overrides_merge() {
        let catalog = PaperCatalog::builtin().with_overrides(
            " meta-symbolic-language = https://example.org/msl.pdf , extra=/srv/extra.pdf",
        );

        assert_eq!(catalog.resolve("meta-symbolic-language"), Some("https://example.org/msl.pdf"));
        assert_eq!(catalog.resolve("extra"), Some("/srv/extra.pdf"));
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_malformed_overrides_skipped() {
        let catalog = PaperCatalog::empty().with_overrides("novalue,=nokey,ok=a.pdf,,x=");
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["ok"]);
    }

    #[test]
    fn test_source_with_equals_sign() {
        let catalog = PaperCatalog::empty().with_overrides("q=https://example.org/get?id=7");
        assert_eq!(catalog.resolve("q"), Some("https://example.org/get?id=7"));
    }
}
