//! Flat document catalog with slug lookups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Reserved slug segment for a scope's landing document.
pub const OVERVIEW_SEGMENT: &str = "_overview";

/// Catalog entry for a single document.
///
/// The slug is unique within the whole catalog and carries its scope as the
/// leading segment (`v1.2.0/getting-started`, `drafts/proposal-x`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    /// Unique identifier, `{version-or-state}/{path}`.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Free-form display grouping.
    #[serde(default)]
    pub category: String,
}

impl DocumentDescriptor {
    /// Create a descriptor with an empty category.
    #[must_use]
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            category: String::new(),
        }
    }

    /// Set the display category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// The slug without its leading scope segment.
    ///
    /// `v1.2.0/guide/setup` becomes `guide/setup`. A slug with no separator
    /// is returned unchanged.
    #[must_use]
    pub fn scoped_path(&self) -> &str {
        self.slug
            .split_once('/')
            .map_or(self.slug.as_str(), |(_, rest)| rest)
    }
}

/// Error type for catalog construction.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Two entries share a slug.
    #[error("duplicate slug in document index: {0}")]
    DuplicateSlug(String),
    /// Serialized catalog could not be parsed.
    #[error("invalid document index: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Versioned catalog mapping slugs to document descriptors.
///
/// Entries are stored in a flat `Vec` with a `HashMap` slug index, giving
/// O(1) exact lookups and linear scoped scans. Entry order is preserved and
/// meaningful: suffix matching returns the first entry in catalog order.
#[derive(Clone, Debug, Default)]
pub struct DocumentIndex {
    entries: Vec<DocumentDescriptor>,
    slug_index: HashMap<String, usize>,
}

impl DocumentIndex {
    /// Build a catalog from descriptor entries.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DuplicateSlug`] when two entries share a slug.
    pub fn from_entries(entries: Vec<DocumentDescriptor>) -> Result<Self, IndexError> {
        let mut slug_index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if slug_index.insert(entry.slug.clone(), i).is_some() {
                return Err(IndexError::DuplicateSlug(entry.slug.clone()));
            }
        }
        Ok(Self {
            entries,
            slug_index,
        })
    }

    /// Parse a catalog from its serialized JSON form (an array of entries).
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or duplicate slugs.
    pub fn from_json(json: &str) -> Result<Self, IndexError> {
        let entries: Vec<DocumentDescriptor> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact slug lookup.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&DocumentDescriptor> {
        self.slug_index.get(slug).map(|&i| &self.entries[i])
    }

    /// Iterate entries whose slug lives under `{scope}/`.
    pub fn scoped<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a DocumentDescriptor> {
        self.entries
            .iter()
            .filter(move |e| is_scope_of(&e.slug, scope))
    }

    /// First entry whose slug matches `suffix` after stripping the scope
    /// segment, in catalog order.
    ///
    /// Supports version-agnostic links: `guide/setup` finds
    /// `v1.2.0/guide/setup` regardless of which version published it.
    #[must_use]
    pub fn find_by_suffix(&self, suffix: &str) -> Option<&DocumentDescriptor> {
        self.entries.iter().find(|e| e.scoped_path() == suffix)
    }

    /// True when another entry's slug is nested beneath `slug`.
    ///
    /// Identifies directory-style landing documents whose physical layout
    /// puts the file inside its own directory.
    #[must_use]
    pub fn has_children(&self, slug: &str) -> bool {
        self.entries.iter().any(|e| is_scope_of(&e.slug, slug))
    }

    /// Landing descriptor for a scope.
    ///
    /// Returns the explicit `{scope}/_overview` entry when present, otherwise
    /// synthesizes one titled `{scope} Overview`.
    #[must_use]
    pub fn overview_for(&self, scope: &str) -> DocumentDescriptor {
        let slug = format!("{scope}/{OVERVIEW_SEGMENT}");
        self.get(&slug).cloned().unwrap_or_else(|| {
            DocumentDescriptor::new(slug, format!("{scope} Overview")).with_category(scope)
        })
    }
}

/// True when `slug` is strictly nested beneath `scope`.
fn is_scope_of(slug: &str, scope: &str) -> bool {
    slug.strip_prefix(scope)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_index() -> DocumentIndex {
        DocumentIndex::from_entries(vec![
            DocumentDescriptor::new("v1.2.0/getting-started", "Getting Started"),
            DocumentDescriptor::new("v1.2.0/guide/setup", "Setup").with_category("guide"),
            DocumentDescriptor::new("v1.2.0/guide/setup/advanced", "Advanced Setup"),
            DocumentDescriptor::new("v1.0.0/guide/setup", "Setup (old)"),
            DocumentDescriptor::new("drafts/_overview", "Draft Documents"),
            DocumentDescriptor::new("drafts/proposal-x", "Proposal X"),
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_lookup() {
        let index = sample_index();
        let doc = index.get("v1.2.0/getting-started").unwrap();
        assert_eq!(doc.title, "Getting Started");
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let result = DocumentIndex::from_entries(vec![
            DocumentDescriptor::new("v1/guide", "Guide"),
            DocumentDescriptor::new("v1/guide", "Guide again"),
        ]);
        assert!(matches!(result, Err(IndexError::DuplicateSlug(_))));
    }

    #[test]
    fn test_scoped_iteration() {
        let index = sample_index();
        let drafts: Vec<_> = index.scoped("drafts").map(|e| e.slug.as_str()).collect();
        assert_eq!(drafts, vec!["drafts/_overview", "drafts/proposal-x"]);
    }

    #[test]
    fn test_scoped_does_not_match_sibling_prefix() {
        let index = DocumentIndex::from_entries(vec![
            DocumentDescriptor::new("v1/guide", "Guide"),
            DocumentDescriptor::new("v10/guide", "Guide ten"),
        ])
        .unwrap();
        let v1: Vec<_> = index.scoped("v1").map(|e| e.slug.as_str()).collect();
        assert_eq!(v1, vec!["v1/guide"]);
    }

    #[test]
    fn test_suffix_match_first_in_catalog_order() {
        let index = sample_index();
        let doc = index.find_by_suffix("guide/setup").unwrap();
        assert_eq!(doc.slug, "v1.2.0/guide/setup");
    }

    #[test]
    fn test_suffix_match_none() {
        let index = sample_index();
        assert!(index.find_by_suffix("guide/teardown").is_none());
    }

    #[test]
    fn test_has_children() {
        let index = sample_index();
        assert!(index.has_children("v1.2.0/guide/setup"));
        assert!(!index.has_children("v1.2.0/getting-started"));
    }

    #[test]
    fn test_overview_explicit_entry() {
        let index = sample_index();
        let doc = index.overview_for("drafts");
        assert_eq!(doc.title, "Draft Documents");
        assert_eq!(doc.slug, "drafts/_overview");
    }

    #[test]
    fn test_overview_synthesized() {
        let index = sample_index();
        let doc = index.overview_for("proposals");
        assert_eq!(doc.title, "proposals Overview");
        assert_eq!(doc.slug, "proposals/_overview");
        assert_eq!(doc.category, "proposals");
    }

    #[test]
    fn test_overview_is_deterministic() {
        let index = sample_index();
        assert_eq!(index.overview_for("drafts"), index.overview_for("drafts"));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"slug": "v1/guide", "title": "Guide", "category": "basics"},
            {"slug": "v1/api", "title": "API"}
        ]"#;
        let index = DocumentIndex::from_json(json).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("v1/api").unwrap().category, "");
    }

    #[test]
    fn test_scoped_path_strips_scope() {
        let doc = DocumentDescriptor::new("v1.2.0/guide/setup", "Setup");
        assert_eq!(doc.scoped_path(), "guide/setup");
    }
}
