//! Version and lifecycle-state context.

use serde::{Deserialize, Serialize};

/// Snapshot of the version registry, read-only to the view engine.
///
/// `available_states` lists lifecycle buckets (e.g. `drafts`, `proposals`)
/// that are orthogonal to versions: a document lives under exactly one of
/// the two kinds of scope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionContext {
    /// Version the reader is currently browsing.
    pub current_version: String,
    /// All published version identifiers.
    pub available_versions: Vec<String>,
    /// All lifecycle-state identifiers.
    pub available_states: Vec<String>,
}

impl VersionContext {
    /// Create a context with a current version and no states.
    #[must_use]
    pub fn new(current_version: impl Into<String>) -> Self {
        let current_version = current_version.into();
        Self {
            available_versions: vec![current_version.clone()],
            current_version,
            available_states: Vec::new(),
        }
    }

    /// Add available versions.
    #[must_use]
    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_versions = versions.into_iter().map(Into::into).collect();
        self
    }

    /// Add lifecycle states.
    #[must_use]
    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_states = states.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether `id` names a known lifecycle state.
    #[must_use]
    pub fn is_state(&self, id: &str) -> bool {
        self.available_states.iter().any(|s| s == id)
    }

    /// Check whether `id` names a known version.
    #[must_use]
    pub fn is_version(&self, id: &str) -> bool {
        self.available_versions.iter().any(|v| v == id)
    }
}
