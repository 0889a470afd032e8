//! Navigational path resolution for docview.
//!
//! Turns a raw navigational path plus the current [`VersionContext`] into a
//! concrete document fetch plan. Resolution never fails: every miss folds
//! into a deterministic fallback path so the caller always has something to
//! fetch.
//!
//! # Resolution order (first match wins)
//!
//! 1. The path *is* a lifecycle state → that state's overview document.
//! 2. The path *starts with* a state → exact slug in that state, then the
//!    path's own `_overview` entry.
//! 3. The path *is* a version → that version's overview document.
//! 4. Otherwise the path is version-scoped: exact slug under the current
//!    version (a redundant leading `{currentVersion}/` is tolerated), then a
//!    suffix match across the whole catalog for version-agnostic links.
//! 5. No match → `{currentVersion}/{path}`; a context with no current
//!    version falls back to the configured production version prefix.

use dv_index::{DocumentDescriptor, DocumentIndex, VersionContext};

/// Configuration for path resolution.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Physical prefix under which documents are served.
    pub fetch_root: String,
    /// Version prefix used when the context carries no current version.
    pub production_version: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_root: "assets/docs".to_owned(),
            production_version: "stable".to_owned(),
        }
    }
}

/// Physical fetch plan for a resolved document.
///
/// `primary` is probed first; when it fails to fetch, `fallback` (if any) is
/// probed before degrading to not-found content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchPlan {
    /// Preferred fetch path.
    pub primary: String,
    /// Second-chance fetch path for directory-style documents.
    pub fallback: Option<String>,
}

/// Outcome of resolving a navigational path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Matched or synthesized descriptor. `None` when resolution fell
    /// through to a raw fallback path.
    pub descriptor: Option<DocumentDescriptor>,
    /// Physical fetch plan.
    pub fetch: FetchPlan,
}

/// Internal error folded into the production fallback; never surfaced.
#[derive(Debug, thiserror::Error)]
enum ResolveError {
    #[error("version context has no current version")]
    NoCurrentVersion,
}

/// Resolve a navigational path into a fetch plan.
///
/// Never fails; see the module docs for the resolution ladder.
#[must_use]
pub fn resolve(
    raw_path: &str,
    ctx: &VersionContext,
    index: &DocumentIndex,
    config: &ResolverConfig,
) -> Resolution {
    let path = normalize(raw_path);

    match try_resolve(path, ctx, index, config) {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Path resolution failed, using production fallback");
            Resolution {
                descriptor: None,
                fetch: raw_plan(config, &config.production_version, path),
            }
        }
    }
}

fn try_resolve(
    path: &str,
    ctx: &VersionContext,
    index: &DocumentIndex,
    config: &ResolverConfig,
) -> Result<Resolution, ResolveError> {
    // A state's landing page: "drafts" -> drafts/_overview.
    if ctx.is_state(path) {
        tracing::debug!(path = %path, "Resolved as state overview");
        return Ok(from_descriptor(index.overview_for(path), index, config));
    }

    // State-scoped document: exact slug, then the path's own overview entry.
    if let Some(state) = leading_segment(path).filter(|s| ctx.is_state(s)) {
        if let Some(doc) = index.scoped(state).find(|e| e.slug == path) {
            tracing::debug!(path = %path, state = %state, "Resolved in state scope");
            return Ok(from_descriptor(doc.clone(), index, config));
        }
        if let Some(doc) = index.get(&format!("{path}/{}", dv_index::OVERVIEW_SEGMENT)) {
            tracing::debug!(path = %path, "Resolved as nested state overview");
            return Ok(from_descriptor(doc.clone(), index, config));
        }
    }

    // A version's landing page: "v1.2.0" -> v1.2.0/_overview.
    if ctx.is_version(path) {
        tracing::debug!(path = %path, "Resolved as version overview");
        return Ok(from_descriptor(index.overview_for(path), index, config));
    }

    let current = ctx.current_version.as_str();
    if current.is_empty() {
        return Err(ResolveError::NoCurrentVersion);
    }

    // An empty path is the root navigation: land on the current version's
    // overview.
    if path.is_empty() {
        return Ok(from_descriptor(index.overview_for(current), index, config));
    }

    // Version-scoped document. Links may carry a redundant version prefix.
    let rel = path.strip_prefix(&format!("{current}/")).unwrap_or(path);

    if let Some(doc) = index.get(&format!("{current}/{rel}")) {
        tracing::debug!(path = %path, "Resolved by exact slug");
        return Ok(from_descriptor(doc.clone(), index, config));
    }

    // Version-agnostic second chance: match by path with the version segment
    // ignored. First catalog entry wins, which can pick another version's
    // document when two versions share a tail path.
    if let Some(doc) = index.find_by_suffix(rel) {
        tracing::debug!(path = %path, slug = %doc.slug, "Resolved by suffix match");
        return Ok(from_descriptor(doc.clone(), index, config));
    }

    tracing::debug!(path = %path, "No catalog match, using current-version fallback");
    Ok(Resolution {
        descriptor: None,
        fetch: raw_plan(config, current, path),
    })
}

/// Map a descriptor's slug to its physical fetch plan.
///
/// A document with nested children in the catalog is laid out
/// directory-style: `{slug}/{lastSegment}.md` is probed first, with the flat
/// `{slug}.md` as fallback. All other documents fetch the flat path directly.
fn from_descriptor(
    descriptor: DocumentDescriptor,
    index: &DocumentIndex,
    config: &ResolverConfig,
) -> Resolution {
    let slug = &descriptor.slug;
    let fetch = if index.has_children(slug) {
        let last = slug.rsplit('/').next().unwrap_or(slug);
        FetchPlan {
            primary: format!("{}/{slug}/{last}.md", config.fetch_root),
            fallback: Some(format!("{}/{slug}.md", config.fetch_root)),
        }
    } else {
        FetchPlan {
            primary: format!("{}/{slug}.md", config.fetch_root),
            fallback: None,
        }
    };

    Resolution {
        descriptor: Some(descriptor),
        fetch,
    }
}

fn raw_plan(config: &ResolverConfig, version: &str, path: &str) -> FetchPlan {
    FetchPlan {
        primary: format!("{}/{version}/{path}.md", config.fetch_root),
        fallback: None,
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

fn leading_segment(path: &str) -> Option<&str> {
    path.split_once('/').map(|(first, _)| first)
}
