//! Metadata and breadcrumb publication seams.

use dv_index::DocumentIndex;
use serde::Serialize;

/// Page metadata handed to the publisher after extraction.
///
/// Fields come from the document metadata header when present, falling back
/// to the resolved descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    /// Page title.
    pub title: String,
    /// Page description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Comma-separated keywords.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Canonical URL path for the document.
    pub canonical_url: String,
}

/// Side-effecting sink for page metadata. Nothing is read back.
pub trait MetadataPublisher: Send + Sync {
    /// Publish metadata for the document being viewed.
    fn publish(&self, meta: &PageMeta);
}

/// Publisher that discards metadata.
pub struct NullMetadataPublisher;

impl MetadataPublisher for NullMetadataPublisher {
    fn publish(&self, _meta: &PageMeta) {}
}

/// Breadcrumb navigation item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BreadcrumbItem {
    /// Display title.
    pub title: String,
    /// Link target path.
    pub path: String,
}

/// Builds the display breadcrumb trail for a navigational path.
///
/// Consumed synchronously before content load begins.
pub trait BreadcrumbPublisher: Send + Sync {
    /// Build breadcrumbs for the path segments.
    fn publish(&self, segments: &[String], index: &DocumentIndex) -> Vec<BreadcrumbItem>;
}

/// Home-rooted breadcrumbs from path segments.
///
/// Ancestor titles come from the catalog when an entry matches the partial
/// path (version-agnostic), otherwise from the segment itself. The current
/// page is not included.
pub struct DefaultBreadcrumbs;

impl BreadcrumbPublisher for DefaultBreadcrumbs {
    fn publish(&self, segments: &[String], index: &DocumentIndex) -> Vec<BreadcrumbItem> {
        if segments.is_empty() {
            return Vec::new();
        }

        let mut crumbs = vec![BreadcrumbItem {
            title: "Home".to_owned(),
            path: String::new(),
        }];

        for (i, segment) in segments.iter().enumerate().take(segments.len() - 1) {
            let partial = segments[..=i].join("/");
            let title = index
                .get(&partial)
                .or_else(|| index.find_by_suffix(&partial))
                .map_or_else(|| humanize(segment), |doc| doc.title.clone());
            crumbs.push(BreadcrumbItem {
                title,
                path: partial,
            });
        }

        crumbs
    }
}

/// Turn a path segment into display text.
pub(crate) fn humanize(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut start_of_word = true;
    for c in segment.chars() {
        if c == '-' || c == '_' {
            out.push(' ');
            start_of_word = true;
        } else if start_of_word {
            out.extend(c.to_uppercase());
            start_of_word = false;
        } else {
            out.push(c);
        }
    }
    out
}
