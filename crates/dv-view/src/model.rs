//! Navigation requests and the current document view model.

use dv_mount::MountedDocument;

use crate::publish::BreadcrumbItem;

/// A single browser navigation, created per navigation event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationRequest {
    /// Ordered path components.
    pub segments: Vec<String>,
}

impl NavigationRequest {
    /// Build a request from a slash-separated path.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    /// The segments joined back into a path.
    #[must_use]
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

/// The single current-document view model.
///
/// Replaced wholesale by each completed navigation; a load session is fully
/// superseded by the next one.
#[derive(Clone, Debug, Default)]
pub struct ViewModel {
    /// Session stamp of the navigation that produced this model.
    pub generation: u64,
    /// Display title.
    pub title: String,
    /// Whether base content is available for display.
    pub content_ready: bool,
    /// Whether content has settled and may be revealed.
    pub content_visible: bool,
    /// The mounted (and reconciled) document.
    pub document: MountedDocument,
    /// Video reference ids, rendered as trailing blocks.
    pub videos: Vec<String>,
    /// Example reference ids, rendered as trailing blocks.
    pub examples: Vec<String>,
    /// Breadcrumb trail for the navigational path.
    pub breadcrumbs: Vec<BreadcrumbItem>,
    /// Warnings accumulated through the pipeline.
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_splits_segments() {
        let request = NavigationRequest::from_path("guide/setup");
        assert_eq!(request.segments, vec!["guide", "setup"]);
        assert_eq!(request.path(), "guide/setup");
    }

    #[test]
    fn test_from_path_ignores_empty_segments() {
        let request = NavigationRequest::from_path("/guide//setup/");
        assert_eq!(request.segments, vec!["guide", "setup"]);
    }

    #[test]
    fn test_empty_path() {
        let request = NavigationRequest::from_path("");
        assert!(request.segments.is_empty());
        assert_eq!(request.path(), "");
    }
}
