//! Documentation page controller for docview.
//!
//! [`Viewer`] drives the whole pipeline: a navigational request is resolved
//! to a fetch plan, the raw document is fetched and extracted, the rewritten
//! text is mounted through the content renderer, rendered blocks are
//! reconciled back in, and the navigation synchronizer is activated once the
//! content settles.
//!
//! Navigation is the only cancellation trigger. Each request increments a
//! session counter whose value is captured at request start; every
//! asynchronous continuation re-checks its captured stamp against the
//! counter and silently discards stale work. Only the active session writes
//! the shared view model.

mod config;
mod fetch;
mod model;
mod publish;
mod viewer;

pub use config::ViewerConfig;
pub use fetch::{DocumentFetcher, FetchError, HttpFetcher, MemoryFetcher};
pub use model::{NavigationRequest, ViewModel};
pub use publish::{
    BreadcrumbItem, BreadcrumbPublisher, DefaultBreadcrumbs, MetadataPublisher,
    NullMetadataPublisher, PageMeta,
};
pub use viewer::{FALLBACK_TITLE, NavigationOutcome, Viewer};
