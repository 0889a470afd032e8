//! The page controller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use dv_extract::{Extraction, extract};
use dv_index::{DocumentIndex, VersionContext};
use dv_mount::{ContentRenderer, MountSignal};
use dv_navsync::{FragmentSink, HeaderAnchor, HeaderObserver, NullFragmentSink, Viewport};
use dv_reconcile::{BlockRenderer, Reconciler};
use dv_resolver::{FetchPlan, Resolution, resolve};

use crate::config::ViewerConfig;
use crate::fetch::DocumentFetcher;
use crate::model::{NavigationRequest, ViewModel};
use crate::publish::{
    BreadcrumbItem, BreadcrumbPublisher, DefaultBreadcrumbs, MetadataPublisher,
    NullMetadataPublisher, PageMeta, humanize,
};

/// Title of the substituted not-found document.
pub const FALLBACK_TITLE: &str = "Content Not Found";

/// Fixed document substituted when every fetch path fails.
const FALLBACK_CONTENT: &str =
    "# Content Not Found\n\nContent not found. The document you requested does not exist or \
     failed to load.\n";

/// Outcome of a navigation request.
#[derive(Clone, Debug)]
pub enum NavigationOutcome {
    /// The document settled and the view model was installed.
    Ready(Arc<ViewModel>),
    /// A newer navigation arrived mid-flight; this session's work was
    /// discarded.
    Superseded,
}

/// Documentation page controller.
///
/// Owns the single current-document view model. One `Viewer` serves many
/// sequential navigations; concurrent navigations race and the newest wins.
pub struct Viewer {
    index: Arc<DocumentIndex>,
    ctx: VersionContext,
    fetcher: Arc<dyn DocumentFetcher>,
    renderer: Arc<dyn ContentRenderer>,
    registry: Arc<dyn BlockRenderer>,
    metadata: Arc<dyn MetadataPublisher>,
    breadcrumbs: Arc<dyn BreadcrumbPublisher>,
    fragment_sink: Arc<dyn FragmentSink>,
    copy_link: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    config: ViewerConfig,
    /// Session counter; incremented once per navigation.
    generation: AtomicU64,
    model: RwLock<Arc<ViewModel>>,
    observer: Mutex<Option<HeaderObserver>>,
}

impl Viewer {
    /// Create a viewer over the given collaborators.
    #[must_use]
    pub fn new(
        index: Arc<DocumentIndex>,
        ctx: VersionContext,
        fetcher: Arc<dyn DocumentFetcher>,
        renderer: Arc<dyn ContentRenderer>,
        registry: Arc<dyn BlockRenderer>,
    ) -> Self {
        Self {
            index,
            ctx,
            fetcher,
            renderer,
            registry,
            metadata: Arc::new(NullMetadataPublisher),
            breadcrumbs: Arc::new(DefaultBreadcrumbs),
            fragment_sink: Arc::new(NullFragmentSink),
            copy_link: None,
            config: ViewerConfig::default(),
            generation: AtomicU64::new(0),
            model: RwLock::new(Arc::new(ViewModel::default())),
            observer: Mutex::new(None),
        }
    }

    /// Override the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ViewerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the metadata publisher.
    #[must_use]
    pub fn with_metadata_publisher(mut self, publisher: Arc<dyn MetadataPublisher>) -> Self {
        self.metadata = publisher;
        self
    }

    /// Set the breadcrumb publisher.
    #[must_use]
    pub fn with_breadcrumb_publisher(mut self, publisher: Arc<dyn BreadcrumbPublisher>) -> Self {
        self.breadcrumbs = publisher;
        self
    }

    /// Set the location-fragment sink.
    #[must_use]
    pub fn with_fragment_sink(mut self, sink: Arc<dyn FragmentSink>) -> Self {
        self.fragment_sink = sink;
        self
    }

    /// Set the copy-link handler passed to each header observer.
    #[must_use]
    pub fn with_copy_link(mut self, handler: Arc<dyn Fn(&str) + Send + Sync>) -> Self {
        self.copy_link = Some(handler);
        self
    }

    /// Current view model snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn current_model(&self) -> Arc<ViewModel> {
        self.model.read().unwrap().clone()
    }

    /// Whether a header observer is currently active.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.observer.lock().unwrap().is_some()
    }

    /// Run the full load pipeline for a navigation request.
    ///
    /// Resolution, fetch, extraction, mounting, reconciliation, and
    /// navigation-sync activation. Never fails: every error degrades to
    /// showing something. Returns [`NavigationOutcome::Superseded`] when a
    /// newer navigation arrived mid-flight.
    pub async fn navigate(&self, request: &NavigationRequest) -> NavigationOutcome {
        let stamp = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Tear down the previous session's synchronizer before any
        // suspension point: a stale observer must never act on the document
        // this navigation is about to mount.
        if let Some(observer) = self.observer.lock().unwrap().take().as_mut() {
            observer.disconnect();
        }

        let path = request.path();
        tracing::debug!(path = %path, session = stamp, "Navigation started");

        // Breadcrumbs are consumed synchronously before content load.
        let crumbs = self.breadcrumbs.publish(&request.segments, &self.index);

        let resolution = resolve(&path, &self.ctx, &self.index, &self.config.resolver_config());

        let Some(raw) = self.fetch_with_fallback(&resolution.fetch).await else {
            return self.install_fallback(stamp, &path, crumbs);
        };
        if self.is_stale(stamp) {
            return NavigationOutcome::Superseded;
        }

        let extraction = extract(&raw);
        let resolved_title = resolved_title(&resolution, &extraction);
        self.metadata.publish(&PageMeta {
            title: resolved_title
                .clone()
                .unwrap_or_else(|| title_from_path(&path)),
            description: extraction.header.as_ref().and_then(|h| h.description.clone()),
            keywords: extraction.header.as_ref().and_then(|h| h.keywords.clone()),
            canonical_url: format!("/{path}"),
        });

        let signal = MountSignal::new();
        let mut document = self.renderer.mount(&extraction.rewritten, &signal);

        let mut blocks = extraction.blocks;
        blocks.extend(document.code_blocks.clone());

        let mut reconciler = Reconciler::new()
            .with_mount_timeout(self.config.mount_timeout)
            .with_settle_delay(self.config.settle_delay);
        let report = reconciler
            .run(&mut document, &signal, self.registry.as_ref(), &blocks)
            .await;
        if self.is_stale(stamp) {
            tracing::debug!(path = %path, session = stamp, "Navigation superseded during reconciliation");
            return NavigationOutcome::Superseded;
        }
        tracing::debug!(
            path = %path,
            replaced = report.replaced,
            skipped = report.skipped,
            failed = report.failed,
            "Document settled"
        );

        let title = resolved_title
            .or_else(|| document.headings.first().map(|h| h.title.clone()))
            .unwrap_or_else(|| title_from_path(&path));
        let model = Arc::new(ViewModel {
            generation: stamp,
            title,
            content_ready: true,
            content_visible: true,
            document,
            videos: extraction.videos,
            examples: extraction.examples,
            breadcrumbs: crumbs,
            warnings: extraction.warnings,
        });
        self.install(stamp, model)
    }

    /// Activate navigation sync with measured header positions.
    ///
    /// The host supplies document-space positions once layout is known.
    /// `generation` must be the stamp of the view model the anchors were
    /// measured against; a stale stamp is rejected so a slow layout pass
    /// cannot attach an observer to a newer document.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn attach_anchors(&self, generation: u64, anchors: Vec<HeaderAnchor>) -> bool {
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(session = generation, "Stale anchor attach rejected");
            return false;
        }

        let mut observer = HeaderObserver::new(anchors);
        if let Some(handler) = &self.copy_link {
            let handler = Arc::clone(handler);
            observer = observer.with_copy_link(Box::new(move |id| handler(id)));
        }
        *self.observer.lock().unwrap() = Some(observer);
        true
    }

    /// Feed a viewport snapshot to the active observer.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn on_scroll(&self, viewport: Viewport) {
        if let Some(observer) = self.observer.lock().unwrap().as_mut() {
            observer.observe(viewport, self.fragment_sink.as_ref());
        }
    }

    /// Invoke the copy-link action for a header id.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn copy_link(&self, id: &str) {
        if let Some(observer) = self.observer.lock().unwrap().as_ref() {
            observer.request_copy_link(id);
        }
    }

    fn is_stale(&self, stamp: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != stamp
    }

    /// Install a completed model if this session is still current.
    fn install(&self, stamp: u64, model: Arc<ViewModel>) -> NavigationOutcome {
        if self.is_stale(stamp) {
            return NavigationOutcome::Superseded;
        }
        *self.model.write().unwrap() = Arc::clone(&model);
        NavigationOutcome::Ready(model)
    }

    /// Substitute the fixed not-found document.
    ///
    /// Content becomes ready immediately and no reconciliation pass is
    /// attempted.
    fn install_fallback(
        &self,
        stamp: u64,
        path: &str,
        crumbs: Vec<BreadcrumbItem>,
    ) -> NavigationOutcome {
        tracing::warn!(path = %path, "All fetch paths failed, substituting not-found document");

        let signal = MountSignal::new();
        let document = self.renderer.mount(FALLBACK_CONTENT, &signal);

        self.metadata.publish(&PageMeta {
            title: FALLBACK_TITLE.to_owned(),
            description: None,
            keywords: None,
            canonical_url: format!("/{path}"),
        });

        let model = Arc::new(ViewModel {
            generation: stamp,
            title: FALLBACK_TITLE.to_owned(),
            content_ready: true,
            content_visible: true,
            document,
            videos: Vec::new(),
            examples: Vec::new(),
            breadcrumbs: crumbs,
            warnings: Vec::new(),
        });
        self.install(stamp, model)
    }

    /// Fetch the plan's primary path, probing the fallback on failure.
    async fn fetch_with_fallback(&self, plan: &FetchPlan) -> Option<String> {
        match self.fetcher.fetch(&plan.primary).await {
            Ok(text) => Some(text),
            Err(primary_err) => {
                if let Some(fallback) = &plan.fallback {
                    tracing::debug!(
                        path = %plan.primary,
                        error = %primary_err,
                        "Primary fetch failed, probing flat layout"
                    );
                    match self.fetcher.fetch(fallback).await {
                        Ok(text) => return Some(text),
                        Err(e) => {
                            tracing::warn!(path = %fallback, error = %e, "Fallback fetch failed");
                        }
                    }
                } else {
                    tracing::warn!(path = %plan.primary, error = %primary_err, "Document fetch failed");
                }
                None
            }
        }
    }
}

/// Title from the document header or the resolved descriptor, header first.
fn resolved_title(resolution: &Resolution, extraction: &Extraction) -> Option<String> {
    extraction
        .header
        .as_ref()
        .and_then(|h| h.title.clone())
        .or_else(|| resolution.descriptor.as_ref().map(|d| d.title.clone()))
}

/// Display title derived from the path's final segment.
fn title_from_path(path: &str) -> String {
    match path.rsplit('/').next().filter(|s| !s.is_empty()) {
        Some(segment) => humanize(segment),
        None => FALLBACK_TITLE.to_owned(),
    }
}
