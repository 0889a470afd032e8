//! Scroll-position to location-fragment synchronization.
//!
//! Observes which section headers currently intersect the viewport and
//! rewrites the location fragment to track the most relevant one, via a
//! history replacement that triggers neither navigation nor scrolling.
//!
//! The "active band" is the top quarter-to-half of the viewport: a header
//! whose position sits in or above that band is what the reader is looking
//! at. Among intersecting headers the observer picks the one closest above
//! the band floor; when none qualifies, the topmost intersecting header
//! wins unconditionally.
//!
//! The observer only starts once content has settled, writes the fragment
//! only on change, and is disconnected on teardown so a stale synchronizer
//! never acts on a newly mounted, unrelated document.

/// Viewport snapshot in document coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Scroll offset of the viewport top.
    pub scroll_y: f64,
    /// Viewport height.
    pub height: f64,
}

impl Viewport {
    /// Create a viewport snapshot.
    #[must_use]
    pub fn new(scroll_y: f64, height: f64) -> Self {
        Self { scroll_y, height }
    }

    fn bottom(self) -> f64 {
        self.scroll_y + self.height
    }
}

/// A header element carrying an identifier, positioned in document space.
///
/// Derived from the mounted document on each render pass; consumed only
/// here.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderAnchor {
    /// Anchor identifier (the fragment value).
    pub id: String,
    /// Document-space position of the header top.
    pub y: f64,
}

impl HeaderAnchor {
    /// Create an anchor.
    #[must_use]
    pub fn new(id: impl Into<String>, y: f64) -> Self {
        Self { id: id.into(), y }
    }
}

/// Active band placement as fractions of viewport height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandConfig {
    /// Band top, from the viewport top.
    pub top_fraction: f64,
    /// Band floor, from the viewport top.
    pub bottom_fraction: f64,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            top_fraction: 0.25,
            bottom_fraction: 0.5,
        }
    }
}

/// Sink for location-fragment rewrites.
///
/// Implementations perform a history replacement: no navigation, no scroll.
pub trait FragmentSink: Send + Sync {
    /// Replace the location fragment.
    fn replace_fragment(&self, fragment: &str);
}

/// No-op sink for hosts that do not track location state.
pub struct NullFragmentSink;

impl FragmentSink for NullFragmentSink {
    fn replace_fragment(&self, _fragment: &str) {}
}

/// Handler invoked when the reader requests a copy-link action for a
/// header. Passed in explicitly; never registered on any global scope.
pub type CopyLinkHandler = Box<dyn Fn(&str) + Send + Sync>;

/// Observes header positions against viewport snapshots and keeps the
/// location fragment in sync.
pub struct HeaderObserver {
    anchors: Vec<HeaderAnchor>,
    band: BandConfig,
    last_fragment: Option<String>,
    connected: bool,
    copy_link: Option<CopyLinkHandler>,
}

impl HeaderObserver {
    /// Create a connected observer over the given anchors.
    #[must_use]
    pub fn new(anchors: Vec<HeaderAnchor>) -> Self {
        Self {
            anchors,
            band: BandConfig::default(),
            last_fragment: None,
            connected: true,
            copy_link: None,
        }
    }

    /// Override the active band placement.
    #[must_use]
    pub fn with_band(mut self, band: BandConfig) -> Self {
        self.band = band;
        self
    }

    /// Attach a copy-link handler.
    #[must_use]
    pub fn with_copy_link(mut self, handler: CopyLinkHandler) -> Self {
        self.copy_link = Some(handler);
        self
    }

    /// Whether the observer is still connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Select the most relevant header for a viewport snapshot.
    ///
    /// Tie-break: among intersecting headers, the smallest non-negative
    /// distance above the band floor wins; with none qualifying, the
    /// topmost intersecting header wins.
    #[must_use]
    pub fn select(&self, viewport: Viewport) -> Option<&HeaderAnchor> {
        let intersecting: Vec<&HeaderAnchor> = self
            .anchors
            .iter()
            .filter(|a| a.y >= viewport.scroll_y && a.y <= viewport.bottom())
            .collect();

        let band_floor = viewport.scroll_y + viewport.height * self.band.bottom_fraction;

        intersecting
            .iter()
            .filter(|a| a.y <= band_floor)
            .min_by(|a, b| (band_floor - a.y).total_cmp(&(band_floor - b.y)))
            .copied()
            .or_else(|| {
                intersecting
                    .iter()
                    .min_by(|a, b| a.y.total_cmp(&b.y))
                    .copied()
            })
    }

    /// Process a scroll tick: select a header and rewrite the fragment when
    /// it changed. Redundant writes are suppressed; the sink never sees
    /// two consecutive identical fragments.
    pub fn observe(&mut self, viewport: Viewport, sink: &dyn FragmentSink) {
        if !self.connected {
            return;
        }
        let Some(selected) = self.select(viewport).map(|a| a.id.clone()) else {
            return;
        };
        if self.last_fragment.as_deref() == Some(selected.as_str()) {
            return;
        }
        tracing::debug!(fragment = %selected, "Fragment updated");
        sink.replace_fragment(&selected);
        self.last_fragment = Some(selected);
    }

    /// Invoke the copy-link handler for a header id.
    pub fn request_copy_link(&self, id: &str) {
        if let Some(handler) = &self.copy_link {
            handler(id);
        }
    }

    /// Disconnect the observer. A disconnected observer never writes again.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn written(&self) -> Vec<String> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl FragmentSink for RecordingSink {
        fn replace_fragment(&self, fragment: &str) {
            self.writes.lock().unwrap().push(fragment.to_owned());
        }
    }

    fn anchors() -> Vec<HeaderAnchor> {
        vec![
            HeaderAnchor::new("intro", 0.0),
            HeaderAnchor::new("setup", 400.0),
            HeaderAnchor::new("usage", 800.0),
            HeaderAnchor::new("faq", 1200.0),
        ]
    }

    #[test]
    fn test_select_header_nearest_band_floor() {
        let observer = HeaderObserver::new(anchors());
        // Viewport 0..1000, band floor at 500: intro (0) and setup (400)
        // are at or above the floor; setup is nearer to it.
        let selected = observer.select(Viewport::new(0.0, 1000.0)).unwrap();
        assert_eq!(selected.id, "setup");
    }

    #[test]
    fn test_select_topmost_when_none_in_band() {
        let observer = HeaderObserver::new(anchors());
        // Viewport 500..1500, band floor at 1000: usage (800) qualifies.
        // Shrink the band so nothing does: floor at 550, usage and faq both
        // below it -> topmost intersecting wins.
        let observer = observer.with_band(BandConfig {
            top_fraction: 0.0,
            bottom_fraction: 0.05,
        });
        let selected = observer.select(Viewport::new(500.0, 1000.0)).unwrap();
        assert_eq!(selected.id, "usage");
    }

    #[test]
    fn test_select_none_when_nothing_intersects() {
        let observer = HeaderObserver::new(anchors());
        assert!(observer.select(Viewport::new(5000.0, 500.0)).is_none());
    }

    #[test]
    fn test_observe_writes_on_change_only() {
        let mut observer = HeaderObserver::new(anchors());
        let sink = RecordingSink::default();

        observer.observe(Viewport::new(0.0, 1000.0), &sink);
        observer.observe(Viewport::new(10.0, 1000.0), &sink);
        observer.observe(Viewport::new(400.0, 1000.0), &sink);
        observer.observe(Viewport::new(410.0, 1000.0), &sink);

        assert_eq!(sink.written(), vec!["setup", "usage"]);
    }

    #[test]
    fn test_no_consecutive_identical_fragments() {
        let mut observer = HeaderObserver::new(anchors());
        let sink = RecordingSink::default();

        for step in 0..50 {
            observer.observe(Viewport::new(f64::from(step) * 30.0, 1000.0), &sink);
        }

        let writes = sink.written();
        assert!(!writes.is_empty());
        for pair in writes.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_no_selection_keeps_previous_fragment() {
        let mut observer = HeaderObserver::new(anchors());
        let sink = RecordingSink::default();

        observer.observe(Viewport::new(0.0, 1000.0), &sink);
        // Scroll past everything: nothing intersects, nothing is written.
        observer.observe(Viewport::new(5000.0, 500.0), &sink);

        assert_eq!(sink.written(), vec!["setup"]);
    }

    #[test]
    fn test_disconnected_observer_never_writes() {
        let mut observer = HeaderObserver::new(anchors());
        let sink = RecordingSink::default();

        observer.disconnect();
        observer.observe(Viewport::new(0.0, 1000.0), &sink);

        assert!(sink.written().is_empty());
        assert!(!observer.is_connected());
    }

    #[test]
    fn test_copy_link_handler_invoked() {
        let copied = std::sync::Arc::new(Mutex::new(Vec::<String>::new()));
        let sink_copies = std::sync::Arc::clone(&copied);
        let observer = HeaderObserver::new(anchors())
            .with_copy_link(Box::new(move |id| {
                sink_copies.lock().unwrap().push(id.to_owned());
            }));

        observer.request_copy_link("setup");

        assert_eq!(copied.lock().unwrap().clone(), vec!["setup"]);
    }

    #[test]
    fn test_header_exactly_on_band_floor_qualifies() {
        let observer = HeaderObserver::new(vec![HeaderAnchor::new("edge", 500.0)]);
        let selected = observer.select(Viewport::new(0.0, 1000.0)).unwrap();
        assert_eq!(selected.id, "edge");
    }
}
