//! The reconciliation state machine.

use std::time::Duration;

use dv_extract::{BlockKind, ExtractedBlock};
use dv_mount::{
    Element, MountSignal, MountedDocument, Node, node_at_path_mut, replace_comment_marker,
    replace_first_text,
};

use crate::registry::{BlockRenderer, RenderedUnit};

/// Default bound on waiting for base content to mount.
const DEFAULT_MOUNT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default pause before revealing content, letting layout stabilize.
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Reconciliation lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcilerState {
    /// Base content not yet mounted.
    Waiting,
    /// Placeholders are being replaced.
    Reconciling,
    /// All blocks processed; content may be revealed.
    Settled,
}

/// Counters from one reconciliation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Placeholders replaced with rendered units.
    pub replaced: usize,
    /// Blocks whose placeholder was never found.
    pub skipped: usize,
    /// Blocks whose render call failed.
    pub failed: usize,
    /// Whether the mount wait expired before the renderer signaled.
    pub mount_timed_out: bool,
}

/// Splices rendered units into mounted content.
///
/// Runs `Waiting → Reconciling → Settled`, replacing each placeholder at
/// most once. Inline text placeholders are handled first in discovery order;
/// after the settle delay, diagram comment markers are resolved and media
/// units are appended as trailing blocks.
pub struct Reconciler {
    state: ReconcilerState,
    mount_timeout: Duration,
    settle_delay: Duration,
}

impl Reconciler {
    /// Create a reconciler in the `Waiting` state with default timing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ReconcilerState::Waiting,
            mount_timeout: DEFAULT_MOUNT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Set the bound on waiting for the mount signal.
    #[must_use]
    pub fn with_mount_timeout(mut self, timeout: Duration) -> Self {
        self.mount_timeout = timeout;
        self
    }

    /// Set the settle delay before content is revealed.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    /// Jump straight to `Settled` without a reconciliation pass.
    ///
    /// Used when the pipeline substitutes fallback content: there are no
    /// placeholders to resolve, and the page must become visible at once.
    pub fn skip_to_settled(&mut self) {
        self.state = ReconcilerState::Settled;
    }

    /// Run the full reconciliation pass over `document`.
    ///
    /// Waits for the mount signal (bounded; proceeds anyway on expiry so the
    /// pipeline never stalls indefinitely), replaces placeholders from
    /// `blocks` in discovery order, and settles.
    pub async fn run(
        &mut self,
        document: &mut MountedDocument,
        signal: &MountSignal,
        registry: &dyn BlockRenderer,
        blocks: &[ExtractedBlock],
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        report.mount_timed_out = !signal.wait_mounted(self.mount_timeout).await;
        if report.mount_timed_out {
            tracing::warn!(
                timeout_ms = self.mount_timeout.as_millis(),
                "Mount signal never fired, reconciling anyway"
            );
        }
        if !document.is_mounted() {
            tracing::debug!("Container has no children; placeholders will be skipped");
        }
        self.state = ReconcilerState::Reconciling;

        // Inline phase: text placeholders, discovery order.
        for block in blocks.iter().filter(|b| b.kind == BlockKind::CodeSample) {
            if let Some(unit) = render_block(registry, block, &mut report).await {
                let replaced = replace_placeholder(document, block, wrap(block.kind, unit));
                record_placement(block, replaced, &mut report);
            }
        }

        tokio::time::sleep(self.settle_delay).await;

        // Settle phase: diagrams sit behind comment markers, since their
        // block-level containers strip plain text nodes.
        for block in blocks.iter().filter(|b| b.kind == BlockKind::Diagram) {
            if let Some(unit) = render_block(registry, block, &mut report).await {
                let replaced = replace_placeholder(document, block, wrap(block.kind, unit));
                record_placement(block, replaced, &mut report);
            }
        }

        // Media references are positional-at-end: appended in list order.
        for block in blocks
            .iter()
            .filter(|b| b.kind == BlockKind::MediaReference)
        {
            if let Some(unit) = render_block(registry, block, &mut report).await {
                document.root.children.push(wrap(block.kind, unit));
                report.replaced += 1;
            }
        }

        self.state = ReconcilerState::Settled;
        report
    }
}

async fn render_block(
    registry: &dyn BlockRenderer,
    block: &ExtractedBlock,
    report: &mut ReconcileReport,
) -> Option<RenderedUnit> {
    match registry.render(block).await {
        Ok(unit) => Some(unit),
        Err(e) => {
            tracing::warn!(token = %block.token, error = %e, "Block render failed");
            report.failed += 1;
            None
        }
    }
}

fn record_placement(block: &ExtractedBlock, replaced: bool, report: &mut ReconcileReport) {
    if replaced {
        report.replaced += 1;
    } else {
        tracing::debug!(token = %block.token, "Placeholder not found, block skipped");
        report.skipped += 1;
    }
}

/// Replace a block's placeholder node with `replacement`, at most once.
///
/// Prefers the node path the renderer captured at mount time; the node is
/// verified before replacement, so a path that is stale or already consumed
/// falls through to a tree walk. Renderers that record no paths get the walk
/// directly.
fn replace_placeholder(
    document: &mut MountedDocument,
    block: &ExtractedBlock,
    replacement: Node,
) -> bool {
    let token = block.token.as_str();

    if let Some(path) = document.placeholder_paths.get(token).cloned()
        && let Some(node) = node_at_path_mut(&mut document.root, &path)
        && is_placeholder_node(node, token, block.kind)
    {
        *node = replacement;
        return true;
    }

    match block.kind {
        BlockKind::Diagram => replace_comment_marker(&mut document.root, token, replacement),
        _ => replace_first_text(&mut document.root, token, replacement),
    }
}

/// Whether `node` still is the placeholder for `token`.
fn is_placeholder_node(node: &Node, token: &str, kind: BlockKind) -> bool {
    match node {
        Node::Comment(text) => kind == BlockKind::Diagram && text.trim() == token,
        Node::Text(text) => kind != BlockKind::Diagram && text.contains(token),
        Node::Element(_) => false,
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap a rendered unit in its container element.
fn wrap(kind: BlockKind, unit: RenderedUnit) -> Node {
    let (tag, class) = match kind {
        BlockKind::Diagram => ("figure", "diagram"),
        BlockKind::CodeSample => ("div", "code-sample"),
        BlockKind::MediaReference => ("aside", "media-reference"),
    };
    Node::Element(
        Element::new(tag)
            .with_attr("class", class)
            .with_attr("data-token", unit.token)
            .with_child(unit.artifact),
    )
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use dv_extract::extract;
    use dv_mount::{ContentRenderer, MarkdownMounter};

    use crate::registry::RenderUnitError;

    use super::*;

    /// Renders every block as a span holding its payload.
    struct StaticRenderer;

    #[async_trait]
    impl BlockRenderer for StaticRenderer {
        async fn render(&self, block: &ExtractedBlock) -> Result<RenderedUnit, RenderUnitError> {
            Ok(RenderedUnit {
                token: block.token.clone(),
                artifact: Node::Element(Element::new("span").with_text(&block.payload)),
            })
        }
    }

    /// Fails for one token, renders the rest.
    struct FailingRenderer {
        fail_token: String,
    }

    #[async_trait]
    impl BlockRenderer for FailingRenderer {
        async fn render(&self, block: &ExtractedBlock) -> Result<RenderedUnit, RenderUnitError> {
            if block.token == self.fail_token {
                return Err(RenderUnitError::new(&block.token, "boom"));
            }
            StaticRenderer.render(block).await
        }
    }

    fn reconciler() -> Reconciler {
        Reconciler::new().with_settle_delay(Duration::ZERO)
    }

    /// Extract + mount a raw document, returning everything a run needs.
    fn prepare(raw: &str) -> (MountedDocument, MountSignal, Vec<ExtractedBlock>) {
        let extraction = extract(raw);
        let signal = MountSignal::new();
        let document = MarkdownMounter::new().mount(&extraction.rewritten, &signal);
        let mut blocks = extraction.blocks;
        blocks.extend(document.code_blocks.clone());
        (document, signal, blocks)
    }

    #[tokio::test]
    async fn test_replaces_every_diagram_exactly_once() {
        let raw = "```mermaid\nfirst\n```\n\ntext\n\n```mermaid\nsecond\n```\n";
        let (mut document, signal, blocks) = prepare(raw);
        let mut reconciler = reconciler();

        let report = reconciler
            .run(&mut document, &signal, &StaticRenderer, &blocks)
            .await;

        assert_eq!(report.replaced, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(reconciler.state(), ReconcilerState::Settled);

        let text = document.root.text_content();
        assert!(text.contains("first"));
        assert!(text.contains("second"));
    }

    #[tokio::test]
    async fn test_code_placeholder_replaced_inline() {
        let raw = "before\n\n```rust\nfn main() {}\n```\n\nafter\n";
        let (mut document, signal, blocks) = prepare(raw);

        reconciler()
            .run(&mut document, &signal, &StaticRenderer, &blocks)
            .await;

        let text = document.root.text_content();
        assert!(!text.contains("BLOCK_CODE_0"));
        assert!(text.contains("fn main() {}"));
        // Inline: the rendered code sits between the surrounding paragraphs,
        // not appended at the end.
        assert!(text.find("fn main()").unwrap() < text.find("after").unwrap());
    }

    #[tokio::test]
    async fn test_media_units_appended_as_trailers() {
        let raw = "body text\n\n<docs-video id=\"vid-1\"/>\n";
        let (mut document, signal, blocks) = prepare(raw);

        reconciler()
            .run(&mut document, &signal, &StaticRenderer, &blocks)
            .await;

        let Node::Element(last) = document.root.children.last().unwrap() else {
            panic!("expected trailing element");
        };
        assert_eq!(last.tag, "aside");
        assert_eq!(last.attrs.get("data-token"), Some(&"BLOCK_MEDIA_0".to_owned()));
        assert_eq!(last.text_content(), "vid-1");
    }

    #[tokio::test]
    async fn test_one_failing_block_does_not_stop_others() {
        let raw = "```mermaid\nfirst\n```\n\n```mermaid\nsecond\n```\n";
        let (mut document, signal, blocks) = prepare(raw);
        let registry = FailingRenderer {
            fail_token: "BLOCK_DIAGRAM_0".to_owned(),
        };

        let report = reconciler()
            .run(&mut document, &signal, &registry, &blocks)
            .await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.replaced, 1);
        assert!(document.root.text_content().contains("second"));
    }

    #[tokio::test]
    async fn test_missing_placeholder_skipped_without_error() {
        let raw = "plain text only\n";
        let (mut document, signal, _) = prepare(raw);
        let orphan = vec![ExtractedBlock::new(
            BlockKind::CodeSample,
            "BLOCK_CODE_7",
            "nothing",
        )];

        let report = reconciler()
            .run(&mut document, &signal, &StaticRenderer, &orphan)
            .await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.replaced, 0);
    }

    #[tokio::test]
    async fn test_mount_timeout_proceeds_anyway() {
        let raw = "```mermaid\nlate\n```\n";
        let extraction = extract(raw);
        // Mount without firing the shared signal: simulate a renderer that
        // attached content but never reported it.
        let document_signal = MountSignal::new();
        let mut document = MarkdownMounter::new().mount(&extraction.rewritten, &document_signal);
        let silent = MountSignal::new();

        let mut reconciler = Reconciler::new()
            .with_mount_timeout(Duration::from_millis(5))
            .with_settle_delay(Duration::ZERO);
        let report = reconciler
            .run(&mut document, &silent, &StaticRenderer, &extraction.blocks)
            .await;

        assert!(report.mount_timed_out);
        assert_eq!(report.replaced, 1);
        assert_eq!(reconciler.state(), ReconcilerState::Settled);
    }

    #[tokio::test]
    async fn test_failed_block_leaves_marker_in_place() {
        let raw = "```mermaid\nonly\n```\n";
        let (mut document, signal, blocks) = prepare(raw);
        let registry = FailingRenderer {
            fail_token: "BLOCK_DIAGRAM_0".to_owned(),
        };

        reconciler()
            .run(&mut document, &signal, &registry, &blocks)
            .await;

        // The comment marker is still there for inspection; the page shows
        // everything else.
        let has_marker = document.root.children.iter().any(|n| match n {
            Node::Element(el) => el
                .children
                .iter()
                .any(|c| matches!(c, Node::Comment(t) if t == "BLOCK_DIAGRAM_0")),
            _ => false,
        });
        assert!(has_marker);
    }

    #[tokio::test]
    async fn test_stale_path_falls_back_to_walk() {
        let raw = "```mermaid\nonly\n```\n";
        let (mut document, signal, blocks) = prepare(raw);
        // Invalidate the captured path: the walk must still find the marker.
        document
            .placeholder_paths
            .insert("BLOCK_DIAGRAM_0".to_owned(), vec![40, 2]);

        let report = reconciler()
            .run(&mut document, &signal, &StaticRenderer, &blocks)
            .await;

        assert_eq!(report.replaced, 1);
        assert!(document.root.text_content().contains("only"));
    }

    #[test]
    fn test_skip_to_settled() {
        let mut reconciler = Reconciler::new();
        assert_eq!(reconciler.state(), ReconcilerState::Waiting);
        reconciler.skip_to_settled();
        assert_eq!(reconciler.state(), ReconcilerState::Settled);
    }
}
