//! Block render registry seam.

use async_trait::async_trait;

use dv_extract::ExtractedBlock;
use dv_mount::Node;

/// A renderable unit produced for one extracted block.
///
/// Ownership transfers to the reconciler, which is responsible for final
/// placement in the mounted tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedUnit {
    /// Token of the block this unit was rendered from.
    pub token: String,
    /// Paintable artifact to splice into the tree.
    pub artifact: Node,
}

/// Error from rendering a single block.
///
/// Callers catch and log these; one failing block leaves its placeholder in
/// place and never prevents the others from reconciling.
#[derive(Debug, thiserror::Error)]
#[error("block {token} failed to render: {message}")]
pub struct RenderUnitError {
    /// Token of the failing block.
    pub token: String,
    /// Human-readable cause.
    pub message: String,
}

impl RenderUnitError {
    /// Create an error for a block token.
    #[must_use]
    pub fn new(token: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            message: message.into(),
        }
    }
}

/// Registry turning extracted blocks into renderable units.
///
/// Callable independently per block and may suspend; implementations report
/// failures as errors rather than panicking.
#[async_trait]
pub trait BlockRenderer: Send + Sync {
    /// Render one extracted block.
    async fn render(&self, block: &ExtractedBlock) -> Result<RenderedUnit, RenderUnitError>;
}
