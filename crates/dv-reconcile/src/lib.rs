//! Rendered block reconciliation for docview.
//!
//! Once a renderer has mounted the placeholder-laden base content, the
//! [`Reconciler`] locates each placeholder in the live tree and replaces it
//! with its rendered unit, exactly once per token. Rendering is delegated to
//! a [`BlockRenderer`] registry; a failure there degrades that one block and
//! never the page.

mod registry;
mod reconciler;

pub use reconciler::{ReconcileReport, Reconciler, ReconcilerState};
pub use registry::{BlockRenderer, RenderUnitError, RenderedUnit};
