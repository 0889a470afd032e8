//! Document catalog and version context for docview.
//!
//! The catalog is a flat list of [`DocumentDescriptor`] entries with an O(1)
//! slug lookup, scoped iteration, and suffix matching. It is consumed by the
//! path resolver; it owns no fetching or rendering behavior.
//!
//! # Scopes
//!
//! Documents are organized by version (`v1.2.0/guide`) or by lifecycle state
//! (`drafts/proposal-x`), never both. The leading slug segment is the scope.
//! A scope's landing document uses the reserved `_overview` slug segment; when
//! no explicit entry exists, one is synthesized.

mod index;
mod version;

pub use index::{DocumentDescriptor, DocumentIndex, IndexError, OVERVIEW_SEGMENT};
pub use version::VersionContext;
