//! Mounted content tree and markup mounting for docview.
//!
//! The generic markup renderer is an external collaborator; this crate
//! defines its seam. [`ContentRenderer::mount`] turns rewritten document
//! text into a [`MountedDocument`], a tree of element, text, and comment
//! nodes, and fires a [`MountSignal`] once the content is attached, which
//! replaces mount-detection polling with an explicit render-complete event.
//!
//! [`MarkdownMounter`] is the built-in renderer. During mounting it performs
//! the code-sample placeholder pass (each fenced code block becomes a
//! `BLOCK_CODE_{n}` text node plus an extracted descriptor) and converts
//! diagram placeholder text into comment markers, since diagram placeholders
//! often sit inside block containers that strip plain text nodes.

mod mounter;
mod node;
mod signal;

pub use mounter::{ContentRenderer, Heading, MarkdownMounter, MountedDocument};
pub use node::{
    Element, Node, NodePath, node_at_path_mut, replace_comment_marker, replace_first_text,
};
pub use signal::MountSignal;
