//! Extracted block descriptors and placeholder tokens.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Token prefix for diagram placeholders.
pub const DIAGRAM_TOKEN_PREFIX: &str = "BLOCK_DIAGRAM_";

/// Token prefix for code sample placeholders (allocated by the mounter).
pub const CODE_TOKEN_PREFIX: &str = "BLOCK_CODE_";

/// Token prefix for media-reference blocks (trailing, never inline).
pub const MEDIA_TOKEN_PREFIX: &str = "BLOCK_MEDIA_";

/// Placeholder token for the nth diagram in discovery order.
#[must_use]
pub fn diagram_token(n: usize) -> String {
    format!("{DIAGRAM_TOKEN_PREFIX}{n}")
}

/// Placeholder token for the nth code sample in discovery order.
#[must_use]
pub fn code_token(n: usize) -> String {
    format!("{CODE_TOKEN_PREFIX}{n}")
}

/// Token identifying the nth media reference in discovery order.
#[must_use]
pub fn media_token(n: usize) -> String {
    format!("{MEDIA_TOKEN_PREFIX}{n}")
}

/// Kind of extracted content region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Fenced diagram source, replaced inline by a comment marker.
    Diagram,
    /// Fenced code sample, replaced inline by a text placeholder.
    CodeSample,
    /// Embedded media reference, rendered as a trailing block.
    MediaReference,
}

/// A content region pulled out of the document text.
///
/// Tokens are unique within one document and never reused across documents;
/// every token in the rewritten text has exactly one descriptor and vice
/// versa.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedBlock {
    /// Region kind.
    pub kind: BlockKind,
    /// Placeholder token identifying this block.
    pub token: String,
    /// Inner content: diagram source, code text, or media id.
    pub payload: String,
    /// Parsed `key=value` attributes from the fence info string.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, String>,
}

impl ExtractedBlock {
    /// Create a block with no attributes.
    #[must_use]
    pub fn new(kind: BlockKind, token: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
            payload: payload.into(),
            attrs: HashMap::new(),
        }
    }

    /// Attach an attribute.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}
