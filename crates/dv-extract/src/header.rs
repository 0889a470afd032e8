//! Document metadata header parsing.
//!
//! Documents may open with a fenced metadata header delimited by `---`
//! lines. The header feeds the metadata publisher; it never reaches the
//! renderer.

use serde::{Deserialize, Serialize};

/// Parsed metadata header fields.
///
/// All fields are optional; unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocHeader {
    /// Page title override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Page description for metadata publication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Comma-separated keyword list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

impl DocHeader {
    /// Parse a header from its YAML body.
    ///
    /// Empty content yields a default instance; malformed YAML is an error
    /// the caller degrades on.
    pub(crate) fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(trimmed)
    }
}

/// Split a metadata header off the front of the text.
///
/// Returns `(header_yaml, body)` when the text opens with a `---` fence that
/// is properly terminated. An unterminated fence returns `None`: the text is
/// left unmodified rather than truncated.
pub(crate) fn split_header(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("---")?;
    let rest = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}
