//! The sequential extraction pass.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::blocks::{BlockKind, ExtractedBlock, diagram_token, media_token};
use crate::header::{DocHeader, split_header};

static DIAGRAM_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^```([A-Za-z][A-Za-z0-9_-]*)([^\n]*)$\n(.*?)^```[ \t]*$").unwrap()
});

static MEDIA_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<docs-(video|example)\s+id\s*=\s*"([^"]*)"\s*/>"#).unwrap()
});

/// Result of extracting rich content from raw document text.
#[derive(Clone, Debug, Default)]
pub struct Extraction {
    /// Document text with diagram fences replaced by placeholder tokens and
    /// media tags removed.
    pub rewritten: String,
    /// Parsed metadata header, when present and well-formed.
    pub header: Option<DocHeader>,
    /// Extracted blocks in discovery order.
    pub blocks: Vec<ExtractedBlock>,
    /// Video reference ids in document order.
    pub videos: Vec<String>,
    /// Example reference ids in document order.
    pub examples: Vec<String>,
    /// Warnings accumulated during extraction.
    pub warnings: Vec<String>,
}

/// Whether a fence info language names a diagram.
///
/// Accepts a `kroki-` prefix for compatibility with existing documents.
#[must_use]
pub fn is_diagram_language(lang: &str) -> bool {
    let lang = lang.strip_prefix("kroki-").unwrap_or(lang);
    matches!(
        lang,
        "plantuml"
            | "c4plantuml"
            | "mermaid"
            | "graphviz"
            | "dot"
            | "ditaa"
            | "erd"
            | "nomnoml"
            | "svgbob"
            | "wavedrom"
    )
}

/// Extract rich content regions from raw document text.
///
/// The pass is strictly sequential: the metadata header is stripped first,
/// diagram fences are tokenized second, media-reference tags are collected
/// and removed last. Code fences are left in the text; the mounter allocates
/// their placeholders under the same token contract.
#[must_use]
pub fn extract(raw: &str) -> Extraction {
    let mut warnings = Vec::new();

    let (header, body) = match split_header(raw) {
        Some((yaml, body)) => match DocHeader::from_yaml(yaml) {
            Ok(header) => (Some(header), body),
            Err(e) => {
                warnings.push(format!("metadata header ignored: {e}"));
                (None, body)
            }
        },
        None => (None, raw),
    };

    let (rewritten, mut blocks) = extract_diagrams(body, &mut warnings);
    let (rewritten, videos, examples) = extract_media(&rewritten, &mut blocks);

    tracing::debug!(
        blocks = blocks.len(),
        videos = videos.len(),
        examples = examples.len(),
        "Extraction completed"
    );

    Extraction {
        rewritten,
        header,
        blocks,
        videos,
        examples,
        warnings,
    }
}

/// Replace diagram fences with placeholder tokens, in textual order.
///
/// Fences with a non-diagram language pass through untouched, as does an
/// unterminated fence (which the regex simply never matches).
fn extract_diagrams(body: &str, warnings: &mut Vec<String>) -> (String, Vec<ExtractedBlock>) {
    let mut out = String::with_capacity(body.len());
    let mut blocks = Vec::new();
    let mut last = 0;
    let mut n = 0;

    for cap in DIAGRAM_FENCE.captures_iter(body) {
        let matched = cap.get(0).expect("regex match has a full capture");
        let lang = &cap[1];
        if !is_diagram_language(lang) {
            continue;
        }

        let token = diagram_token(n);
        let attrs = parse_fence_attrs(cap[2].trim(), n, warnings);
        let payload = cap[3].trim_end().to_owned();

        let mut block = ExtractedBlock::new(BlockKind::Diagram, &token, payload);
        block.attrs = attrs;
        block.attrs.insert("language".to_owned(), lang.to_owned());
        blocks.push(block);

        out.push_str(&body[last..matched.start()]);
        out.push_str(&token);
        last = matched.end();
        n += 1;
    }

    out.push_str(&body[last..]);
    (out, blocks)
}

/// Parse `key=value` attributes from a fence info string.
///
/// A token without `=` is malformed; it is kept verbatim as a bare key so
/// nothing is silently dropped.
fn parse_fence_attrs(
    info: &str,
    index: usize,
    warnings: &mut Vec<String>,
) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for part in info.split_whitespace() {
        if let Some((key, value)) = part.split_once('=') {
            attrs.insert(key.to_owned(), value.trim_matches('"').to_owned());
        } else {
            warnings.push(format!(
                "diagram {index}: malformed attribute '{part}' kept verbatim"
            ));
            attrs.insert(part.to_owned(), String::new());
        }
    }
    attrs
}

/// Collect media-reference tags and remove them from the text.
///
/// Media references render as trailing blocks, not inline, so the tags do
/// not become placeholders; each still gets a token so its rendered unit has
/// an identity.
fn extract_media(
    body: &str,
    blocks: &mut Vec<ExtractedBlock>,
) -> (String, Vec<String>, Vec<String>) {
    let mut videos = Vec::new();
    let mut examples = Vec::new();

    for (n, cap) in MEDIA_TAG.captures_iter(body).enumerate() {
        let kind = &cap[1];
        let id = cap[2].to_owned();

        blocks.push(
            ExtractedBlock::new(BlockKind::MediaReference, media_token(n), &id)
                .with_attr("media", kind),
        );

        match kind {
            "video" => videos.push(id),
            _ => examples.push(id),
        }
    }

    let cleaned = MEDIA_TAG.replace_all(body, "").into_owned();
    (cleaned, videos, examples)
}
