//! Markdown mounting onto the content tree.

use std::collections::HashMap;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

use dv_extract::{BlockKind, DIAGRAM_TOKEN_PREFIX, ExtractedBlock, code_token};

use crate::node::{Element, Node, NodePath};
use crate::signal::MountSignal;

/// Header element reference collected during mounting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor id.
    pub id: String,
}

/// Base content mounted by a renderer.
#[derive(Clone, Debug, Default)]
pub struct MountedDocument {
    /// Root container element.
    pub root: Element,
    /// Headings carrying anchor ids, in document order.
    pub headings: Vec<Heading>,
    /// Code samples extracted into text placeholders during mounting.
    pub code_blocks: Vec<ExtractedBlock>,
    /// Placeholder token to node path, captured as nodes are attached.
    ///
    /// Lets reconciliation jump straight to a placeholder instead of
    /// re-walking the tree per token. Paths are advisory: a consumer must
    /// still verify the node before replacing it.
    pub placeholder_paths: HashMap<String, NodePath>,
}

impl MountedDocument {
    /// Whether base content was attached.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.root.children.is_empty()
    }
}

/// The generic markup renderer seam.
///
/// Implementations turn rewritten document text into a mounted tree and fire
/// `signal` once the content is attached. The placeholder contract carries
/// through: code fences become unique, order-preserving `BLOCK_CODE_{n}`
/// text placeholders with matching [`ExtractedBlock`] descriptors.
pub trait ContentRenderer: Send + Sync {
    /// Mount rewritten text into a content tree.
    fn mount(&self, text: &str, signal: &MountSignal) -> MountedDocument;
}

/// Markdown renderer backed by `pulldown-cmark`.
///
/// Handles the common block and inline structure; format-specific concerns
/// stay out: diagram placeholder text becomes comment markers and code
/// fences become text placeholders, both resolved later by reconciliation.
pub struct MarkdownMounter {
    gfm: bool,
}

impl MarkdownMounter {
    /// Create a mounter with GFM enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GitHub Flavored Markdown extensions.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }
}

impl Default for MarkdownMounter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRenderer for MarkdownMounter {
    fn mount(&self, text: &str, signal: &MountSignal) -> MountedDocument {
        let mut builder = TreeBuilder::new();
        for event in Parser::new_ext(text, self.parser_options()) {
            builder.process_event(event);
        }
        let document = builder.finish();
        signal.notify_mounted();
        document
    }
}

/// Event-loop tree builder.
struct TreeBuilder {
    root: Element,
    stack: Vec<Element>,
    headings: Vec<Heading>,
    code_blocks: Vec<ExtractedBlock>,
    placeholder_paths: HashMap<String, NodePath>,
    code: Option<CodeCapture>,
    heading: Option<HeadingCapture>,
    image_alt: Option<String>,
    code_index: usize,
    used_ids: HashMap<String, usize>,
    in_table_head: bool,
}

struct CodeCapture {
    language: Option<String>,
    attrs: HashMap<String, String>,
    content: String,
}

struct HeadingCapture {
    level: u8,
    text: String,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            root: Element::new("article"),
            stack: Vec::new(),
            headings: Vec::new(),
            code_blocks: Vec::new(),
            placeholder_paths: HashMap::new(),
            code: None,
            heading: None,
            image_alt: None,
            code_index: 0,
            used_ids: HashMap::new(),
            in_table_head: false,
        }
    }

    fn finish(mut self) -> MountedDocument {
        // Unbalanced input: close anything still open.
        while !self.stack.is_empty() {
            self.close();
        }
        MountedDocument {
            root: self.root,
            headings: self.headings,
            code_blocks: self.code_blocks,
            placeholder_paths: self.placeholder_paths,
        }
    }

    fn open(&mut self, el: Element) {
        self.stack.push(el);
    }

    fn close(&mut self) {
        if let Some(el) = self.stack.pop() {
            self.append(Node::Element(el));
        }
    }

    fn append(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(top) => top.children.push(node),
            None => self.root.children.push(node),
        }
    }

    /// Index path the next appended node will occupy.
    ///
    /// Open elements are not yet attached to their parents, but their final
    /// index is already fixed: nothing else can be appended to a parent
    /// while its child is still open.
    fn next_path(&self) -> NodePath {
        let mut path = Vec::with_capacity(self.stack.len() + 1);
        let mut parent_len = self.root.children.len();
        for el in &self.stack {
            path.push(parent_len);
            parent_len = el.children.len();
        }
        path.push(parent_len);
        path
    }

    fn append_placeholder(&mut self, token: &str, node: Node) {
        self.placeholder_paths
            .insert(token.to_owned(), self.next_path());
        self.append(node);
    }

    fn append_text(&mut self, text: &str) {
        if let Some(capture) = &mut self.heading {
            capture.text.push_str(text);
        }
        if let Some(alt) = &mut self.image_alt {
            alt.push_str(text);
            return;
        }
        // Diagram placeholders mount as comment markers: they sit inside
        // block containers that strip plain text nodes.
        let trimmed = text.trim();
        if is_diagram_token(trimmed) {
            self.append_placeholder(trimmed, Node::Comment(trimmed.to_owned()));
        } else {
            self.append(Node::Text(text.to_owned()));
        }
    }

    fn unique_id(&mut self, title: &str) -> String {
        let base = slugify(title);
        let count = self.used_ids.entry(base.clone()).or_insert(0);
        let id = if *count == 0 {
            base.clone()
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        id
    }

    #[allow(clippy::too_many_lines)]
    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(&tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                if let Some(code) = &mut self.code {
                    code.content.push_str(&text);
                } else {
                    self.append_text(&text);
                }
            }
            Event::Code(code) => {
                if let Some(capture) = &mut self.heading {
                    capture.text.push_str(&code);
                }
                self.append(Node::Element(Element::new("code").with_text(&*code)));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                // Raw markup passes through as text: degraded but visible.
                self.append(Node::Text(html.into_string()));
            }
            Event::SoftBreak => self.append(Node::Text("\n".to_owned())),
            Event::HardBreak => self.append(Node::Element(Element::new("br"))),
            Event::Rule => self.append(Node::Element(Element::new("hr"))),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input").with_attr("type", "checkbox");
                if checked {
                    input = input.with_attr("checked", "");
                }
                self.append(Node::Element(input));
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: &Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open(Element::new("p")),
            Tag::Heading { level, .. } => {
                let level = heading_level_to_num(*level);
                self.heading = Some(HeadingCapture {
                    level,
                    text: String::new(),
                });
                self.open(Element::new(format!("h{level}")));
            }
            Tag::BlockQuote(_) => self.open(Element::new("blockquote")),
            Tag::CodeBlock(kind) => {
                let (language, attrs) = match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => parse_fence_info(info),
                    _ => (None, HashMap::new()),
                };
                self.code = Some(CodeCapture {
                    language,
                    attrs,
                    content: String::new(),
                });
            }
            Tag::List(start) => match start {
                Some(1) => self.open(Element::new("ol")),
                Some(n) => self.open(Element::new("ol").with_attr("start", n.to_string())),
                None => self.open(Element::new("ul")),
            },
            Tag::Item => self.open(Element::new("li")),
            Tag::Table(_) => {
                self.open(Element::new("table"));
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.open(Element::new("thead"));
                self.open(Element::new("tr"));
            }
            Tag::TableRow => self.open(Element::new("tr")),
            Tag::TableCell => {
                let tag = if self.in_table_head { "th" } else { "td" };
                self.open(Element::new(tag));
            }
            Tag::Emphasis => self.open(Element::new("em")),
            Tag::Strong => self.open(Element::new("strong")),
            Tag::Strikethrough => self.open(Element::new("del")),
            Tag::Link { dest_url, .. } => {
                self.open(Element::new("a").with_attr("href", dest_url.to_string()));
            }
            Tag::Image { dest_url, .. } => {
                self.image_alt = Some(String::new());
                self.open(Element::new("img").with_attr("src", dest_url.to_string()));
            }
            Tag::FootnoteDefinition(_)
            | Tag::HtmlBlock
            | Tag::MetadataBlock(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph
            | TagEnd::BlockQuote(_)
            | TagEnd::Item
            | TagEnd::TableRow
            | TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::List(_) => self.close(),
            TagEnd::Heading(_) => {
                if let Some(capture) = self.heading.take() {
                    let id = self.unique_id(&capture.text);
                    if let Some(el) = self.stack.last_mut() {
                        el.attrs.insert("id".to_owned(), id.clone());
                    }
                    self.headings.push(Heading {
                        level: capture.level,
                        title: capture.text.trim().to_owned(),
                        id,
                    });
                }
                self.close();
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    let token = code_token(self.code_index);
                    self.code_index += 1;

                    let mut block =
                        ExtractedBlock::new(BlockKind::CodeSample, &token, code.content);
                    block.attrs = code.attrs;
                    if let Some(language) = code.language {
                        block.attrs.insert("language".to_owned(), language);
                    }
                    self.code_blocks.push(block);

                    let placeholder = Node::Text(token.clone());
                    self.append_placeholder(&token, placeholder);
                }
            }
            TagEnd::Table => self.close(),
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.close(); // tr
                self.close(); // thead
            }
            TagEnd::TableCell => self.close(),
            TagEnd::Image => {
                let alt = self.image_alt.take().unwrap_or_default();
                if let Some(el) = self.stack.last_mut() {
                    el.attrs.insert("alt".to_owned(), alt);
                    el.children.clear();
                }
                self.close();
            }
            TagEnd::FootnoteDefinition
            | TagEnd::HtmlBlock
            | TagEnd::MetadataBlock(_)
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition
            | TagEnd::Superscript
            | TagEnd::Subscript => {}
        }
    }
}

/// Whether trimmed text is exactly a diagram placeholder token.
fn is_diagram_token(text: &str) -> bool {
    text.strip_prefix(DIAGRAM_TOKEN_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse a fence info string into `(language, attributes)`.
fn parse_fence_info(info: &str) -> (Option<String>, HashMap<String, String>) {
    let mut parts = info.split_whitespace();
    let language = parts.next().map(str::to_owned);
    let attrs = parts
        .filter_map(|part| {
            part.split_once('=')
                .map(|(k, v)| (k.to_owned(), v.trim_matches('"').to_owned()))
        })
        .collect();
    (language, attrs)
}

/// Convert heading level enum to number (1-6).
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// GitHub-style anchor id from heading text.
fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_dash = true;
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_dash = false;
        } else if (c.is_whitespace() || c == '-' || c == '_') && !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    out.trim_end_matches('-').to_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn mount(text: &str) -> MountedDocument {
        MarkdownMounter::new().mount(text, &MountSignal::new())
    }

    fn first_element(doc: &MountedDocument) -> &Element {
        doc.root
            .children
            .iter()
            .find_map(|n| match n {
                Node::Element(el) => Some(el),
                _ => None,
            })
            .expect("document has an element child")
    }

    #[test]
    fn test_mount_paragraph() {
        let doc = mount("Hello world.");
        let p = first_element(&doc);
        assert_eq!(p.tag, "p");
        assert_eq!(p.text_content(), "Hello world.");
    }

    #[test]
    fn test_mount_fires_signal() {
        let signal = MountSignal::new();
        MarkdownMounter::new().mount("content", &signal);
        assert!(signal.is_mounted());
    }

    #[test]
    fn test_heading_gets_anchor_id() {
        let doc = mount("## Getting Started\n");
        let h2 = first_element(&doc);
        assert_eq!(h2.tag, "h2");
        assert_eq!(h2.attrs.get("id"), Some(&"getting-started".to_owned()));
        assert_eq!(
            doc.headings,
            vec![Heading {
                level: 2,
                title: "Getting Started".to_owned(),
                id: "getting-started".to_owned(),
            }]
        );
    }

    #[test]
    fn test_duplicate_heading_ids_deduplicated() {
        let doc = mount("## Setup\n\n## Setup\n");
        assert_eq!(doc.headings[0].id, "setup");
        assert_eq!(doc.headings[1].id, "setup-1");
    }

    #[test]
    fn test_heading_with_inline_code() {
        let doc = mount("## The `extract` pass\n");
        assert_eq!(doc.headings[0].title, "The extract pass");
        assert_eq!(doc.headings[0].id, "the-extract-pass");
    }

    #[test]
    fn test_code_fence_becomes_placeholder() {
        let doc = mount("```rust\nfn main() {}\n```\n");

        assert_eq!(doc.code_blocks.len(), 1);
        let block = &doc.code_blocks[0];
        assert_eq!(block.kind, BlockKind::CodeSample);
        assert_eq!(block.token, "BLOCK_CODE_0");
        assert_eq!(block.payload, "fn main() {}\n");
        assert_eq!(block.attrs.get("language"), Some(&"rust".to_owned()));
        assert!(doc.root.text_content().contains("BLOCK_CODE_0"));
    }

    #[test]
    fn test_code_fence_attrs_captured() {
        let doc = mount("```rust highlight=2\nlet x = 1;\n```\n");
        assert_eq!(
            doc.code_blocks[0].attrs.get("highlight"),
            Some(&"2".to_owned())
        );
    }

    #[test]
    fn test_code_placeholders_order_preserving() {
        let doc = mount("```rust\na\n```\n\ntext\n\n```sh\nb\n```\n");
        let tokens: Vec<_> = doc.code_blocks.iter().map(|b| b.token.as_str()).collect();
        assert_eq!(tokens, vec!["BLOCK_CODE_0", "BLOCK_CODE_1"]);

        let text = doc.root.text_content();
        assert!(text.find("BLOCK_CODE_0").unwrap() < text.find("BLOCK_CODE_1").unwrap());
    }

    #[test]
    fn test_diagram_token_becomes_comment() {
        let doc = mount("before\n\nBLOCK_DIAGRAM_0\n\nafter\n");

        // The placeholder paragraph holds a comment marker, not text.
        let has_marker = doc.root.children.iter().any(|n| match n {
            Node::Element(el) => el
                .children
                .iter()
                .any(|c| matches!(c, Node::Comment(t) if t == "BLOCK_DIAGRAM_0")),
            _ => false,
        });
        assert!(has_marker);
        assert!(!doc.root.text_content().contains("BLOCK_DIAGRAM_0"));
    }

    #[test]
    fn test_non_token_text_stays_text() {
        let doc = mount("BLOCK_DIAGRAM_x is not a token\n");
        assert!(doc.root.text_content().contains("BLOCK_DIAGRAM_x"));
    }

    #[test]
    fn test_list_structure() {
        let doc = mount("- one\n- two\n");
        let ul = first_element(&doc);
        assert_eq!(ul.tag, "ul");
        assert_eq!(ul.children.len(), 2);
    }

    #[test]
    fn test_link_href() {
        let doc = mount("[guide](../guide)\n");
        let p = first_element(&doc);
        let Node::Element(a) = &p.children[0] else {
            panic!("expected link element");
        };
        assert_eq!(a.tag, "a");
        assert_eq!(a.attrs.get("href"), Some(&"../guide".to_owned()));
        assert_eq!(a.text_content(), "guide");
    }

    #[test]
    fn test_image_alt_collected() {
        let doc = mount("![alt text](img.png)\n");
        let p = first_element(&doc);
        let Node::Element(img) = &p.children[0] else {
            panic!("expected image element");
        };
        assert_eq!(img.tag, "img");
        assert_eq!(img.attrs.get("src"), Some(&"img.png".to_owned()));
        assert_eq!(img.attrs.get("alt"), Some(&"alt text".to_owned()));
        assert!(img.children.is_empty());
    }

    #[test]
    fn test_empty_document_not_mounted() {
        let doc = mount("");
        assert!(!doc.is_mounted());
    }

    #[test]
    fn test_placeholder_paths_recorded() {
        let doc = mount("para\n\nBLOCK_DIAGRAM_0\n\n```rust\nx\n```\n");

        // The diagram marker sits inside the second paragraph; the code
        // placeholder is a root-level text node after it.
        assert_eq!(
            doc.placeholder_paths.get("BLOCK_DIAGRAM_0"),
            Some(&vec![1, 0])
        );
        assert_eq!(doc.placeholder_paths.get("BLOCK_CODE_0"), Some(&vec![2]));

        let mut tree = doc.root.clone();
        let Some(Node::Comment(marker)) = crate::node::node_at_path_mut(&mut tree, &[1, 0])
        else {
            panic!("expected comment marker at recorded path");
        };
        assert_eq!(*marker, "BLOCK_DIAGRAM_0");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  spaced  out  "), "spaced-out");
    }
}
