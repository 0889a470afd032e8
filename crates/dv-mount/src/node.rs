//! Node representation for mounted content.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Node in a mounted content tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// Element with tag, attributes, and children.
    Element(Element),
    /// Plain text.
    Text(String),
    /// Comment marker. Used for diagram placeholders.
    Comment(String),
}

impl Node {
    /// Concatenated text content of this node and all descendants.
    ///
    /// Comments contribute nothing.
    #[must_use]
    pub fn text_content(&self) -> String {
        match self {
            Self::Element(el) => el.text_content(),
            Self::Text(text) => text.clone(),
            Self::Comment(_) => String::new(),
        }
    }
}

/// Element node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name.
    pub tag: String,
    /// Element attributes.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, String>,
    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set an attribute.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Append a child node.
    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Append a text child.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    /// Concatenated text content of all descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.children.iter().map(Node::text_content).collect()
    }
}

/// Child-index path from a container root down to a node.
pub type NodePath = Vec<usize>;

/// Resolve a child-index path to a mutable node reference.
///
/// Returns `None` when the path no longer matches the tree shape.
pub fn node_at_path_mut<'a>(root: &'a mut Element, path: &[usize]) -> Option<&'a mut Node> {
    let (&first, rest) = path.split_first()?;
    let mut node = root.children.get_mut(first)?;
    for &index in rest {
        let Node::Element(el) = node else {
            return None;
        };
        node = el.children.get_mut(index)?;
    }
    Some(node)
}

/// Replace the first text node containing `token` with `replacement`.
///
/// Depth-first, document order. Returns `true` when a node was replaced; a
/// token that is never found (already consumed, or never mounted) leaves the
/// tree untouched.
pub fn replace_first_text(root: &mut Element, token: &str, replacement: Node) -> bool {
    let mut replacement = Some(replacement);
    replace_first(root, &mut replacement, &mut |node| {
        matches!(node, Node::Text(text) if text.contains(token))
    })
}

/// Replace the comment marker holding exactly `token` with `replacement`.
///
/// Same contract as [`replace_first_text`], but matching comment nodes.
pub fn replace_comment_marker(root: &mut Element, token: &str, replacement: Node) -> bool {
    let mut replacement = Some(replacement);
    replace_first(root, &mut replacement, &mut |node| {
        matches!(node, Node::Comment(text) if text.trim() == token)
    })
}

fn replace_first(
    el: &mut Element,
    replacement: &mut Option<Node>,
    matches: &mut dyn FnMut(&Node) -> bool,
) -> bool {
    for child in &mut el.children {
        if matches(child) {
            if let Some(node) = replacement.take() {
                *child = node;
            }
            return true;
        }
        if let Node::Element(nested) = child
            && replace_first(nested, replacement, matches)
        {
            return true;
        }
    }
    false
}
