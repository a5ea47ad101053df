//! Core document tree types.
//!
//! A [`DocumentNode`] represents either side of the mapping: an Akoma Ntoso
//! element, an editor HTML element, or a run of text.

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which side of the mapping a transformation produces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Akoma Ntoso → HTML, used when a document is loaded into the editor.
    To,
    /// HTML → Akoma Ntoso, used when editor content is saved.
    From,
}

impl Direction {
    /// Get the string value used in declarations and CLI arguments.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::To => "to",
            Self::From => "from",
        }
    }

    /// The opposite direction.
    #[must_use]
    pub fn reverse(&self) -> Self {
        match self {
            Self::To => Self::From,
            Self::From => Self::To,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Kind of a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
}

/// An element node.
///
/// Attributes are kept sorted by name so two elements compare equal
/// regardless of the order their attributes were written in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name, including a namespace prefix when one was written (`xml:id` style).
    pub tag: String,

    /// Attribute name → value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Ordered child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

impl Element {
    /// Create an element without attributes or children.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Get an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Iterate over the element children.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(DocumentNode::as_element)
    }

    /// Find the first child element with the given tag.
    #[must_use]
    pub fn find_child(&self, tag: &str) -> Option<&Element> {
        self.child_elements().find(|child| child.tag == tag)
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Check whether `child` only lays out the markup: blank text spanning a
    /// line break, in an element with no other text of its own.
    ///
    /// Blank text on one line (`<b>Having</b> <i>regard</i>`) and blank text
    /// next to real text are content and never count as layout.
    #[must_use]
    pub fn is_layout_whitespace(&self, child: &DocumentNode) -> bool {
        child.is_blank_text()
            && child.as_text().is_some_and(|text| text.contains('\n'))
            && !self.has_own_text()
    }

    /// Remove layout whitespace from this element and its descendants.
    pub fn drop_layout_whitespace(&mut self) {
        if !self.has_own_text() {
            self.children.retain(|child| {
                !(child.is_blank_text() && child.as_text().is_some_and(|t| t.contains('\n')))
            });
        }
        for child in &mut self.children {
            if let DocumentNode::Element(element) = child {
                element.drop_layout_whitespace();
            }
        }
    }

    fn has_own_text(&self) -> bool {
        self.children
            .iter()
            .any(|child| child.as_text().is_some_and(|t| !t.trim().is_empty()))
    }
}

fn collect_text(nodes: &[DocumentNode], out: &mut String) {
    for node in nodes {
        match node {
            DocumentNode::Text(text) => out.push_str(text),
            DocumentNode::Element(element) => collect_text(&element.children, out),
        }
    }
}

/// A node of a legal-XML or HTML document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentNode {
    Element(Element),
    Text(String),
}

impl DocumentNode {
    /// Create an empty element node.
    #[must_use]
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element(Element::new(tag))
    }

    /// Create a text node.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Add an attribute. Has no effect on text nodes.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element(element) = &mut self {
            element.attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Append a child. Has no effect on text nodes.
    #[must_use]
    pub fn with_child(mut self, child: DocumentNode) -> Self {
        if let Self::Element(element) = &mut self {
            element.children.push(child);
        }
        self
    }

    /// Append several children. Has no effect on text nodes.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = DocumentNode>) -> Self {
        if let Self::Element(element) = &mut self {
            element.children.extend(children);
        }
        self
    }

    /// Kind of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Element(_) => NodeKind::Element,
            Self::Text(_) => NodeKind::Text,
        }
    }

    /// Tag name for elements, `None` for text.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|e| e.tag.as_str())
    }

    /// Borrow the element, if this is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    /// Borrow the text, if this is a text node.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Element(_) => None,
        }
    }

    /// Check whether this is a text node containing only whitespace.
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        self.as_text().is_some_and(|t| t.trim().is_empty())
    }

    /// Concatenated text of this node and its descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Element(element) => element.text_content(),
        }
    }
}

impl From<Element> for DocumentNode {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let node = DocumentNode::element("recital")
            .with_attribute("xml:id", "rec_1")
            .with_child(DocumentNode::element("num"))
            .with_child(DocumentNode::element("mp").with_child(DocumentNode::text("Whereas...")));

        let element = node.as_element().unwrap();
        assert_eq!(element.tag, "recital");
        assert_eq!(element.attribute("xml:id"), Some("rec_1"));
        assert_eq!(element.children.len(), 2);
        assert!(element.find_child("mp").is_some());
        assert_eq!(node.text_content(), "Whereas...");
    }

    #[test]
    fn test_text_node_is_leaf() {
        let node = DocumentNode::text("bar")
            .with_attribute("class", "x")
            .with_child(DocumentNode::element("b"));
        assert_eq!(node, DocumentNode::text("bar"));
        assert_eq!(node.kind(), NodeKind::Text);
        assert_eq!(node.tag(), None);
    }

    #[test]
    fn test_attribute_order_irrelevant() {
        let a = DocumentNode::element("p")
            .with_attribute("id", "1")
            .with_attribute("class", "x");
        let b = DocumentNode::element("p")
            .with_attribute("class", "x")
            .with_attribute("id", "1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_blank_text() {
        assert!(DocumentNode::text("  \n ").is_blank_text());
        assert!(!DocumentNode::text(" a ").is_blank_text());
        assert!(!DocumentNode::element("p").is_blank_text());
    }

    #[test]
    fn test_layout_whitespace() {
        let mut recital = Element::new("recital");
        recital.children = vec![
            DocumentNode::text("\n  "),
            DocumentNode::element("mp")
                .with_child(DocumentNode::element("b").with_child(DocumentNode::text("Having")))
                .with_child(DocumentNode::text(" "))
                .with_child(DocumentNode::element("i").with_child(DocumentNode::text("regard"))),
            DocumentNode::text("\n"),
        ];
        assert!(recital.is_layout_whitespace(&recital.children[0]));

        recital.drop_layout_whitespace();
        assert_eq!(recital.children.len(), 1);
        assert_eq!(recital.text_content(), "Having regard");

        let mixed = DocumentNode::element("mp")
            .with_child(DocumentNode::text("see"))
            .with_child(DocumentNode::text("\n"));
        let mixed = mixed.as_element().unwrap();
        assert!(!mixed.is_layout_whitespace(&mixed.children[1]));
    }

    #[test]
    fn test_direction() {
        assert_eq!(Direction::To.reverse(), Direction::From);
        assert_eq!(Direction::From.to_string(), "from");
    }
}
