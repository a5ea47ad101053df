//! Reading XML and XHTML markup into document trees.

use std::collections::BTreeMap;

use roxmltree::{Document, Node, ParsingOptions};

use crate::error::Result;
use crate::types::{DocumentNode, Element};

/// Namespace bound to the reserved `xml` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Parse markup into a document tree, dropping layout whitespace.
///
/// Indentation between block elements goes; a space between two inline
/// elements stays (see [`Element::is_layout_whitespace`]).
///
/// Namespace prefixes are kept as written (`xml:id`, `leos:editable`);
/// elements in the default namespace keep their bare name.
///
/// # Examples
/// ```
/// use akn_mapper::xml::parse_document;
///
/// let root = parse_document(r#"<recital xml:id="rec_1"><mp>Whereas...</mp></recital>"#).unwrap();
/// let element = root.as_element().unwrap();
/// assert_eq!(element.attribute("xml:id"), Some("rec_1"));
/// assert_eq!(root.text_content(), "Whereas...");
/// ```
///
/// # Errors
/// Returns `XmlParse` when the markup is not well-formed.
pub fn parse_document(text: &str) -> Result<DocumentNode> {
    parse_document_with(text, false)
}

/// Parse markup, optionally keeping layout whitespace.
///
/// # Errors
/// Returns `XmlParse` when the markup is not well-formed.
pub fn parse_document_with(text: &str, keep_blank_text: bool) -> Result<DocumentNode> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, options)?;
    let root = doc.root_element();

    let mut element = convert_element(root);
    if !keep_blank_text {
        element.drop_layout_whitespace();
    }
    for namespace in root.namespaces() {
        if namespace.uri() == XML_NAMESPACE {
            continue;
        }
        let name = match namespace.name() {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        element
            .attributes
            .insert(name, namespace.uri().to_string());
    }
    Ok(element.into())
}

fn convert_element(node: Node<'_, '_>) -> Element {
    let mut attributes = BTreeMap::new();
    for attribute in node.attributes() {
        let name = qualified_name(node, attribute.namespace(), attribute.name());
        attributes.insert(name, attribute.value().to_string());
    }

    let children = node
        .children()
        .filter_map(convert_node)
        .collect();

    Element {
        tag: qualified_name(node, node.tag_name().namespace(), node.tag_name().name()),
        attributes,
        children,
    }
}

fn convert_node(node: Node<'_, '_>) -> Option<DocumentNode> {
    if node.is_element() {
        return Some(convert_element(node).into());
    }
    let text = node.is_text().then(|| node.text()).flatten()?;
    Some(DocumentNode::text(text))
}

/// `prefix:name` when the namespace was bound to a prefix, else `name`.
fn qualified_name(node: Node<'_, '_>, namespace: Option<&str>, name: &str) -> String {
    let prefix = match namespace {
        Some(XML_NAMESPACE) => Some("xml"),
        Some(uri) => node.lookup_prefix(uri),
        None => None,
    };
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{name}"),
        _ => name.to_string(),
    }
}
