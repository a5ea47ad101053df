//! Serializing document trees back to markup.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::Path;

use crate::error::Result;
use crate::types::{DocumentNode, Element};

/// XML declaration prepended to written Akoma Ntoso documents.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const INDENT: &str = "  ";

/// Serialize a node as compact markup.
///
/// Childless elements are written self-closing (`<num/>`).
///
/// # Examples
/// ```
/// use akn_mapper::types::DocumentNode;
/// use akn_mapper::xml::write_document;
///
/// let node = DocumentNode::element("p")
///     .with_attribute("data-akn-name", "recital")
///     .with_child(DocumentNode::text("a < b"));
/// assert_eq!(write_document(&node), r#"<p data-akn-name="recital">a &lt; b</p>"#);
/// ```
#[must_use]
pub fn write_document(node: &DocumentNode) -> String {
    let mut out = String::new();
    write_node(node, None, &mut out);
    out
}

/// Serialize a node with one element per line.
///
/// Elements holding text are written on a single line so no whitespace is
/// added to mixed content.
#[must_use]
pub fn write_document_pretty(node: &DocumentNode) -> String {
    let mut out = String::new();
    write_node(node, Some(0), &mut out);
    out
}

/// Write markup to `path`, creating parent directories as needed.
///
/// Writes to a temp file, syncs it, then renames it over the destination
/// so an interrupted run never leaves a half-written document.
///
/// # Errors
/// Returns `Io` when a directory or the file cannot be written.
pub fn save_markup(content: &str, path: &Path) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_file = dir.join(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_file)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&temp_file, path)?;
    Ok(())
}

fn write_node(node: &DocumentNode, indent: Option<usize>, out: &mut String) {
    match node {
        DocumentNode::Text(text) => out.push_str(&escape(text, false)),
        DocumentNode::Element(element) => write_element(element, indent, out),
    }
}

fn write_element(element: &Element, indent: Option<usize>, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attributes {
        let _ = write!(out, " {name}=\"{}\"", escape(value, true));
    }

    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');

    let has_text = element
        .children
        .iter()
        .any(|child| matches!(child, DocumentNode::Text(_)));

    match indent {
        Some(level) if !has_text => {
            for child in &element.children {
                out.push('\n');
                out.push_str(&INDENT.repeat(level + 1));
                write_node(child, Some(level + 1), out);
            }
            out.push('\n');
            out.push_str(&INDENT.repeat(level));
        }
        _ => {
            for child in &element.children {
                write_node(child, None, out);
            }
        }
    }

    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

fn escape(value: &str, attribute: bool) -> Cow<'_, str> {
    let needs_escape = |c: char| matches!(c, '&' | '<' | '>') || (attribute && c == '"');
    if !value.contains(needs_escape) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_write_compact() {
        let node = DocumentNode::element("recital")
            .with_attribute("xml:id", "rec_1")
            .with_child(DocumentNode::element("num").with_child(DocumentNode::text("(1)")))
            .with_child(DocumentNode::element("mp"));
        assert_eq!(
            write_document(&node),
            r#"<recital xml:id="rec_1"><num>(1)</num><mp/></recital>"#
        );
    }

    #[test]
    fn test_escape_attribute_quotes() {
        let node = DocumentNode::element("a").with_attribute("title", r#"say "hi" & go"#);
        assert_eq!(
            write_document(&node),
            r#"<a title="say &quot;hi&quot; &amp; go"/>"#
        );
    }

    #[test]
    fn test_write_pretty_keeps_mixed_content_inline() {
        let node = DocumentNode::element("list").with_child(
            DocumentNode::element("point").with_child(
                DocumentNode::element("mp")
                    .with_child(DocumentNode::text("see "))
                    .with_child(DocumentNode::element("ref").with_child(DocumentNode::text("Art. 1"))),
            ),
        );
        let expected = "<list>\n  <point>\n    <mp>see <ref>Art. 1</ref></mp>\n  </point>\n</list>";
        assert_eq!(write_document_pretty(&node), expected);
    }

    #[test]
    fn test_written_markup_parses_back() {
        let node = DocumentNode::element("p")
            .with_attribute("data-akn-num", "")
            .with_child(DocumentNode::text("1 < 2 & \"3\""));
        let parsed = parse_document(&write_document(&node)).unwrap();
        assert_eq!(parsed, node);
    }

    #[test]
    fn test_save_markup_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/nested/doc.html");

        save_markup("<p/>", &path).unwrap();
        save_markup("<p>again</p>", &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>again</p>");
        assert!(!dir.path().join("out/nested/.doc.html.tmp").exists());
    }
}
