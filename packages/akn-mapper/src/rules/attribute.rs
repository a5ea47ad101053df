//! Attribute mapping rules.

use std::collections::BTreeMap;
use std::fmt;

use super::selector::ValueMatcher;
use crate::types::{Direction, Element};

/// One side of the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Akoma Ntoso (legal-XML) side.
    Akn,
    /// Editor HTML side.
    Html,
}

impl Side {
    /// The side a transformation in `direction` writes.
    #[must_use]
    pub fn output_of(direction: Direction) -> Self {
        match direction {
            Direction::To => Self::Html,
            Direction::From => Self::Akn,
        }
    }
}

/// Attribute name with a value matcher (`name`, `name=value`, `name=prefix-*`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePattern {
    pub name: String,
    pub value: ValueMatcher,
}

impl AttributePattern {
    /// Parse `name`, `name=value` or `name=prefix-*` shorthand.
    ///
    /// # Errors
    /// Returns the reason when the name is empty or the wildcard is misplaced.
    pub fn parse(input: &str) -> std::result::Result<Self, String> {
        let (name, value) = match input.split_once('=') {
            Some((name, value)) => (name.trim(), ValueMatcher::parse(value)?),
            None => (input.trim(), ValueMatcher::Any),
        };
        if name.is_empty() || name.contains(char::is_whitespace) || name.contains('*') {
            return Err(format!("invalid attribute name in '{input}'"));
        }
        Ok(Self {
            name: name.to_string(),
            value,
        })
    }

    /// Capture the variable part of this attribute on `element`.
    #[must_use]
    pub fn capture<'e>(&self, element: &'e Element) -> Option<&'e str> {
        element
            .attribute(&self.name)
            .and_then(|value| self.value.capture(value))
    }
}

impl fmt::Display for AttributePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        match &self.value {
            ValueMatcher::Any => Ok(()),
            ValueMatcher::Exact(value) => write!(f, "={value}"),
            ValueMatcher::Prefix(prefix) => write!(f, "={prefix}*"),
        }
    }
}

/// How one attribute is carried between the two sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeRule {
    /// Capture on one side and render on the other.
    ///
    /// A wildcard's matched suffix is preserved verbatim.
    Copy {
        akn: AttributePattern,
        html: AttributePattern,
    },

    /// Fixed attribute emitted only when writing `side`.
    Literal {
        side: Side,
        name: String,
        value: String,
    },

    /// Text of the AKN child `child` carried as the HTML attribute `attribute`.
    ChildText { child: String, attribute: String },
}

impl AttributeRule {
    /// Name of the attribute this rule writes in `direction`, if any.
    #[must_use]
    pub fn output_name(&self, direction: Direction) -> Option<&str> {
        match (self, direction) {
            (Self::Copy { html, .. }, Direction::To) => Some(html.name.as_str()),
            (Self::Copy { akn, .. }, Direction::From) => Some(akn.name.as_str()),
            (Self::Literal { side, name, .. }, _) => {
                (*side == Side::output_of(direction)).then_some(name.as_str())
            }
            (Self::ChildText { attribute, .. }, Direction::To) => Some(attribute.as_str()),
            (Self::ChildText { .. }, Direction::From) => None,
        }
    }

    /// AKN child element consumed by this rule, if any.
    #[must_use]
    pub fn child_text(&self) -> Option<(&str, &str)> {
        match self {
            Self::ChildText { child, attribute } => Some((child.as_str(), attribute.as_str())),
            _ => None,
        }
    }

    /// Write this rule's output attribute for `source` into `output`.
    ///
    /// Child-text rules only write in the TO direction; the FROM direction
    /// re-creates the child element and is handled by the engine.
    pub fn apply(
        &self,
        direction: Direction,
        source: &Element,
        output: &mut BTreeMap<String, String>,
    ) {
        match self {
            Self::Copy { akn, html } => {
                let (from, to) = match direction {
                    Direction::To => (akn, html),
                    Direction::From => (html, akn),
                };
                if let Some(captured) = from.capture(source) {
                    output.insert(to.name.clone(), to.value.render(captured));
                }
            }
            Self::Literal { side, name, value } => {
                if *side == Side::output_of(direction) {
                    output.insert(name.clone(), value.clone());
                }
            }
            Self::ChildText { child, attribute } => {
                if direction == Direction::To {
                    if let Some(element) = source.find_child(child) {
                        output.insert(attribute.clone(), element.text_content());
                    }
                }
            }
        }
    }
}

impl fmt::Display for AttributeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy { akn, html } => write!(f, "{akn} <-> {html}"),
            Self::Literal {
                side: Side::Akn,
                name,
                value,
            } => write!(f, "{name}={value} <- (akn)"),
            Self::Literal {
                side: Side::Html,
                name,
                value,
            } => write!(f, "(html) -> {name}={value}"),
            Self::ChildText { child, attribute } => write!(f, "{child}/text <-> {attribute}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentNode;

    fn element(node: DocumentNode) -> Element {
        match node {
            DocumentNode::Element(e) => e,
            DocumentNode::Text(_) => unreachable!(),
        }
    }

    fn copy(akn: &str, html: &str) -> AttributeRule {
        AttributeRule::Copy {
            akn: AttributePattern::parse(akn).unwrap(),
            html: AttributePattern::parse(html).unwrap(),
        }
    }

    #[test]
    fn test_parse_pattern() {
        let plain = AttributePattern::parse("xml:id").unwrap();
        assert_eq!(plain.name, "xml:id");
        assert_eq!(plain.value, ValueMatcher::Any);

        let wildcard = AttributePattern::parse("class=leos-highlight-*").unwrap();
        assert_eq!(wildcard.value, ValueMatcher::Prefix("leos-highlight-".to_string()));
        assert_eq!(wildcard.to_string(), "class=leos-highlight-*");

        assert!(AttributePattern::parse("=x").is_err());
        assert!(AttributePattern::parse("class=*a").is_err());
        assert!(AttributePattern::parse("data-leos-*").is_err());
    }

    #[test]
    fn test_copy_renames() {
        let rule = copy("xml:id", "id");
        let akn = element(DocumentNode::element("recital").with_attribute("xml:id", "rec_1"));
        let mut out = BTreeMap::new();
        rule.apply(Direction::To, &akn, &mut out);
        assert_eq!(out.get("id").map(String::as_str), Some("rec_1"));

        let html = element(DocumentNode::element("p").with_attribute("id", "rec_1"));
        let mut back = BTreeMap::new();
        rule.apply(Direction::From, &html, &mut back);
        assert_eq!(back.get("xml:id").map(String::as_str), Some("rec_1"));
    }

    #[test]
    fn test_wildcard_preserves_suffix() {
        let rule = copy("class=leos-highlight-*", "class=leos-highlight-*");
        for suffix in ["42", "yellow", "a-b_c", ""] {
            let value = format!("leos-highlight-{suffix}");
            let akn = element(DocumentNode::element("span").with_attribute("class", &value));
            let mut out = BTreeMap::new();
            rule.apply(Direction::To, &akn, &mut out);
            assert_eq!(out.get("class"), Some(&value));
        }
    }

    #[test]
    fn test_wildcard_prefix_rewrite() {
        let rule = copy("refersto=~leos-*", "class=leos-*");
        let akn = element(DocumentNode::element("span").with_attribute("refersto", "~leos-yellow"));
        let mut out = BTreeMap::new();
        rule.apply(Direction::To, &akn, &mut out);
        assert_eq!(out.get("class").map(String::as_str), Some("leos-yellow"));

        let html = element(DocumentNode::element("span").with_attribute("class", "leos-yellow"));
        let mut back = BTreeMap::new();
        rule.apply(Direction::From, &html, &mut back);
        assert_eq!(back.get("refersto").map(String::as_str), Some("~leos-yellow"));
    }

    #[test]
    fn test_wildcard_mismatch_not_copied() {
        let rule = copy("class=leos-highlight-*", "class=leos-highlight-*");
        let akn = element(DocumentNode::element("span").with_attribute("class", "other"));
        let mut out = BTreeMap::new();
        rule.apply(Direction::To, &akn, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_literal_one_sided() {
        let rule = AttributeRule::Literal {
            side: Side::Html,
            name: "data-akn-name".to_string(),
            value: "recital".to_string(),
        };
        let node = element(DocumentNode::element("recital"));
        let mut out = BTreeMap::new();
        rule.apply(Direction::To, &node, &mut out);
        assert_eq!(out.get("data-akn-name").map(String::as_str), Some("recital"));

        let mut back = BTreeMap::new();
        rule.apply(Direction::From, &node, &mut back);
        assert!(back.is_empty());
        assert_eq!(rule.output_name(Direction::From), None);
    }

    #[test]
    fn test_child_text() {
        let rule = AttributeRule::ChildText {
            child: "num".to_string(),
            attribute: "data-akn-num".to_string(),
        };
        let point = element(
            DocumentNode::element("point")
                .with_child(DocumentNode::element("num").with_child(DocumentNode::text("(a)"))),
        );
        let mut out = BTreeMap::new();
        rule.apply(Direction::To, &point, &mut out);
        assert_eq!(out.get("data-akn-num").map(String::as_str), Some("(a)"));
        assert_eq!(rule.child_text(), Some(("num", "data-akn-num")));
    }
}
