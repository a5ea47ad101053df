//! Element selectors and attribute value matchers.
//!
//! Selector shorthand follows a small CSS subset:
//!
//! ```text
//! citation                          tag only
//! div[data-akn-name=citations]      tag with exact attribute value
//! p[data-akn-num]                   tag with attribute presence
//! span[class=leos-highlight-*]      tag with attribute prefix (wildcard)
//! list list                         `list` with exactly one `list` ancestor
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MapperError, Result};
use crate::types::Element;

/// Wildcard placeholder in attribute values.
pub const WILDCARD: char = '*';

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static COMPOUND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][\w.\-]*(?::[A-Za-z_][\w.\-]*)?)((?:\[[^\[\]]*\])*)$")
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PREDICATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\s*([A-Za-z_][\w.:\-]*)\s*(?:=\s*([^\]]*?))?\s*\]").expect("valid regex")
});

/// How an attribute value is tested and reproduced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueMatcher {
    /// Any value; the whole value is captured.
    Any,
    /// Exactly this value; nothing is captured.
    Exact(String),
    /// Values starting with this prefix; the suffix is captured.
    Prefix(String),
}

impl ValueMatcher {
    /// Parse a value segment, compiling a trailing `*` into a prefix matcher.
    ///
    /// # Errors
    /// Returns the reason when the wildcard is not a single trailing `*`.
    pub fn parse(value: &str) -> std::result::Result<Self, String> {
        let value = strip_quotes(value.trim());
        let wildcards = value.matches(WILDCARD).count();
        if wildcards == 0 {
            return Ok(Self::Exact(value.to_string()));
        }
        if wildcards > 1 || !value.ends_with(WILDCARD) {
            return Err(format!(
                "wildcard '{WILDCARD}' must appear once, at the end of the value (got '{value}')"
            ));
        }
        Ok(Self::Prefix(value.trim_end_matches(WILDCARD).to_string()))
    }

    /// Capture the variable part of `value`, or `None` when it does not match.
    #[must_use]
    pub fn capture<'v>(&self, value: &'v str) -> Option<&'v str> {
        match self {
            Self::Any => Some(value),
            Self::Exact(expected) => (value == expected).then_some(""),
            Self::Prefix(prefix) => value.strip_prefix(prefix.as_str()),
        }
    }

    /// Check whether `value` matches.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.capture(value).is_some()
    }

    /// Produce a value from a captured part.
    #[must_use]
    pub fn render(&self, captured: &str) -> String {
        match self {
            Self::Any => captured.to_string(),
            Self::Exact(value) => value.clone(),
            Self::Prefix(prefix) => format!("{prefix}{captured}"),
        }
    }

    /// Check whether this matcher is a wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Prefix(_))
    }

    fn write_suffix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => Ok(()),
            Self::Exact(value) => write!(f, "={value}"),
            Self::Prefix(prefix) => write!(f, "={prefix}{WILDCARD}"),
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Attribute test inside a selector (`[name]`, `[name=value]`, `[name=prefix*]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePredicate {
    pub name: String,
    pub value: ValueMatcher,
}

impl AttributePredicate {
    /// Check the predicate against an element.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        element
            .attribute(&self.name)
            .is_some_and(|value| self.value.matches(value))
    }

    /// The value emitted when a node is built from the selector, if fixed.
    ///
    /// Presence predicates emit an empty value; wildcards emit nothing since
    /// their value comes from attribute rules.
    #[must_use]
    pub fn fixed_value(&self) -> Option<&str> {
        match &self.value {
            ValueMatcher::Any => Some(""),
            ValueMatcher::Exact(value) => Some(value),
            ValueMatcher::Prefix(_) => None,
        }
    }
}

impl fmt::Display for AttributePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.name)?;
        self.value.write_suffix(f)?;
        f.write_str("]")
    }
}

/// Nesting qualifier: the number of ancestors with tag `within` must equal `count`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nesting {
    pub within: String,
    pub count: usize,
}

impl Nesting {
    /// Check the qualifier against the ancestor tag path.
    #[must_use]
    pub fn matches<S: AsRef<str>>(&self, ancestors: &[S]) -> bool {
        ancestors
            .iter()
            .filter(|tag| tag.as_ref() == self.within)
            .count()
            == self.count
    }
}

/// A selector matching one element of a document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub tag: String,
    /// Attribute predicates, sorted by name.
    pub predicates: Vec<AttributePredicate>,
    pub nesting: Option<Nesting>,
}

impl Selector {
    /// Selector matching a bare tag.
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            predicates: Vec::new(),
            nesting: None,
        }
    }

    /// Parse selector shorthand.
    ///
    /// # Examples
    /// ```
    /// use akn_mapper::rules::Selector;
    ///
    /// let selector = Selector::parse("div[data-akn-name=citations]").unwrap();
    /// assert_eq!(selector.tag, "div");
    /// assert_eq!(selector.to_string(), "div[data-akn-name=citations]");
    ///
    /// let nested = Selector::parse("list list").unwrap();
    /// assert_eq!(nested.nesting.unwrap().count, 1);
    ///
    /// assert!(Selector::parse("div > p").is_err());
    /// ```
    ///
    /// # Errors
    /// Returns `InvalidSelector` on malformed shorthand.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: String| MapperError::InvalidSelector {
            selector: input.to_string(),
            reason,
        };

        let tokens: Vec<&str> = input.split_whitespace().collect();
        let Some((last, ancestors)) = tokens.split_last() else {
            return Err(invalid("selector is empty".to_string()));
        };

        let mut selector = Self::parse_compound(last).map_err(invalid)?;

        if let Some(first) = ancestors.first() {
            if ancestors.iter().any(|tag| tag != first) || !is_bare_tag(first) {
                return Err(invalid(
                    "only repeated bare ancestor tags are supported (e.g. 'list list')".to_string(),
                ));
            }
            selector.nesting = Some(Nesting {
                within: (*first).to_string(),
                count: ancestors.len(),
            });
        }

        Ok(selector)
    }

    fn parse_compound(token: &str) -> std::result::Result<Self, String> {
        let caps = COMPOUND_PATTERN
            .captures(token)
            .ok_or_else(|| format!("'{token}' is not a tag with optional [attribute] predicates"))?;

        let mut predicates = Vec::new();
        for pred in PREDICATE_PATTERN.captures_iter(&caps[2]) {
            let value = match pred.get(2) {
                Some(raw) => ValueMatcher::parse(raw.as_str())?,
                None => ValueMatcher::Any,
            };
            predicates.push(AttributePredicate {
                name: pred[1].to_string(),
                value,
            });
        }

        let declared = caps[2].matches('[').count();
        if predicates.len() != declared {
            return Err(format!("malformed attribute predicate in '{token}'"));
        }

        predicates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self {
            tag: caps[1].to_string(),
            predicates,
            nesting: None,
        })
    }

    /// Return a copy qualified by a nesting constraint.
    #[must_use]
    pub fn with_nesting(mut self, within: impl Into<String>, count: usize) -> Self {
        self.nesting = Some(Nesting {
            within: within.into(),
            count,
        });
        self
    }

    /// Check tag and attribute predicates, ignoring nesting.
    #[must_use]
    pub fn matches_element(&self, element: &Element) -> bool {
        element.tag == self.tag && self.predicates.iter().all(|p| p.matches(element))
    }

    /// Check the selector against an element and its ancestor tag path.
    #[must_use]
    pub fn matches<S: AsRef<str>>(&self, element: &Element, ancestors: &[S]) -> bool {
        self.matches_element(element)
            && self.nesting.as_ref().is_none_or(|n| n.matches(ancestors))
    }

    /// Ranking among selectors matching the same element; higher wins.
    #[must_use]
    pub fn specificity(&self) -> usize {
        self.predicates.len() + usize::from(self.nesting.is_some())
    }

    /// Build an empty element carrying the selector's tag and fixed attributes.
    #[must_use]
    pub fn instantiate(&self) -> Element {
        let mut element = Element::new(&self.tag);
        for predicate in &self.predicates {
            if let Some(value) = predicate.fixed_value() {
                element
                    .attributes
                    .insert(predicate.name.clone(), value.to_string());
            }
        }
        element
    }
}

fn is_bare_tag(token: &str) -> bool {
    COMPOUND_PATTERN
        .captures(token)
        .is_some_and(|caps| caps[2].is_empty())
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(nesting) = &self.nesting {
            for _ in 0..nesting.count {
                write!(f, "{} ", nesting.within)?;
            }
        }
        f.write_str(&self.tag)?;
        for predicate in &self.predicates {
            write!(f, "{predicate}")?;
        }
        Ok(())
    }
}
