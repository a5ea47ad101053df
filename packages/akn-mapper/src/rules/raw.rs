//! Plugin-authored rule declarations, as written in JSON or YAML.
//!
//! ```json
//! {
//!   "akn": "recital",
//!   "html": "p[data-akn-name=recital]",
//!   "attr": [{ "akn": "xml:id", "html": "id" }],
//!   "sub": [
//!     { "akn": "num", "html": "p[data-akn-num]" },
//!     { "akn": "mp", "html": "p" }
//!   ]
//! }
//! ```
//!
//! Nothing here is validated; see [`super::normalize`].

use serde::{Deserialize, Deserializer, Serialize};

/// Shorthand element rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawElementRule {
    /// Legal-XML selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub akn: Option<String>,

    /// HTML selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    /// Attribute rules; a single object or an array.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attr: Vec<RawAttributeRule>,

    /// Nested rules; a single object or an array.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sub: Vec<RawElementRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct: Option<RawDirection>,

    /// Slash-separated AKN wrapper chain collapsed in HTML (`content/mp`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flatten: Option<String>,
}

/// Shorthand attribute rule; one-sided entries are literals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawAttributeRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub akn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// `direct` value: `"to"`, `"from"`, or a boolean where `true` means to-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDirection {
    Flag(bool),
    Named(RawDirectionName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawDirectionName {
    To,
    From,
    Both,
}

/// Hierarchy profile declaration for a self-nesting numbering construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawHierarchyProfile {
    /// Rule for the first nesting level.
    pub first_level_config: RawElementRule,

    /// AKN root element (exactly one entry).
    pub root_elements_for_from: Vec<String>,

    /// AKN element mapped to each list item.
    pub content_wrapper_for_from: String,

    /// HTML list and item tags.
    pub root_elements_for_to: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

/// Everything one plugin declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPluginRules {
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub rules: Vec<RawElementRule>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub hierarchy: Vec<RawHierarchyProfile>,
}

/// Accept either a single value or an array of values.
fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(values) => values,
        OneOrMany::One(value) => vec![value],
    })
}
