//! Configuration constants, validation functions and transformation options.

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{MapperError, Result};

/// Default maximum nesting depth of a hierarchy profile.
///
/// Legal numbering in practice goes paragraph → point → sub-point → indent,
/// so five levels leave room for one extra indent level.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Maximum element nesting accepted by the transformation walk.
///
/// Prevents stack overflow on maliciously deep documents.
pub const MAX_TREE_DEPTH: usize = 256;

/// Maximum number of plugins an editor profile may activate.
pub const MAX_ACTIVE_PLUGINS: usize = 512;

/// Plugin id pattern: a letter followed by letters, digits, `_`, `.` or `-`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PLUGIN_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]*$").expect("valid regex"));

/// Validate a plugin identifier.
///
/// # Examples
/// ```
/// use akn_mapper::config::validate_plugin_id;
///
/// assert!(validate_plugin_id("aknRecital").is_ok());
/// assert!(validate_plugin_id("leos_highlight").is_ok());
/// assert!(validate_plugin_id("1plugin").is_err());
/// assert!(validate_plugin_id("").is_err());
/// ```
pub fn validate_plugin_id(plugin_id: &str) -> Result<()> {
    if PLUGIN_ID_PATTERN.is_match(plugin_id) {
        Ok(())
    } else {
        Err(MapperError::InvalidPluginId(plugin_id.to_string()))
    }
}

/// What the engine does with an element no rule matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedElementPolicy {
    /// Drop the element but keep its (transformed) children.
    ///
    /// Wrapper elements with no counterpart on the other side must not
    /// lose their content.
    #[default]
    Unwrap,

    /// Copy the element with its attributes and transform its children.
    Keep,

    /// Drop the element together with its content.
    Drop,

    /// Abort the pass with [`MapperError::UnmatchedElement`].
    Fail,
}

impl UnmatchedElementPolicy {
    /// Get the string value used in profiles and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unwrap => "unwrap",
            Self::Keep => "keep",
            Self::Drop => "drop",
            Self::Fail => "fail",
        }
    }
}

/// Options for a single transformation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Policy for elements without a matching rule.
    pub unmatched: UnmatchedElementPolicy,

    /// Drop layout whitespace (indentation between block elements) from the
    /// output. Spaces inside mixed content are always kept.
    pub drop_blank_text: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            unmatched: UnmatchedElementPolicy::Unwrap,
            drop_blank_text: true,
        }
    }
}

impl TransformOptions {
    /// Set the unmatched-element policy.
    #[must_use]
    pub fn with_unmatched(mut self, policy: UnmatchedElementPolicy) -> Self {
        self.unmatched = policy;
        self
    }

    /// Set whether layout whitespace is dropped.
    #[must_use]
    pub fn with_drop_blank_text(mut self, drop: bool) -> Self {
        self.drop_blank_text = drop;
        self
    }
}
