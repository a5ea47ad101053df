//! Error types for the mapper.
//!
//! Uses the dual-error pattern: `MapperError` for library consumers
//! with detailed error context, and the `Result` alias for internal use.
//! Rule conflicts are not errors; see [`crate::rules::RuleOverride`].

use thiserror::Error;

/// Main error type for the mapper library.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Malformed rule declaration at registration time.
    #[error("Invalid rule declaration in plugin '{plugin}' at {rule}: {reason}")]
    Configuration {
        plugin: String,
        rule: String,
        reason: String,
    },

    /// Plugin identifier does not follow the naming convention.
    #[error("Invalid plugin id: '{0}'. Expected a letter followed by letters, digits, '_', '.' or '-'")]
    InvalidPluginId(String),

    /// Selector shorthand could not be parsed.
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A hierarchical construct nests deeper than its profile allows.
    #[error("<{element}> nested at depth {depth} exceeds maximum depth {max_depth} (path: {path})")]
    DepthExceeded {
        element: String,
        depth: usize,
        max_depth: usize,
        path: String,
    },

    /// No rule matched and the unmatched-element policy is `Fail`.
    #[error("No rule for element {selector}{}", .context.as_ref().map(|c| format!(" in {c}")).unwrap_or_default())]
    UnmatchedElement {
        selector: String,
        context: Option<String>,
    },

    /// Document nesting exceeds the recursion guard.
    #[error("Document nesting exceeds {limit} levels (path: {path})")]
    TreeTooDeep { limit: usize, path: String },

    /// The root of a transformation did not produce exactly one node.
    #[error("Transformation of the root element produced {count} nodes, expected exactly one")]
    RootNotSingle { count: usize },

    /// A profile references a plugin that was never declared.
    #[error("Unknown plugin '{0}' in active plugin list")]
    UnknownPlugin(String),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization failed.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MapperError {
    /// Build a configuration error for a rule declared by `plugin`.
    pub fn configuration(
        plugin: impl Into<String>,
        rule: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            plugin: plugin.into(),
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Check whether the error comes from a profile or plugin declaration
    /// rather than from a document.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::InvalidPluginId(_)
                | Self::InvalidSelector { .. }
                | Self::UnknownPlugin(_)
                | Self::Json(_)
                | Self::YamlParse(_)
        )
    }
}

/// Result type alias for mapper operations.
pub type Result<T> = std::result::Result<T, MapperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display() {
        let err = MapperError::configuration("aknRecital", "recital > attr[0]", "missing both sides");
        assert_eq!(
            err.to_string(),
            "Invalid rule declaration in plugin 'aknRecital' at recital > attr[0]: missing both sides"
        );
    }

    #[test]
    fn test_is_configuration() {
        assert!(MapperError::UnknownPlugin("missing".to_string()).is_configuration());
        assert!(!MapperError::RootNotSingle { count: 0 }.is_configuration());
    }

    #[test]
    fn test_unmatched_element_with_path() {
        let err = MapperError::UnmatchedElement {
            selector: "<foo>".to_string(),
            context: Some("akomaNtoso/body".to_string()),
        };
        assert_eq!(err.to_string(), "No rule for element <foo> in akomaNtoso/body");
    }

    #[test]
    fn test_unmatched_element_without_path() {
        let err = MapperError::UnmatchedElement {
            selector: "<foo>".to_string(),
            context: None,
        };
        assert_eq!(err.to_string(), "No rule for element <foo>");
    }

    #[test]
    fn test_depth_exceeded_display() {
        let err = MapperError::DepthExceeded {
            element: "list".to_string(),
            depth: 6,
            max_depth: 5,
            path: "paragraph/list/point".to_string(),
        };
        assert!(err.to_string().contains("depth 6"));
        assert!(err.to_string().contains("maximum depth 5"));
    }
}
