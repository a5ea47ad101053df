//! Built-in plugin declarations for LEOS-style legal documents.
//!
//! Declared in the same shorthand plugins use, so they go through the
//! normalizer like any third-party rules.

use serde_json::{json, Value};

use super::raw::RawPluginRules;
use super::registry::RuleRegistry;
use crate::error::Result;

/// Built-in plugin ids in their default composition order.
pub const LEOS_PLUGINS: &[&str] = &[
    "aknInlines",
    "aknRecitals",
    "aknRecital",
    "aknCitations",
    "aknAuthorialNote",
    "leosHighlight",
    "aknOrderedList",
];

/// Shorthand declaration of a built-in plugin.
#[must_use]
pub fn builtin_declaration(plugin_id: &str) -> Option<Value> {
    let declaration = match plugin_id {
        "aknInlines" => json!({
            "rules": [
                {"akn": "b", "html": "strong"},
                {"akn": "i", "html": "em"},
                {"akn": "u", "html": "u"},
                {"akn": "sup", "html": "sup"},
                {"akn": "sub", "html": "sub"},
                {
                    "akn": "ref",
                    "html": "a",
                    "attr": [
                        {"akn": "xml:id", "html": "id"},
                        {"akn": "href", "html": "href"}
                    ]
                }
            ]
        }),
        "aknRecitals" => json!({
            "rules": {
                "akn": "recitals",
                "html": "div[data-akn-name=recitals]",
                "attr": [{"akn": "xml:id", "html": "id"}],
                "sub": {"akn": "intro", "html": "p[data-akn-name=intro]", "flatten": "p"}
            }
        }),
        "aknRecital" => json!({
            "rules": {
                "akn": "recital",
                "html": "p[data-akn-name=recital]",
                "attr": [{"akn": "xml:id", "html": "id"}],
                "sub": [
                    {"akn": "num", "html": "p[data-akn-num]"},
                    {"akn": "mp", "html": "p"}
                ]
            }
        }),
        "aknCitations" => json!({
            "rules": {
                "akn": "citations",
                "html": "div[data-akn-name=citations]",
                "attr": [
                    {"akn": "xml:id", "html": "id"},
                    {"html": "contenteditable=false"}
                ],
                "sub": {
                    "akn": "citation",
                    "html": "p[data-akn-name=citation]",
                    "attr": [{"akn": "xml:id", "html": "id"}],
                    "flatten": "mp"
                }
            }
        }),
        "aknAuthorialNote" => json!({
            "rules": {
                "akn": "authorialNote",
                "html": "span[data-akn-name=authorialNote]",
                "attr": [
                    {"akn": "xml:id", "html": "id"},
                    {"akn": "marker", "html": "data-akn-marker"},
                    {"akn": "placement", "html": "data-akn-placement"}
                ],
                "flatten": "p"
            }
        }),
        "leosHighlight" => json!({
            "rules": {
                "akn": "span[refersto=~leoshighlight]",
                "html": "span[class=leos-highlight-*]",
                "attr": [{"akn": "class=leos-highlight-*", "html": "class=leos-highlight-*"}]
            }
        }),
        "aknOrderedList" => json!({
            "hierarchy": {
                "firstLevelConfig": {
                    "akn": "list",
                    "html": "ol[data-akn-name=list]",
                    "attr": [{"akn": "xml:id", "html": "id"}],
                    "sub": {
                        "akn": "point",
                        "html": "li",
                        "attr": [
                            {"akn": "xml:id", "html": "id"},
                            {"akn": "num/text", "html": "data-akn-num"}
                        ],
                        "flatten": "content/mp"
                    }
                },
                "rootElementsForFrom": ["list"],
                "contentWrapperForFrom": "point",
                "rootElementsForTo": ["ol", "li"]
            }
        }),
        _ => return None,
    };
    Some(declaration)
}

/// Create a registry with every built-in plugin registered.
///
/// # Errors
/// Returns `Configuration` if a built-in declaration fails to normalize.
pub fn create_leos_registry() -> Result<RuleRegistry> {
    let mut registry = RuleRegistry::new();
    for plugin_id in LEOS_PLUGINS {
        if let Some(declaration) = builtin_declaration(plugin_id) {
            let raw: RawPluginRules = serde_json::from_value(declaration)?;
            registry.register_plugin(plugin_id, &raw)?;
        }
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    #[test]
    fn test_create_leos_registry() {
        let registry = create_leos_registry().unwrap();
        assert_eq!(registry.len(), LEOS_PLUGINS.len());
        for id in LEOS_PLUGINS {
            assert!(registry.contains(id), "missing builtin {id}");
        }
    }

    #[test]
    fn test_builtin_resolution() {
        let registry = create_leos_registry().unwrap();
        let resolved = registry.resolve(LEOS_PLUGINS);

        assert!(resolved.overrides().is_empty());
        assert!(resolved.get(Direction::To, "recital").is_some());
        assert!(resolved
            .get(Direction::From, "span[class=leos-highlight-*]")
            .is_some());
        assert_eq!(resolved.hierarchies().len(), 1);
        assert_eq!(resolved.hierarchies()[0].item_tag(), "li");
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin_declaration("aknTable").is_none());
    }
}
