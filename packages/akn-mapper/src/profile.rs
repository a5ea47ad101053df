//! Editor profile files.
//!
//! A profile lists the plugins an editor loads, the order they are composed
//! in and the pass options. YAML and JSON are both accepted:
//!
//! ```yaml
//! builtin: true
//! plugins:
//!   - id: plainBold
//!     rules:
//!       akn: b
//!       html: b
//! active: [aknInlines, plainBold]
//! options:
//!   unmatched: keep
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{TransformOptions, MAX_ACTIVE_PLUGINS};
use crate::error::{MapperError, Result};
use crate::mapper::SchemaMapper;
use crate::rules::{create_leos_registry, RawPluginRules, RuleRegistry, LEOS_PLUGINS};

/// One plugin declared by a profile.
///
/// A plugin with no rules is valid; editors list UI-only plugins this way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDeclaration {
    pub id: String,

    #[serde(flatten)]
    pub declarations: RawPluginRules,
}

/// Parsed editor profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorProfile {
    /// Register the built-in LEOS plugins before the declared ones.
    pub builtin: bool,

    pub plugins: Vec<PluginDeclaration>,

    /// Composition order. When absent: built-ins (if enabled), then the
    /// declared plugins in file order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<Vec<String>>,

    pub options: TransformOptions,
}

impl Default for EditorProfile {
    fn default() -> Self {
        Self {
            builtin: true,
            plugins: Vec::new(),
            active: None,
            options: TransformOptions::default(),
        }
    }
}

impl EditorProfile {
    /// Load a profile, picking the format from the file extension.
    ///
    /// `.json` files are read as JSON; anything else as YAML.
    ///
    /// # Errors
    /// Returns `Io` when the file cannot be read, or a parse error.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Parse a YAML profile.
    ///
    /// # Errors
    /// Returns `YamlParse` on malformed YAML or unknown fields.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse a JSON profile.
    ///
    /// # Errors
    /// Returns `Json` on malformed JSON or unknown fields.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Effective composition order.
    #[must_use]
    pub fn active_plugins(&self) -> Vec<String> {
        if let Some(active) = &self.active {
            return active.clone();
        }
        let builtin = self
            .builtin
            .then_some(LEOS_PLUGINS)
            .unwrap_or_default()
            .iter()
            .map(|id| (*id).to_string());
        builtin
            .chain(self.plugins.iter().map(|plugin| plugin.id.clone()))
            .collect()
    }

    /// Normalize every declared plugin into a registry.
    ///
    /// # Errors
    /// Returns `Configuration` for a malformed declaration or a plugin id
    /// declared twice, and `InvalidPluginId` for a bad id.
    pub fn build_registry(&self) -> Result<RuleRegistry> {
        let mut registry = if self.builtin {
            create_leos_registry()?
        } else {
            RuleRegistry::new()
        };

        let mut seen = HashSet::new();
        for plugin in &self.plugins {
            if !seen.insert(plugin.id.as_str()) {
                return Err(MapperError::configuration(
                    &plugin.id,
                    "plugins",
                    "plugin declared more than once",
                ));
            }
            registry.register_plugin(&plugin.id, &plugin.declarations)?;
        }
        Ok(registry)
    }

    /// Build a mapper with the profile's plugins, order and options.
    ///
    /// # Errors
    /// Returns `UnknownPlugin` when the active list names a plugin that is
    /// neither declared nor built in, `Configuration` when the list is too
    /// long, plus any error from [`Self::build_registry`].
    pub fn into_mapper(self) -> Result<SchemaMapper> {
        let registry = self.build_registry()?;
        let active = self.active_plugins();

        if active.len() > MAX_ACTIVE_PLUGINS {
            return Err(MapperError::configuration(
                "profile",
                "active",
                format!(
                    "{} active plugins exceed the limit of {MAX_ACTIVE_PLUGINS}",
                    active.len()
                ),
            ));
        }
        if let Some(unknown) = active.iter().find(|id| !registry.contains(id.as_str())) {
            return Err(MapperError::UnknownPlugin(unknown.clone()));
        }

        info!(
            plugins = registry.len(),
            active = active.len(),
            "Loaded editor profile"
        );
        Ok(SchemaMapper::new(registry)
            .with_options(self.options)
            .with_active(active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnmatchedElementPolicy;
    use crate::types::{Direction, DocumentNode};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PROFILE: &str = r#"
plugins:
  - id: plainBold
    rules:
      akn: b
      html: b
  - id: toolbar
active: [aknInlines, plainBold, toolbar]
options:
  unmatched: keep
"#;

    #[test]
    fn test_parse_yaml_profile() {
        let profile = EditorProfile::from_yaml_str(PROFILE).unwrap();
        assert!(profile.builtin);
        assert_eq!(profile.plugins.len(), 2);
        assert_eq!(profile.plugins[0].declarations.rules.len(), 1);
        assert!(profile.plugins[1].declarations.rules.is_empty());
        assert_eq!(profile.options.unmatched, UnmatchedElementPolicy::Keep);
        assert!(profile.options.drop_blank_text);
    }

    #[test]
    fn test_default_active_order() {
        let profile = EditorProfile::from_yaml_str("plugins: [{id: extra}]").unwrap();
        let active = profile.active_plugins();
        assert_eq!(active.len(), LEOS_PLUGINS.len() + 1);
        assert_eq!(active[0], LEOS_PLUGINS[0]);
        assert_eq!(active.last().map(String::as_str), Some("extra"));

        let bare = EditorProfile::from_yaml_str("builtin: false\nplugins: [{id: extra}]").unwrap();
        assert_eq!(bare.active_plugins(), vec!["extra"]);
    }

    #[test]
    fn test_into_mapper_uses_active_order() {
        let mut mapper = EditorProfile::from_yaml_str(PROFILE)
            .unwrap()
            .into_mapper()
            .unwrap();
        let html = mapper
            .transform(Direction::To, &DocumentNode::element("b"))
            .unwrap();
        assert_eq!(html, DocumentNode::element("b"));
        assert_eq!(mapper.options().unmatched, UnmatchedElementPolicy::Keep);
    }

    #[test]
    fn test_unknown_active_plugin() {
        let profile = EditorProfile::from_yaml_str("active: [aknInlines, missing]").unwrap();
        let err = profile.into_mapper().unwrap_err();
        assert!(matches!(err, MapperError::UnknownPlugin(ref id) if id == "missing"));
    }

    #[test]
    fn test_builtin_disabled_hides_builtins() {
        let profile = EditorProfile::from_yaml_str("builtin: false\nactive: [aknInlines]").unwrap();
        assert!(matches!(
            profile.into_mapper(),
            Err(MapperError::UnknownPlugin(_))
        ));
    }

    #[test]
    fn test_duplicate_plugin_declaration() {
        let profile =
            EditorProfile::from_yaml_str("plugins: [{id: twice}, {id: twice}]").unwrap();
        let err = profile.build_registry().unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_malformed_rule_reported() {
        let profile = EditorProfile::from_yaml_str(
            "plugins:\n  - id: broken\n    rules:\n      akn: recital\n",
        )
        .unwrap();
        let err = profile.build_registry().unwrap_err();
        assert!(matches!(err, MapperError::Configuration { ref plugin, .. } if plugin == "broken"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(EditorProfile::from_yaml_str("plugin: []").is_err());
    }

    #[test]
    fn test_from_path_json() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(
            file,
            r#"{{"builtin": false, "plugins": [{{"id": "p", "rules": [{{"akn": "mp", "html": "p"}}]}}]}}"#
        )
        .unwrap();

        let profile = EditorProfile::from_path(file.path()).unwrap();
        assert!(!profile.builtin);
        assert_eq!(profile.active_plugins(), vec!["p"]);
        assert_eq!(profile.build_registry().unwrap().len(), 1);
    }
}
