//! Plugin rule registry.

use std::collections::HashMap;

use tracing::{debug, info};

use super::normalize::{normalize, RuleNormalizer};
use super::raw::{RawElementRule, RawPluginRules};
use super::resolve::{ResolvedRuleSet, RuleResolver};
use super::types::NormalizedRuleSet;
use crate::config::validate_plugin_id;
use crate::error::Result;

/// Registry mapping plugin ids to their normalized rules.
///
/// Plugins register while an editor profile is being set up; transformations
/// only read from it through [`RuleRegistry::resolve`].
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    plugins: HashMap<String, NormalizedRuleSet>,
}

impl RuleRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Register a plugin's rules, replacing anything it registered before.
    ///
    /// # Errors
    /// Returns `InvalidPluginId` when the id does not follow the naming convention.
    pub fn register(&mut self, plugin_id: impl Into<String>, mut rules: NormalizedRuleSet) -> Result<()> {
        let plugin_id = plugin_id.into();
        validate_plugin_id(&plugin_id)?;

        rules.plugin_id.clone_from(&plugin_id);
        info!(
            plugin = %plugin_id,
            rules = rules.rules.len(),
            hierarchies = rules.hierarchies.len(),
            "Registered plugin rules"
        );
        if self.plugins.insert(plugin_id, rules).is_some() {
            debug!("Replaced previously registered rules");
        }
        Ok(())
    }

    /// Normalize a declaration and add it to the plugin's rules.
    ///
    /// A fragment whose top-level selector the plugin already registered for
    /// an overlapping direction replaces that rule.
    ///
    /// # Errors
    /// Returns `InvalidPluginId` or `Configuration` on malformed input; the
    /// registry is left unchanged.
    pub fn register_rule_fragment(&mut self, plugin_id: &str, raw: &RawElementRule) -> Result<()> {
        validate_plugin_id(plugin_id)?;
        let fragment = normalize(plugin_id, raw)?;

        let set = self
            .plugins
            .entry(plugin_id.to_string())
            .or_insert_with(|| NormalizedRuleSet::new(plugin_id));

        for rule in fragment.rules {
            let existing = set
                .rules
                .iter()
                .position(|r| r.source == rule.source && r.direction.overlaps(rule.direction));
            debug!(plugin = plugin_id, selector = %rule.source, "Registered rule fragment");
            match existing {
                Some(index) => set.rules[index] = rule,
                None => set.rules.push(rule),
            }
        }
        Ok(())
    }

    /// Normalize and register everything a plugin declares.
    ///
    /// # Errors
    /// Returns `InvalidPluginId` or `Configuration` on malformed input.
    pub fn register_plugin(&mut self, plugin_id: &str, raw: &RawPluginRules) -> Result<()> {
        validate_plugin_id(plugin_id)?;
        let rules = RuleNormalizer::new(plugin_id).plugin(raw)?;
        self.register(plugin_id, rules)
    }

    /// Rule sets for `plugin_ids`, in the order given.
    ///
    /// Ids without registered rules belong to plugins that only contribute
    /// UI and are skipped.
    #[must_use]
    pub fn lookup<S: AsRef<str>>(&self, plugin_ids: &[S]) -> Vec<&NormalizedRuleSet> {
        plugin_ids
            .iter()
            .filter_map(|id| {
                let id = id.as_ref();
                let found = self.plugins.get(id);
                if found.is_none() {
                    debug!(plugin = id, "No rules registered, skipping");
                }
                found
            })
            .collect()
    }

    /// Resolve the rules of `plugin_ids` in the order given.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, plugin_ids: &[S]) -> ResolvedRuleSet {
        RuleResolver::resolve(self.lookup(plugin_ids))
    }

    /// Get a plugin's rules.
    #[must_use]
    pub fn get(&self, plugin_id: &str) -> Option<&NormalizedRuleSet> {
        self.plugins.get(plugin_id)
    }

    /// Check if a plugin has registered rules.
    #[must_use]
    pub fn contains(&self, plugin_id: &str) -> bool {
        self.plugins.contains_key(plugin_id)
    }

    /// Remove a plugin's rules.
    pub fn unregister(&mut self, plugin_id: &str) -> Option<NormalizedRuleSet> {
        self.plugins.remove(plugin_id)
    }

    /// Remove all registrations.
    pub fn clear(&mut self) {
        self.plugins.clear();
    }

    /// Registered plugin ids, sorted.
    #[must_use]
    pub fn plugin_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapperError;
    use crate::types::Direction;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawElementRule {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = RuleRegistry::new();
        registry
            .register_rule_fragment("aknRecital", &raw(json!({"akn": "recital", "html": "p"})))
            .unwrap();

        assert!(registry.contains("aknRecital"));
        assert_eq!(registry.get("aknRecital").unwrap().rules.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_fragments_accumulate_and_replace() {
        let mut registry = RuleRegistry::new();
        registry
            .register_rule_fragment("p", &raw(json!({"akn": "recital", "html": "p"})))
            .unwrap();
        registry
            .register_rule_fragment("p", &raw(json!({"akn": "recitals", "html": "div"})))
            .unwrap();
        registry
            .register_rule_fragment("p", &raw(json!({"akn": "recital", "html": "section"})))
            .unwrap();

        let rules = &registry.get("p").unwrap().rules;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].target.tag, "section");
    }

    #[test]
    fn test_register_replaces_previous_set() {
        let mut registry = RuleRegistry::new();
        registry
            .register_rule_fragment("p", &raw(json!({"akn": "recital", "html": "p"})))
            .unwrap();
        registry.register("p", NormalizedRuleSet::new("ignored")).unwrap();

        let set = registry.get("p").unwrap();
        assert!(set.is_empty());
        assert_eq!(set.plugin_id, "p");
    }

    #[test]
    fn test_invalid_plugin_id() {
        let mut registry = RuleRegistry::new();
        let err = registry
            .register_rule_fragment("1bad", &raw(json!({"akn": "a", "html": "b"})))
            .unwrap_err();
        assert!(matches!(err, MapperError::InvalidPluginId(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_configuration_error_leaves_registry_unchanged() {
        let mut registry = RuleRegistry::new();
        let err = registry
            .register_rule_fragment("p", &raw(json!({"akn": "recital"})))
            .unwrap_err();
        assert!(matches!(err, MapperError::Configuration { .. }));
        assert!(!registry.contains("p"));
    }

    #[test]
    fn test_lookup_keeps_caller_order_and_skips_unknown() {
        let mut registry = RuleRegistry::new();
        for id in ["A", "B"] {
            registry
                .register_rule_fragment(id, &raw(json!({"akn": "citation", "html": "p"})))
                .unwrap();
        }

        let ids: Vec<&str> = registry
            .lookup(&["B", "toolbar", "A"])
            .iter()
            .map(|set| set.plugin_id.as_str())
            .collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_resolve_and_clear() {
        let mut registry = RuleRegistry::new();
        registry
            .register_rule_fragment("A", &raw(json!({"akn": "citation", "html": "p"})))
            .unwrap();
        registry
            .register_rule_fragment("B", &raw(json!({"akn": "citation", "html": "div"})))
            .unwrap();

        let resolved = registry.resolve(&["A", "B"]);
        assert_eq!(resolved.get(Direction::To, "citation").unwrap().target.tag, "div");

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.resolve(&["A", "B"]).is_empty());
    }

    #[test]
    fn test_plugin_ids_sorted() {
        let mut registry = RuleRegistry::new();
        for id in ["zeta", "alpha"] {
            registry.register(id, NormalizedRuleSet::new(id)).unwrap();
        }
        assert_eq!(registry.plugin_ids(), vec!["alpha", "zeta"]);
        assert!(registry.unregister("zeta").is_some());
        assert_eq!(registry.len(), 1);
    }
}
