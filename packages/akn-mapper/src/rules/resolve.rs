//! Composition of the active plugins' rules into one lookup table.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use super::selector::Selector;
use super::types::{ElementRule, NormalizedRuleSet};
use crate::hierarchy::HierarchyProfile;
use crate::types::{Direction, Element};

/// Scope recorded for hierarchy profile overrides.
const HIERARCHY_SCOPE: &str = "hierarchy profile";

/// A rule replaced by a later plugin during resolution.
///
/// Overrides are expected when plugins customize each other; they are
/// recorded and logged, never raised as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOverride {
    pub direction: Direction,
    /// Input selector of the replaced rule.
    pub selector: String,
    pub replaced_plugin: String,
    pub winning_plugin: String,
    /// Path of the enclosing rule for sub-rule overrides, `None` at top level.
    pub scope: Option<String>,
}

impl fmt::Display for RuleOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.direction, self.selector)?;
        if let Some(scope) = &self.scope {
            write!(f, " (in {scope})")?;
        }
        write!(
            f,
            ": '{}' overrides '{}'",
            self.winning_plugin, self.replaced_plugin
        )
    }
}

/// A rule in the resolved table together with the plugin that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRule {
    pub direction: Direction,
    pub rule: ElementRule,
    pub plugin_id: String,
    sequence: usize,
}

/// Rules of the active plugins, keyed by direction and input selector.
///
/// Built by [`RuleResolver::resolve`] and never mutated afterwards; a change
/// of the active plugin set builds a new one.
#[derive(Debug, Clone, Default)]
pub struct ResolvedRuleSet {
    entries: Vec<ResolvedRule>,
    keys: HashMap<(Direction, String), usize>,
    by_tag: HashMap<Direction, HashMap<String, Vec<usize>>>,
    hierarchies: Vec<HierarchyProfile>,
    overrides: Vec<RuleOverride>,
    plugins: Vec<String>,
}

impl ResolvedRuleSet {
    /// Look up a rule by direction and selector shorthand.
    #[must_use]
    pub fn get(&self, direction: Direction, selector: &str) -> Option<&ElementRule> {
        self.entry(direction, selector).map(|entry| &entry.rule)
    }

    /// Look up a rule with the plugin that supplied it.
    #[must_use]
    pub fn entry(&self, direction: Direction, selector: &str) -> Option<&ResolvedRule> {
        let key = Selector::parse(selector).ok()?.to_string();
        self.keys
            .get(&(direction, key))
            .map(|&index| &self.entries[index])
    }

    /// Find the most specific rule matching an element read in `direction`.
    ///
    /// Ties go to the rule supplied last.
    #[must_use]
    pub fn find<S: AsRef<str>>(
        &self,
        direction: Direction,
        element: &Element,
        ancestors: &[S],
    ) -> Option<&ElementRule> {
        self.by_tag
            .get(&direction)?
            .get(&element.tag)?
            .iter()
            .map(|&index| &self.entries[index].rule)
            .find(|rule| rule.input_selector(direction).matches(element, ancestors))
    }

    /// Iterate over the rules taking part in `direction`.
    pub fn rules(&self, direction: Direction) -> impl Iterator<Item = &ResolvedRule> {
        self.entries
            .iter()
            .filter(move |entry| entry.direction == direction)
    }

    /// Active hierarchy profiles.
    #[must_use]
    pub fn hierarchies(&self) -> &[HierarchyProfile] {
        &self.hierarchies
    }

    /// The hierarchy profile whose construct `element` opens, if any.
    #[must_use]
    pub fn hierarchy_for(&self, direction: Direction, element: &Element) -> Option<&HierarchyProfile> {
        self.hierarchies
            .iter()
            .find(|profile| profile.starts_at(direction, element))
    }

    /// Overrides recorded while resolving, in the order they happened.
    #[must_use]
    pub fn overrides(&self) -> &[RuleOverride] {
        &self.overrides
    }

    /// Plugin ids in composition order.
    #[must_use]
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Number of (direction, selector) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.hierarchies.is_empty()
    }
}

/// Flattens ordered rule sets into a [`ResolvedRuleSet`].
///
/// Composition order, not registration time, decides conflicts: a rule
/// supplied later replaces an earlier rule with the same direction and input
/// selector. Sub-rules of the two are merged so a plugin can override one
/// child mapping without restating its siblings.
pub struct RuleResolver {
    resolved: ResolvedRuleSet,
    sequence: usize,
    hierarchy_owners: HashMap<String, String>,
}

impl RuleResolver {
    /// Resolve rule sets in the given order.
    #[must_use]
    pub fn resolve<'a>(sets: impl IntoIterator<Item = &'a NormalizedRuleSet>) -> ResolvedRuleSet {
        let mut resolver = Self {
            resolved: ResolvedRuleSet::default(),
            sequence: 0,
            hierarchy_owners: HashMap::new(),
        };
        for set in sets {
            resolver.add(set);
        }
        resolver.finish()
    }

    fn add(&mut self, set: &NormalizedRuleSet) {
        debug!(plugin = %set.plugin_id, rules = set.rules.len(), "Resolving plugin rules");
        self.resolved.plugins.push(set.plugin_id.clone());

        for rule in &set.rules {
            for direction in [Direction::To, Direction::From] {
                if rule.applies(direction) {
                    self.insert(direction, rule, &set.plugin_id);
                }
            }
        }

        for profile in &set.hierarchies {
            self.insert_hierarchy(profile, &set.plugin_id);
        }
    }

    fn insert(&mut self, direction: Direction, rule: &ElementRule, plugin_id: &str) {
        let selector = rule.input_selector(direction).to_string();
        self.sequence += 1;

        let key = (direction, selector.clone());
        match self.resolved.keys.get(&key).copied() {
            Some(index) => {
                let previous = &self.resolved.entries[index];
                let replaced_plugin = previous.plugin_id.clone();
                let mut overrides = vec![override_record(
                    direction,
                    &selector,
                    &replaced_plugin,
                    plugin_id,
                    None,
                )];
                let merged = merge(
                    &previous.rule,
                    rule,
                    direction,
                    &selector,
                    &replaced_plugin,
                    plugin_id,
                    &mut overrides,
                );
                self.resolved.overrides.extend(overrides);
                self.resolved.entries[index] = ResolvedRule {
                    direction,
                    rule: merged,
                    plugin_id: plugin_id.to_string(),
                    sequence: self.sequence,
                };
            }
            None => {
                self.resolved.keys.insert(key, self.resolved.entries.len());
                self.resolved.entries.push(ResolvedRule {
                    direction,
                    rule: rule.clone(),
                    plugin_id: plugin_id.to_string(),
                    sequence: self.sequence,
                });
            }
        }
    }

    fn insert_hierarchy(&mut self, profile: &HierarchyProfile, plugin_id: &str) {
        let existing = self
            .resolved
            .hierarchies
            .iter()
            .position(|p| p.root_element_name == profile.root_element_name);

        match existing {
            Some(index) => {
                let replaced_plugin = self
                    .hierarchy_owners
                    .get(&profile.root_element_name)
                    .cloned()
                    .unwrap_or_default();
                for direction in [Direction::To, Direction::From] {
                    self.resolved.overrides.push(override_record(
                        direction,
                        &profile.root_element_name,
                        &replaced_plugin,
                        plugin_id,
                        Some(HIERARCHY_SCOPE),
                    ));
                }
                self.resolved.hierarchies[index] = profile.clone();
            }
            None => self.resolved.hierarchies.push(profile.clone()),
        }
        self.hierarchy_owners
            .insert(profile.root_element_name.clone(), plugin_id.to_string());
    }

    fn finish(mut self) -> ResolvedRuleSet {
        let mut by_tag: HashMap<Direction, HashMap<String, Vec<usize>>> = HashMap::new();
        for (index, entry) in self.resolved.entries.iter().enumerate() {
            by_tag
                .entry(entry.direction)
                .or_default()
                .entry(entry.rule.input_selector(entry.direction).tag.clone())
                .or_default()
                .push(index);
        }

        let entries = &self.resolved.entries;
        for candidates in by_tag.values_mut().flat_map(HashMap::values_mut) {
            candidates.sort_by(|&a, &b| {
                let (a, b) = (&entries[a], &entries[b]);
                b.rule
                    .input_selector(b.direction)
                    .specificity()
                    .cmp(&a.rule.input_selector(a.direction).specificity())
                    .then(b.sequence.cmp(&a.sequence))
            });
        }

        self.resolved.by_tag = by_tag;
        self.resolved
    }
}

fn override_record(
    direction: Direction,
    selector: &str,
    replaced_plugin: &str,
    winning_plugin: &str,
    scope: Option<&str>,
) -> RuleOverride {
    warn!(
        direction = %direction,
        selector,
        replaced = replaced_plugin,
        winner = winning_plugin,
        scope = scope.unwrap_or("top level"),
        "Rule override"
    );
    RuleOverride {
        direction,
        selector: selector.to_string(),
        replaced_plugin: replaced_plugin.to_string(),
        winning_plugin: winning_plugin.to_string(),
        scope: scope.map(str::to_string),
    }
}

/// Merge `later` over `earlier`: the later rule's own fields win and the
/// sub-rules are unioned, replacing those with an identical input selector.
fn merge(
    earlier: &ElementRule,
    later: &ElementRule,
    direction: Direction,
    scope: &str,
    replaced_plugin: &str,
    winning_plugin: &str,
    overrides: &mut Vec<RuleOverride>,
) -> ElementRule {
    let mut merged = later.clone();
    let mut sub_rules: Vec<ElementRule> = earlier.sub_rules.clone();

    for sub in &later.sub_rules {
        let selector = sub.input_selector(direction);
        let existing = sub_rules.iter().position(|candidate| {
            candidate.input_selector(direction) == selector
                && candidate.direction.overlaps(sub.direction)
        });
        match existing {
            Some(index) if sub.applies(direction) => {
                let selector = selector.to_string();
                overrides.push(override_record(
                    direction,
                    &selector,
                    replaced_plugin,
                    winning_plugin,
                    Some(scope),
                ));
                let nested_scope = format!("{scope} > {selector}");
                sub_rules[index] = merge(
                    &sub_rules[index],
                    sub,
                    direction,
                    &nested_scope,
                    replaced_plugin,
                    winning_plugin,
                    overrides,
                );
            }
            Some(index) => sub_rules[index] = sub.clone(),
            None => sub_rules.push(sub.clone()),
        }
    }

    merged.sub_rules = sub_rules;
    merged
}
