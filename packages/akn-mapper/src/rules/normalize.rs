//! Conversion of plugin declarations into validated rule trees.
//!
//! Every error names the plugin and the path of the offending rule, e.g.
//! `citations > sub[0] > attr[1]`.

use tracing::warn;

use super::attribute::{AttributePattern, AttributeRule, Side};
use super::raw::{
    RawAttributeRule, RawDirection, RawDirectionName, RawElementRule, RawHierarchyProfile,
    RawPluginRules,
};
use super::selector::{Selector, ValueMatcher};
use super::types::{ElementRule, NormalizedRuleSet, RuleDirection};
use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{MapperError, Result};
use crate::hierarchy::HierarchyProfile;
use crate::types::Direction;

/// Suffix marking a child-text attribute source (`num/text`).
const CHILD_TEXT_SUFFIX: &str = "/text";

/// Normalize a single top-level declaration into a rule set.
///
/// # Errors
/// Returns `Configuration` naming the plugin and rule path on malformed input.
pub fn normalize(plugin_id: &str, raw: &RawElementRule) -> Result<NormalizedRuleSet> {
    let mut set = NormalizedRuleSet::new(plugin_id);
    set.rules.push(RuleNormalizer::new(plugin_id).rule(raw, 0)?);
    Ok(set)
}

/// Validates declarations for one plugin.
pub struct RuleNormalizer<'a> {
    plugin_id: &'a str,
}

impl<'a> RuleNormalizer<'a> {
    #[must_use]
    pub fn new(plugin_id: &'a str) -> Self {
        Self { plugin_id }
    }

    /// Normalize everything a plugin declares.
    ///
    /// # Errors
    /// Returns `Configuration` on the first malformed rule or profile, when
    /// two top-level rules share an AKN selector and a direction, or when two
    /// rules read back from the same HTML selector.
    pub fn plugin(&self, raw: &RawPluginRules) -> Result<NormalizedRuleSet> {
        let mut set = NormalizedRuleSet::new(self.plugin_id);

        for (index, raw_rule) in raw.rules.iter().enumerate() {
            let rule = self.rule(raw_rule, index)?;
            let duplicate = set.rules.iter().any(|existing| {
                existing.source == rule.source && existing.direction.overlaps(rule.direction)
            });
            if duplicate {
                return Err(self.error(
                    rule.source.to_string(),
                    "duplicate top-level selector in the same plugin",
                ));
            }
            let shared_target = set.rules.iter().any(|existing| {
                existing.target == rule.target
                    && existing.applies(Direction::From)
                    && rule.applies(Direction::From)
            });
            if shared_target {
                return Err(self.error(
                    rule.source.to_string(),
                    format!("HTML selector '{}' already mapped in the same plugin", rule.target),
                ));
            }
            set.rules.push(rule);
        }

        for (index, raw_profile) in raw.hierarchy.iter().enumerate() {
            let profile = self.hierarchy(raw_profile, index)?;
            if set
                .hierarchies
                .iter()
                .any(|p| p.root_element_name == profile.root_element_name)
            {
                return Err(self.error(
                    format!("hierarchy[{index}]"),
                    format!(
                        "duplicate hierarchy profile for <{}>",
                        profile.root_element_name
                    ),
                ));
            }
            set.hierarchies.push(profile);
        }

        Ok(set)
    }

    /// Normalize one top-level rule declaration.
    ///
    /// # Errors
    /// Returns `Configuration` on malformed input.
    pub fn rule(&self, raw: &RawElementRule, index: usize) -> Result<ElementRule> {
        let path = segment(raw, "rules", index);
        self.element(raw, &path, None)
    }

    /// Normalize a hierarchy profile declaration.
    ///
    /// # Errors
    /// Returns `Configuration` when the root or container tags disagree with
    /// the first-level rule, or when the first level declares sub-rules other
    /// than the content wrapper.
    pub fn hierarchy(&self, raw: &RawHierarchyProfile, index: usize) -> Result<HierarchyProfile> {
        let path = format!("hierarchy[{index}]");

        let [root] = raw.root_elements_for_from.as_slice() else {
            return Err(self.error(
                &path,
                format!(
                    "rootElementsForFrom must list exactly one element, got {}",
                    raw.root_elements_for_from.len()
                ),
            ));
        };
        let [list_tag, item_tag] = raw.root_elements_for_to.as_slice() else {
            return Err(self.error(
                &path,
                format!(
                    "rootElementsForTo must list the list and item tags, got {}",
                    raw.root_elements_for_to.len()
                ),
            ));
        };
        for tag in [root, list_tag, item_tag, &raw.content_wrapper_for_from] {
            self.bare_tag(tag, &path)?;
        }

        let first_path = format!("{path} > firstLevelConfig");
        let first = self.element(&raw.first_level_config, &first_path, None)?;

        if first.direction != RuleDirection::Both {
            return Err(self.error(&first_path, "first-level rule must apply in both directions"));
        }
        if first.source.nesting.is_some() || first.target.nesting.is_some() {
            return Err(self.error(&first_path, "first-level selectors cannot be nested"));
        }
        if first.source.tag != *root {
            return Err(self.error(
                &first_path,
                format!(
                    "akn selector <{}> does not match rootElementsForFrom <{root}>",
                    first.source.tag
                ),
            ));
        }
        if first.target.tag != *list_tag {
            return Err(self.error(
                &first_path,
                format!(
                    "html selector <{}> does not match list tag <{list_tag}>",
                    first.target.tag
                ),
            ));
        }
        for sub in &first.sub_rules {
            if sub.source.tag != raw.content_wrapper_for_from || sub.target.tag != *item_tag {
                return Err(self.error(
                    format!("{first_path} > {}", sub.source),
                    format!(
                        "first-level sub-rules may only map <{}> to <{item_tag}>",
                        raw.content_wrapper_for_from
                    ),
                ));
            }
        }

        let max_depth = raw.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        if max_depth == 0 {
            return Err(self.error(&path, "maxDepth must be at least 1"));
        }

        Ok(
            HierarchyProfile::new(first, &raw.content_wrapper_for_from, item_tag)
                .with_max_depth(max_depth),
        )
    }

    fn element(
        &self,
        raw: &RawElementRule,
        path: &str,
        parent: Option<RuleDirection>,
    ) -> Result<ElementRule> {
        let source = self.selector(raw.akn.as_deref(), "akn", path)?;
        let target = self.selector(raw.html.as_deref(), "html", path)?;
        let direction = self.direction(raw.direct, parent, path)?;

        let mut rule = ElementRule::new(source, target).with_direction(direction);

        for (index, raw_attr) in raw.attr.iter().enumerate() {
            let attr_path = format!("{path} > attr[{index}]");
            rule.attributes.push(self.attribute(raw_attr, &attr_path)?);
        }
        self.warn_duplicate_outputs(&rule, path);

        if let Some(flatten) = &raw.flatten {
            rule.flatten = self.flatten(flatten, path)?;
        }

        for (index, raw_sub) in raw.sub.iter().enumerate() {
            let sub_path = format!("{path} > {}", segment(raw_sub, "sub", index));
            let sub = self.element(raw_sub, &sub_path, Some(direction))?;
            rule.sub_rules.push(sub);
        }

        Ok(rule)
    }

    fn warn_duplicate_outputs(&self, rule: &ElementRule, path: &str) {
        for direction in [Direction::To, Direction::From] {
            let mut seen: Vec<&str> = Vec::new();
            for name in rule.attributes.iter().filter_map(|a| a.output_name(direction)) {
                if seen.contains(&name) {
                    warn!(
                        plugin = self.plugin_id,
                        rule = path,
                        attribute = name,
                        direction = %direction,
                        "Attribute written by several rules, the last one wins"
                    );
                }
                seen.push(name);
            }
        }
    }

    fn selector(&self, value: Option<&str>, side: &str, path: &str) -> Result<Selector> {
        let value = value.ok_or_else(|| self.error(path, format!("missing '{side}' selector")))?;
        Selector::parse(value).map_err(|e| self.error(path, e.to_string()))
    }

    fn direction(
        &self,
        raw: Option<RawDirection>,
        parent: Option<RuleDirection>,
        path: &str,
    ) -> Result<RuleDirection> {
        let inherited = parent.unwrap_or_default();
        let declared = match raw {
            None => return Ok(inherited),
            Some(RawDirection::Flag(true) | RawDirection::Named(RawDirectionName::To)) => {
                RuleDirection::ToOnly
            }
            Some(RawDirection::Named(RawDirectionName::From)) => RuleDirection::FromOnly,
            Some(RawDirection::Flag(false) | RawDirection::Named(RawDirectionName::Both)) => {
                RuleDirection::Both
            }
        };

        match (inherited, declared) {
            (RuleDirection::Both, declared) => Ok(declared),
            (inherited, RuleDirection::Both) => Ok(inherited),
            (inherited, declared) if inherited == declared => Ok(declared),
            (inherited, declared) => Err(self.error(
                path,
                format!(
                    "direction '{}' conflicts with parent direction '{}'",
                    declared.as_str(),
                    inherited.as_str()
                ),
            )),
        }
    }

    fn attribute(&self, raw: &RawAttributeRule, path: &str) -> Result<AttributeRule> {
        match (raw.akn.as_deref(), raw.html.as_deref()) {
            (None, None) => Err(self.error(path, "attribute rule has neither 'akn' nor 'html' side")),
            (Some(akn), Some(html)) => {
                if let Some(child) = akn.strip_suffix(CHILD_TEXT_SUFFIX) {
                    return self.child_text(child, html, path);
                }
                let akn = self.pattern(akn, path)?;
                let html = self.pattern(html, path)?;
                if wildcard_mismatch(&akn.value, &html.value) {
                    return Err(self.error(
                        path,
                        format!(
                            "wildcard in '{akn}' paired with fixed value in '{html}' (missing '*' placeholder)"
                        ),
                    ));
                }
                Ok(AttributeRule::Copy { akn, html })
            }
            (Some(value), None) => self.literal(Side::Akn, value, path),
            (None, Some(value)) => self.literal(Side::Html, value, path),
        }
    }

    fn child_text(&self, child: &str, html: &str, path: &str) -> Result<AttributeRule> {
        self.bare_tag(child, path)?;
        let pattern = self.pattern(html, path)?;
        if pattern.value != ValueMatcher::Any {
            return Err(self.error(
                path,
                format!("child text can only be carried by a plain attribute name, got '{html}'"),
            ));
        }
        Ok(AttributeRule::ChildText {
            child: child.to_string(),
            attribute: pattern.name,
        })
    }

    fn literal(&self, side: Side, value: &str, path: &str) -> Result<AttributeRule> {
        let pattern = self.pattern(value, path)?;
        match pattern.value {
            ValueMatcher::Exact(fixed) => Ok(AttributeRule::Literal {
                side,
                name: pattern.name,
                value: fixed,
            }),
            _ => Err(self.error(
                path,
                format!("one-sided attribute rule must be a name=value literal, got '{value}'"),
            )),
        }
    }

    fn pattern(&self, value: &str, path: &str) -> Result<AttributePattern> {
        AttributePattern::parse(value).map_err(|reason| self.error(path, reason))
    }

    fn flatten(&self, value: &str, path: &str) -> Result<Vec<String>> {
        let segments: Vec<String> = value.split('/').map(|s| s.trim().to_string()).collect();
        for segment in &segments {
            self.bare_tag(segment, path)?;
        }
        Ok(segments)
    }

    fn bare_tag(&self, tag: &str, path: &str) -> Result<()> {
        match Selector::parse(tag) {
            Ok(selector) if selector.predicates.is_empty() && selector.nesting.is_none() => Ok(()),
            _ => Err(self.error(path, format!("'{tag}' is not a plain element name"))),
        }
    }

    fn error(&self, path: impl Into<String>, reason: impl Into<String>) -> MapperError {
        MapperError::configuration(self.plugin_id, path, reason)
    }
}

/// Path segment naming a rule: its AKN selector, or its position when absent.
fn segment(raw: &RawElementRule, list: &str, index: usize) -> String {
    raw.akn
        .clone()
        .unwrap_or_else(|| format!("{list}[{index}]"))
}

fn wildcard_mismatch(a: &ValueMatcher, b: &ValueMatcher) -> bool {
    matches!(
        (a, b),
        (ValueMatcher::Prefix(_), ValueMatcher::Exact(_))
            | (ValueMatcher::Exact(_), ValueMatcher::Prefix(_))
    )
}
