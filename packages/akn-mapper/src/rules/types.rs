//! Types for the rule registry system.

use super::attribute::AttributeRule;
use super::selector::Selector;
use crate::hierarchy::HierarchyProfile;
use crate::types::Direction;

/// Which transformation directions a rule takes part in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RuleDirection {
    #[default]
    Both,
    /// Only when loading into the editor.
    ToOnly,
    /// Only when saving from the editor.
    FromOnly,
}

impl RuleDirection {
    /// Restrict to a single direction.
    #[must_use]
    pub fn only(direction: Direction) -> Self {
        match direction {
            Direction::To => Self::ToOnly,
            Direction::From => Self::FromOnly,
        }
    }

    /// Check whether the rule takes part in `direction`.
    #[must_use]
    pub fn applies(&self, direction: Direction) -> bool {
        match self {
            Self::Both => true,
            Self::ToOnly => direction == Direction::To,
            Self::FromOnly => direction == Direction::From,
        }
    }

    /// Check whether both directions share at least one pass direction.
    #[must_use]
    pub fn overlaps(&self, other: RuleDirection) -> bool {
        [Direction::To, Direction::From]
            .into_iter()
            .any(|d| self.applies(d) && other.applies(d))
    }

    /// Get the string value used in diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::ToOnly => "to",
            Self::FromOnly => "from",
        }
    }
}

/// Declarative mapping between one AKN element and one HTML element.
///
/// `source` is the legal-XML side and `target` the HTML side, regardless of
/// the direction a pass runs in; see [`ElementRule::input_selector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRule {
    /// Legal-XML selector.
    pub source: Selector,

    /// HTML selector.
    pub target: Selector,

    /// Attribute mappings, applied in order.
    pub attributes: Vec<AttributeRule>,

    /// Rules scoping the element's children.
    ///
    /// Children not covered here fall back to the top-level rule set.
    pub sub_rules: Vec<ElementRule>,

    pub direction: RuleDirection,

    /// AKN wrapper chain collapsed on the HTML side (e.g. `["content", "mp"]`).
    pub flatten: Vec<String>,
}

impl ElementRule {
    /// Create a bidirectional rule without attributes or sub-rules.
    #[must_use]
    pub fn new(source: Selector, target: Selector) -> Self {
        Self {
            source,
            target,
            attributes: Vec::new(),
            sub_rules: Vec::new(),
            direction: RuleDirection::Both,
            flatten: Vec::new(),
        }
    }

    /// Add an attribute rule.
    #[must_use]
    pub fn with_attribute(mut self, rule: AttributeRule) -> Self {
        self.attributes.push(rule);
        self
    }

    /// Add a sub-rule.
    #[must_use]
    pub fn with_sub_rule(mut self, rule: ElementRule) -> Self {
        self.sub_rules.push(rule);
        self
    }

    /// Set the direction.
    #[must_use]
    pub fn with_direction(mut self, direction: RuleDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the flattened wrapper chain.
    #[must_use]
    pub fn with_flatten(mut self, path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.flatten = path.into_iter().map(Into::into).collect();
        self
    }

    /// Selector matched against nodes read in `direction`.
    #[must_use]
    pub fn input_selector(&self, direction: Direction) -> &Selector {
        match direction {
            Direction::To => &self.source,
            Direction::From => &self.target,
        }
    }

    /// Selector used to build nodes written in `direction`.
    #[must_use]
    pub fn output_selector(&self, direction: Direction) -> &Selector {
        match direction {
            Direction::To => &self.target,
            Direction::From => &self.source,
        }
    }

    /// Check whether the rule takes part in `direction`.
    #[must_use]
    pub fn applies(&self, direction: Direction) -> bool {
        self.direction.applies(direction)
    }
}

/// Normalized rules contributed by one plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRuleSet {
    pub plugin_id: String,
    pub rules: Vec<ElementRule>,
    pub hierarchies: Vec<HierarchyProfile>,
}

impl NormalizedRuleSet {
    /// Create an empty set for a plugin.
    #[must_use]
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            rules: Vec::new(),
            hierarchies: Vec::new(),
        }
    }

    /// Check whether the plugin contributes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.hierarchies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_direction_applies() {
        assert!(RuleDirection::Both.applies(Direction::To));
        assert!(RuleDirection::Both.applies(Direction::From));
        assert!(RuleDirection::ToOnly.applies(Direction::To));
        assert!(!RuleDirection::ToOnly.applies(Direction::From));
        assert_eq!(RuleDirection::only(Direction::From), RuleDirection::FromOnly);
        assert!(RuleDirection::Both.overlaps(RuleDirection::ToOnly));
        assert!(!RuleDirection::ToOnly.overlaps(RuleDirection::FromOnly));
    }

    #[test]
    fn test_element_rule_selectors_by_direction() {
        let rule = ElementRule::new(Selector::tag("recital"), Selector::tag("p"));
        assert_eq!(rule.input_selector(Direction::To).tag, "recital");
        assert_eq!(rule.output_selector(Direction::To).tag, "p");
        assert_eq!(rule.input_selector(Direction::From).tag, "p");
        assert_eq!(rule.output_selector(Direction::From).tag, "recital");
    }

    #[test]
    fn test_element_rule_builder() {
        let rule = ElementRule::new(Selector::tag("point"), Selector::tag("li"))
            .with_flatten(["content", "mp"])
            .with_direction(RuleDirection::ToOnly)
            .with_sub_rule(ElementRule::new(Selector::tag("num"), Selector::tag("span")));
        assert_eq!(rule.flatten, vec!["content", "mp"]);
        assert_eq!(rule.sub_rules.len(), 1);
        assert!(!rule.applies(Direction::From));
    }
}
