//! Depth-specific rule generation for self-nesting constructs.

use super::types::HierarchyProfile;
use crate::error::{MapperError, Result};
use crate::rules::{ElementRule, RuleDirection, Selector};
use crate::types::Direction;

/// Generates one rule per nesting depth from a [`HierarchyProfile`].
///
/// Expansion is pure: the same profile always yields the same rules, so they
/// are regenerated per transformation pass rather than stored.
pub struct HierarchicalExpander;

impl HierarchicalExpander {
    /// Rules for depths `1..=max_depth`, in depth order.
    #[must_use]
    pub fn expand(profile: &HierarchyProfile, direction: Direction) -> Vec<ElementRule> {
        (1..=profile.max_depth)
            .map(|depth| Self::build(profile, direction, depth))
            .collect()
    }

    /// Rule for a single depth (1-based; 0 is treated as 1).
    ///
    /// # Errors
    /// Returns `DepthExceeded` when `depth` is beyond the profile's maximum.
    pub fn expand_depth(
        profile: &HierarchyProfile,
        direction: Direction,
        depth: usize,
    ) -> Result<ElementRule> {
        let depth = depth.max(1);
        if depth > profile.max_depth {
            return Err(MapperError::DepthExceeded {
                element: profile.root_element_name.clone(),
                depth,
                max_depth: profile.max_depth,
                path: Self::path_at(profile, direction, depth),
            });
        }
        Ok(Self::build(profile, direction, depth))
    }

    fn build(profile: &HierarchyProfile, direction: Direction, depth: usize) -> ElementRule {
        let first = &profile.first_level;
        let only = RuleDirection::only(direction);

        // The item rule carries the flattened content chain and the number
        // child, so prefer the one declared on the first level.
        let item = first
            .sub_rules
            .iter()
            .find(|rule| rule.source.tag == profile.content_wrapper_name)
            .cloned()
            .unwrap_or_else(|| {
                ElementRule::new(
                    Selector::tag(&profile.content_wrapper_name),
                    Selector::tag(profile.item_tag()),
                )
            })
            .with_direction(only);

        ElementRule {
            source: first
                .source
                .clone()
                .with_nesting(&profile.root_element_name, depth - 1),
            target: first
                .target
                .clone()
                .with_nesting(profile.item_tag(), depth - 1),
            attributes: first.attributes.clone(),
            sub_rules: vec![item],
            direction: only,
            flatten: first.flatten.clone(),
        }
    }

    fn path_at(profile: &HierarchyProfile, direction: Direction, depth: usize) -> String {
        let step = match direction {
            Direction::To => [
                profile.root_element_name.as_str(),
                profile.content_wrapper_name.as_str(),
            ],
            Direction::From => [profile.list_tag(), profile.item_tag()],
        };
        vec![step.join("/"); depth].join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AttributePattern, AttributeRule};
    use pretty_assertions::assert_eq;

    fn profile() -> HierarchyProfile {
        let point = ElementRule::new(Selector::tag("point"), Selector::tag("li"))
            .with_attribute(AttributeRule::Copy {
                akn: AttributePattern::parse("xml:id").unwrap(),
                html: AttributePattern::parse("id").unwrap(),
            })
            .with_flatten(["content", "mp"]);
        let first = ElementRule::new(
            Selector::tag("list"),
            Selector::parse("ol[data-akn-name=list]").unwrap(),
        )
        .with_sub_rule(point);
        HierarchyProfile::new(first, "point", "li").with_max_depth(4)
    }

    #[test]
    fn test_expand_returns_max_depth_rules() {
        let profile = profile();
        assert_eq!(HierarchicalExpander::expand(&profile, Direction::To).len(), 4);
        assert_eq!(HierarchicalExpander::expand(&profile, Direction::From).len(), 4);
    }

    #[test]
    fn test_depth_selectors() {
        let rules = HierarchicalExpander::expand(&profile(), Direction::To);
        let sources: Vec<String> = rules.iter().map(|r| r.source.to_string()).collect();
        let targets: Vec<String> = rules.iter().map(|r| r.target.to_string()).collect();
        assert_eq!(
            sources,
            vec!["list", "list list", "list list list", "list list list list"]
        );
        assert_eq!(targets[0], "ol[data-akn-name=list]");
        assert_eq!(targets[2], "li li ol[data-akn-name=list]");
    }

    #[test]
    fn test_depth_rule_is_one_way() {
        let rule = HierarchicalExpander::expand_depth(&profile(), Direction::From, 2).unwrap();
        assert_eq!(rule.direction, RuleDirection::FromOnly);
        assert_eq!(rule.sub_rules.len(), 1);
        assert_eq!(rule.sub_rules[0].direction, RuleDirection::FromOnly);
    }

    #[test]
    fn test_item_rule_borrowed_from_first_level() {
        let rule = HierarchicalExpander::expand_depth(&profile(), Direction::To, 3).unwrap();
        let item = &rule.sub_rules[0];
        assert_eq!(item.source.tag, "point");
        assert_eq!(item.target.tag, "li");
        assert_eq!(item.flatten, vec!["content", "mp"]);
        assert_eq!(item.attributes.len(), 1);
    }

    #[test]
    fn test_item_rule_synthesized_when_undeclared() {
        let first = ElementRule::new(Selector::tag("list"), Selector::tag("ol"));
        let profile = HierarchyProfile::new(first, "indent", "li");
        let rule = HierarchicalExpander::expand_depth(&profile, Direction::To, 1).unwrap();
        assert_eq!(rule.sub_rules[0].source.tag, "indent");
        assert_eq!(rule.sub_rules[0].target.tag, "li");
    }

    #[test]
    fn test_expand_depth_beyond_max() {
        let err = HierarchicalExpander::expand_depth(&profile(), Direction::To, 5).unwrap_err();
        match err {
            MapperError::DepthExceeded {
                element,
                depth,
                max_depth,
                path,
            } => {
                assert_eq!(element, "list");
                assert_eq!(depth, 5);
                assert_eq!(max_depth, 4);
                assert!(path.starts_with("list/point/list/point"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
