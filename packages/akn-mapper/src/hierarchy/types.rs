//! Types for the hierarchy expansion system.

use crate::config::DEFAULT_MAX_DEPTH;
use crate::rules::ElementRule;
use crate::types::{Direction, Element};

/// Parameters of one self-nesting legal-numbering construct.
///
/// The construct nests inside itself without bound on the AKN side:
///
/// ```text
/// list
/// └── point (content wrapper)
///     ├── num
///     ├── content/mp
///     └── list (nested)
///         └── point
/// ```
///
/// and maps onto one ordered-list/list-item pair per depth on the HTML side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyProfile {
    /// AKN element that nests inside itself (e.g. `list`).
    pub root_element_name: String,

    /// AKN element mapped to each list item (e.g. `point`, `indent`).
    pub content_wrapper_name: String,

    /// HTML list and item tags (e.g. `ol`, `li`).
    pub html_container_tags: (String, String),

    /// Deepest level transformations accept.
    pub max_depth: usize,

    /// Rule for the first level; deeper levels are derived from it.
    pub first_level: ElementRule,
}

impl HierarchyProfile {
    /// Create a profile from its first-level rule.
    ///
    /// The root element and list tag are the first-level rule's tags.
    #[must_use]
    pub fn new(
        first_level: ElementRule,
        content_wrapper_name: impl Into<String>,
        item_tag: impl Into<String>,
    ) -> Self {
        Self {
            root_element_name: first_level.source.tag.clone(),
            content_wrapper_name: content_wrapper_name.into(),
            html_container_tags: (first_level.target.tag.clone(), item_tag.into()),
            max_depth: DEFAULT_MAX_DEPTH,
            first_level,
        }
    }

    /// Set the maximum depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// HTML list tag.
    #[must_use]
    pub fn list_tag(&self) -> &str {
        &self.html_container_tags.0
    }

    /// HTML item tag.
    #[must_use]
    pub fn item_tag(&self) -> &str {
        &self.html_container_tags.1
    }

    /// Check whether `element`, read in `direction`, opens a level of this construct.
    #[must_use]
    pub fn starts_at(&self, direction: Direction, element: &Element) -> bool {
        self.first_level
            .input_selector(direction)
            .matches_element(element)
    }

    /// 1-based depth of a node with the given ancestor tag path.
    ///
    /// AKN levels are counted by root elements. HTML levels are counted by
    /// items directly inside a list tag, so an `li` of some other list kind
    /// (`ul > li > ol`) does not add a level.
    #[must_use]
    pub fn depth_of<S: AsRef<str>>(&self, direction: Direction, ancestors: &[S]) -> usize {
        let levels = match direction {
            Direction::To => ancestors
                .iter()
                .filter(|tag| tag.as_ref() == self.root_element_name)
                .count(),
            Direction::From => ancestors
                .windows(2)
                .filter(|pair| {
                    pair[0].as_ref() == self.list_tag() && pair[1].as_ref() == self.item_tag()
                })
                .count(),
        };
        levels + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Selector;
    use crate::types::DocumentNode;

    fn profile() -> HierarchyProfile {
        let first = ElementRule::new(
            Selector::tag("list"),
            Selector::parse("ol[data-akn-name=list]").unwrap(),
        );
        HierarchyProfile::new(first, "point", "li")
    }

    #[test]
    fn test_profile_new() {
        let profile = profile();
        assert_eq!(profile.root_element_name, "list");
        assert_eq!(profile.list_tag(), "ol");
        assert_eq!(profile.item_tag(), "li");
        assert_eq!(profile.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_depth_of() {
        let profile = profile();
        assert_eq!(profile.depth_of::<&str>(Direction::To, &[]), 1);
        assert_eq!(
            profile.depth_of(Direction::To, &["paragraph", "list", "point", "list", "point"]),
            3
        );
        assert_eq!(profile.depth_of(Direction::From, &["div", "ol", "li"]), 2);
    }

    #[test]
    fn test_depth_of_ignores_other_list_items() {
        let profile = profile().with_max_depth(1);
        let depth = profile.depth_of(Direction::From, &["div", "ul", "li"]);
        assert_eq!(depth, 1);
        assert!(depth <= profile.max_depth);
        assert_eq!(profile.depth_of(Direction::From, &["ul", "li", "ol", "li"]), 2);
    }

    #[test]
    fn test_starts_at() {
        let profile = profile();
        let ol = DocumentNode::element("ol").with_attribute("data-akn-name", "list");
        let plain_ol = DocumentNode::element("ol");
        assert!(profile.starts_at(Direction::From, ol.as_element().unwrap()));
        assert!(!profile.starts_at(Direction::From, plain_ol.as_element().unwrap()));
        assert!(!profile.starts_at(Direction::To, ol.as_element().unwrap()));
    }
}
