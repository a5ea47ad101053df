//! Declarative mapping rules.
//!
//! Plugins declare rules in a JSON/YAML shorthand ([`RawElementRule`]).
//! The [`RuleRegistry`] normalizes and stores them per plugin, and the
//! [`RuleResolver`] composes the active plugins, in order, into a
//! [`ResolvedRuleSet`] the transformation engine reads from.

mod attribute;
pub mod builtin;
mod normalize;
mod raw;
mod registry;
mod resolve;
mod selector;
mod types;

pub use attribute::{AttributePattern, AttributeRule, Side};
pub use builtin::{create_leos_registry, LEOS_PLUGINS};
pub use normalize::{normalize, RuleNormalizer};
pub use raw::{
    RawAttributeRule, RawDirection, RawDirectionName, RawElementRule, RawHierarchyProfile,
    RawPluginRules,
};
pub use registry::RuleRegistry;
pub use resolve::{ResolvedRule, ResolvedRuleSet, RuleOverride, RuleResolver};
pub use selector::{AttributePredicate, Nesting, Selector, ValueMatcher, WILDCARD};
pub use types::{ElementRule, NormalizedRuleSet, RuleDirection};
