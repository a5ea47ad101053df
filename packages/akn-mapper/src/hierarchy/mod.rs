//! Self-nesting numbering constructs (lists, points, indents).
//!
//! A [`HierarchyProfile`] describes one construct; the
//! [`HierarchicalExpander`] turns it into concrete per-depth rules.

mod expand;
mod types;

pub use expand::HierarchicalExpander;
pub use types::HierarchyProfile;
