//! State carried through a transformation walk.

use std::fmt;

/// Counters collected during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Elements visited in the input tree.
    pub elements: usize,

    /// Elements mapped by a rule, hierarchy levels included.
    pub matched: usize,

    /// Elements handled by the unmatched-element policy.
    pub unmatched: usize,

    /// Deepest hierarchy level reached.
    pub max_hierarchy_depth: usize,
}

impl fmt::Display for TransformStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} elements, {} matched, {} unmatched",
            self.elements, self.matched, self.unmatched
        )
    }
}

/// Context passed through a transformation walk.
///
/// Tracks the tag path of the input tree above the node being visited;
/// nesting qualifiers and hierarchy depths are computed from it.
#[derive(Debug, Clone, Default)]
pub struct TransformContext {
    ancestors: Vec<String>,

    pub stats: TransformStats,
}

impl TransformContext {
    /// Create a new context at the document root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an element.
    pub fn push(&mut self, tag: &str) {
        self.ancestors.push(tag.to_string());
    }

    /// Leave the innermost element.
    pub fn pop(&mut self) {
        self.ancestors.pop();
    }

    /// Ancestor tags, outermost first.
    #[must_use]
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    /// Number of ancestors.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Ancestor path for diagnostics (`akomaNtoso/body/list`).
    #[must_use]
    pub fn path(&self) -> String {
        self.ancestors.join("/")
    }
}
