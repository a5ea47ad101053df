//! Entry point tying the registry, resolver and engine together.

use tracing::debug;

use crate::config::TransformOptions;
use crate::error::Result;
use crate::rules::{ResolvedRuleSet, RuleRegistry};
use crate::transform::{TransformEngine, TransformStats};
use crate::types::{Direction, DocumentNode};

/// Transforms documents for an editor session.
///
/// Keeps the resolved rules of the last active plugin list, so repeated
/// transformations with the same plugins resolve only once. Borrowing the
/// registry mutably drops the cached rules.
#[derive(Debug, Clone, Default)]
pub struct SchemaMapper {
    registry: RuleRegistry,
    options: TransformOptions,
    active: Vec<String>,
    cache: Option<(Vec<String>, ResolvedRuleSet)>,
}

impl SchemaMapper {
    /// Create a mapper over a registry.
    #[must_use]
    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Set the pass options.
    #[must_use]
    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the default active plugin list used by [`Self::transform`].
    #[must_use]
    pub fn with_active(mut self, active: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.active = active.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Mutable access to the registry; invalidates the resolved rules.
    pub fn registry_mut(&mut self) -> &mut RuleRegistry {
        self.cache = None;
        &mut self.registry
    }

    #[must_use]
    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Default active plugin list, in composition order.
    #[must_use]
    pub fn active(&self) -> &[String] {
        &self.active
    }

    /// Resolved rules for `active`, reusing the previous resolution when the
    /// list is unchanged.
    pub fn resolved<S: AsRef<str>>(&mut self, active: &[S]) -> &ResolvedRuleSet {
        let key: Vec<String> = active.iter().map(|id| id.as_ref().to_string()).collect();
        let hit = matches!(&self.cache, Some((cached, _)) if *cached == key);
        if !hit {
            debug!(plugins = ?key, "Resolving active plugins");
            let resolved = self.registry.resolve(active);
            self.cache = Some((key, resolved));
        }
        let (_, resolved) = self.cache.get_or_insert_with(Default::default);
        resolved
    }

    /// Transform a document with the given active plugins.
    ///
    /// # Errors
    /// Returns any error raised by [`TransformEngine::transform`].
    pub fn transform_document<S: AsRef<str>>(
        &mut self,
        active: &[S],
        direction: Direction,
        source: &DocumentNode,
    ) -> Result<DocumentNode> {
        self.transform_with_stats(active, direction, source)
            .map(|(root, _)| root)
    }

    /// Like [`Self::transform_document`], also returning pass statistics.
    ///
    /// # Errors
    /// Returns any error raised by [`TransformEngine::transform`].
    pub fn transform_with_stats<S: AsRef<str>>(
        &mut self,
        active: &[S],
        direction: Direction,
        source: &DocumentNode,
    ) -> Result<(DocumentNode, TransformStats)> {
        let options = self.options.clone();
        let rules = self.resolved(active);
        TransformEngine::new(rules)
            .with_options(options)
            .transform_with_stats(direction, source)
    }

    /// Transform a fragment with the given active plugins.
    ///
    /// # Errors
    /// Returns any error raised during the walk.
    pub fn transform_fragment<S: AsRef<str>>(
        &mut self,
        active: &[S],
        direction: Direction,
        source: &DocumentNode,
    ) -> Result<Vec<DocumentNode>> {
        let options = self.options.clone();
        let rules = self.resolved(active);
        TransformEngine::new(rules)
            .with_options(options)
            .transform_fragment(direction, source)
    }

    /// Transform a document with the default active plugins.
    ///
    /// # Errors
    /// Returns any error raised by [`TransformEngine::transform`].
    pub fn transform(&mut self, direction: Direction, source: &DocumentNode) -> Result<DocumentNode> {
        let active = self.active.clone();
        self.transform_document(&active, direction, source)
    }
}
