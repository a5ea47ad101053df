//! Transformation engine that walks a document tree using resolved rules.

use tracing::{debug, trace};

use super::context::{TransformContext, TransformStats};
use crate::config::{TransformOptions, UnmatchedElementPolicy, MAX_TREE_DEPTH};
use crate::error::{MapperError, Result};
use crate::hierarchy::HierarchicalExpander;
use crate::rules::{AttributeRule, ElementRule, ResolvedRuleSet};
use crate::types::{Direction, DocumentNode, Element};

/// Engine that rewrites a document tree from one side of the mapping to the other.
///
/// The engine walks the tree depth-first. For each element it looks for a
/// hierarchy construct first, then the sub-rules of the enclosing rule, then
/// the top-level rules; elements nothing matches follow the configured
/// [`UnmatchedElementPolicy`].
pub struct TransformEngine<'r> {
    rules: &'r ResolvedRuleSet,
    options: TransformOptions,
}

impl<'r> TransformEngine<'r> {
    /// Create an engine over a resolved rule set with default options.
    #[must_use]
    pub fn new(rules: &'r ResolvedRuleSet) -> Self {
        Self {
            rules,
            options: TransformOptions::default(),
        }
    }

    /// Set the pass options.
    #[must_use]
    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    #[must_use]
    pub fn rules(&self) -> &ResolvedRuleSet {
        self.rules
    }

    /// Transform a document whose root maps to exactly one node.
    ///
    /// # Errors
    /// Returns `RootNotSingle` when the root is unwrapped into zero or several
    /// nodes, and any error raised during the walk (`DepthExceeded`,
    /// `UnmatchedElement`, `TreeTooDeep`).
    pub fn transform(&self, direction: Direction, source: &DocumentNode) -> Result<DocumentNode> {
        self.transform_with_stats(direction, source)
            .map(|(root, _)| root)
    }

    /// Like [`Self::transform`], also returning pass statistics.
    ///
    /// # Errors
    /// See [`Self::transform`].
    pub fn transform_with_stats(
        &self,
        direction: Direction,
        source: &DocumentNode,
    ) -> Result<(DocumentNode, TransformStats)> {
        let (nodes, stats) = self.run(direction, source)?;
        match <[DocumentNode; 1]>::try_from(nodes) {
            Ok([root]) => Ok((root, stats)),
            Err(nodes) => Err(MapperError::RootNotSingle { count: nodes.len() }),
        }
    }

    /// Transform a node into however many nodes it maps to.
    ///
    /// # Errors
    /// Returns any error raised during the walk.
    pub fn transform_fragment(
        &self,
        direction: Direction,
        source: &DocumentNode,
    ) -> Result<Vec<DocumentNode>> {
        self.run(direction, source).map(|(nodes, _)| nodes)
    }

    fn run(
        &self,
        direction: Direction,
        source: &DocumentNode,
    ) -> Result<(Vec<DocumentNode>, TransformStats)> {
        let pass = Pass::new(self.rules, &self.options, direction);
        let mut ctx = TransformContext::new();
        let nodes = pass.node(source, &[], &mut ctx)?;
        debug!(direction = %direction, stats = %ctx.stats, "Transformation complete");
        Ok((nodes, ctx.stats))
    }
}

/// One walk in one direction, with every hierarchy profile expanded up front.
struct Pass<'r> {
    rules: &'r ResolvedRuleSet,
    options: &'r TransformOptions,
    direction: Direction,
    /// Depth rules per profile, parallel to `rules.hierarchies()`.
    levels: Vec<Vec<ElementRule>>,
}

impl<'r> Pass<'r> {
    fn new(rules: &'r ResolvedRuleSet, options: &'r TransformOptions, direction: Direction) -> Self {
        let levels = rules
            .hierarchies()
            .iter()
            .map(|profile| HierarchicalExpander::expand(profile, direction))
            .collect();
        Self {
            rules,
            options,
            direction,
            levels,
        }
    }

    fn node<'s>(
        &'s self,
        node: &DocumentNode,
        scope: &'s [ElementRule],
        ctx: &mut TransformContext,
    ) -> Result<Vec<DocumentNode>> {
        match node {
            DocumentNode::Text(text) => Ok(vec![DocumentNode::Text(text.clone())]),
            DocumentNode::Element(element) => self.element(element, scope, ctx),
        }
    }

    fn element<'s>(
        &'s self,
        element: &Element,
        scope: &'s [ElementRule],
        ctx: &mut TransformContext,
    ) -> Result<Vec<DocumentNode>> {
        if ctx.depth() >= MAX_TREE_DEPTH {
            return Err(MapperError::TreeTooDeep {
                limit: MAX_TREE_DEPTH,
                path: ctx.path(),
            });
        }
        ctx.stats.elements += 1;

        let rule = match self.hierarchy_rule(element, ctx)? {
            Some(rule) => Some(rule),
            None => self.match_rule(element, scope, ctx),
        };

        match rule {
            Some(rule) => {
                trace!(
                    tag = %element.tag,
                    rule = %rule.input_selector(self.direction),
                    "Matched element"
                );
                ctx.stats.matched += 1;
                Ok(vec![self.apply(rule, element, ctx)?.into()])
            }
            None => self.unmatched(element, scope, ctx),
        }
    }

    /// Depth rule for an element opening a hierarchy level.
    fn hierarchy_rule<'s>(
        &'s self,
        element: &Element,
        ctx: &mut TransformContext,
    ) -> Result<Option<&'s ElementRule>> {
        let direction = self.direction;
        let profiles = self.rules.hierarchies();
        let Some(index) = profiles.iter().position(|p| p.starts_at(direction, element)) else {
            return Ok(None);
        };

        let profile = &profiles[index];
        let depth = profile.depth_of(direction, ctx.ancestors());
        if depth > profile.max_depth {
            return Err(MapperError::DepthExceeded {
                element: profile.first_level.input_selector(direction).to_string(),
                depth,
                max_depth: profile.max_depth,
                path: ctx.path(),
            });
        }
        ctx.stats.max_hierarchy_depth = ctx.stats.max_hierarchy_depth.max(depth);

        Ok(self.levels[index]
            .get(depth - 1)
            .filter(|rule| rule.input_selector(direction).matches(element, ctx.ancestors())))
    }

    /// Most specific matching sub-rule (first declared on ties), else the top-level table.
    fn match_rule<'s>(
        &'s self,
        element: &Element,
        scope: &'s [ElementRule],
        ctx: &TransformContext,
    ) -> Option<&'s ElementRule> {
        let direction = self.direction;
        let ancestors = ctx.ancestors();

        let mut best: Option<&'s ElementRule> = None;
        for rule in scope {
            let selector = rule.input_selector(direction);
            if !rule.applies(direction) || !selector.matches(element, ancestors) {
                continue;
            }
            if best.is_none_or(|b| selector.specificity() > b.input_selector(direction).specificity()) {
                best = Some(rule);
            }
        }

        best.or_else(|| self.rules.find(direction, element, ancestors))
    }

    fn apply<'s>(
        &'s self,
        rule: &'s ElementRule,
        element: &Element,
        ctx: &mut TransformContext,
    ) -> Result<Element> {
        let direction = self.direction;
        let mut output = rule.output_selector(direction).instantiate();
        for attribute in &rule.attributes {
            attribute.apply(direction, element, &mut output.attributes);
        }

        ctx.push(&element.tag);
        let children = match direction {
            Direction::To => self.children_to(rule, element, ctx),
            Direction::From => self.children_from(rule, element, ctx),
        };
        ctx.pop();

        output.children = children?;
        Ok(output)
    }

    /// Children of a rule-mapped AKN element: child-text sources are consumed
    /// and the flattened wrapper chain is hoisted away.
    fn children_to<'s>(
        &'s self,
        rule: &'s ElementRule,
        element: &Element,
        ctx: &mut TransformContext,
    ) -> Result<Vec<DocumentNode>> {
        let mut consumed: Vec<&str> = rule
            .attributes
            .iter()
            .filter_map(AttributeRule::child_text)
            .map(|(child, _)| child)
            .collect();

        let mut content = Vec::new();
        for child in self.content(element) {
            if let Some(position) = child
                .tag()
                .and_then(|tag| consumed.iter().position(|c| *c == tag))
            {
                consumed.remove(position);
                continue;
            }
            content.push(child);
        }
        self.hoist(&content, &rule.flatten, &rule.sub_rules, ctx)
    }

    /// Hoist the wrapper chain out of `nodes`.
    ///
    /// A wrapper that is alone among its siblings disappears. Repeated
    /// wrappers each become a marked block so saving can rebuild them.
    fn hoist<'s>(
        &'s self,
        nodes: &[&DocumentNode],
        chain: &[String],
        scope: &'s [ElementRule],
        ctx: &mut TransformContext,
    ) -> Result<Vec<DocumentNode>> {
        let mut out = Vec::new();
        let Some((head, rest)) = chain.split_first() else {
            for node in nodes {
                out.extend(self.node(node, scope, ctx)?);
            }
            return Ok(out);
        };

        let repeated = nodes
            .iter()
            .filter(|node| node.tag() == Some(head.as_str()))
            .count()
            > 1;
        for &node in nodes {
            let Some(wrapper) = node.as_element().filter(|e| e.tag == *head) else {
                out.extend(self.node(node, scope, ctx)?);
                continue;
            };

            ctx.push(&wrapper.tag);
            let inner: Vec<&DocumentNode> = self.content(wrapper).collect();
            let hoisted = self.hoist(&inner, rest, scope, ctx);
            ctx.pop();

            if repeated {
                let mut block = Element::new(WRAPPER_BLOCK_TAG);
                block
                    .attributes
                    .insert(WRAPPER_ATTRIBUTE.to_string(), chain.join("/"));
                block.children = hoisted?;
                out.push(block.into());
            } else {
                out.extend(hoisted?);
            }
        }
        Ok(out)
    }

    /// Children of a rule-mapped HTML element: child-text attributes become
    /// child elements again and loose content is wrapped in the flattened chain.
    fn children_from<'s>(
        &'s self,
        rule: &'s ElementRule,
        element: &Element,
        ctx: &mut TransformContext,
    ) -> Result<Vec<DocumentNode>> {
        let mut out: Vec<DocumentNode> = rule
            .attributes
            .iter()
            .filter_map(AttributeRule::child_text)
            .filter_map(|(child, attribute)| {
                element.attribute(attribute).map(|value| {
                    let node = DocumentNode::element(child);
                    if value.is_empty() {
                        node
                    } else {
                        node.with_child(DocumentNode::text(value))
                    }
                })
            })
            .collect();

        let content: Vec<&DocumentNode> = self.content(element).collect();
        out.extend(self.unflatten(&content, &rule.flatten, &rule.sub_rules, ctx)?);
        Ok(out)
    }

    /// Wrap loose content back into the chain. Marked blocks rebuild one
    /// wrapper each; children matched by a sub-rule or a hierarchy keep their place.
    fn unflatten<'s>(
        &'s self,
        nodes: &[&DocumentNode],
        chain: &[String],
        scope: &'s [ElementRule],
        ctx: &mut TransformContext,
    ) -> Result<Vec<DocumentNode>> {
        let mut out = Vec::new();
        let Some((head, rest)) = chain.split_first() else {
            for node in nodes {
                out.extend(self.node(node, scope, ctx)?);
            }
            return Ok(out);
        };

        let path = chain.join("/");
        let mut run: Vec<&DocumentNode> = Vec::new();
        for &node in nodes {
            if let Some(block) = node.as_element().filter(|e| is_wrapper_block(e, &path)) {
                self.wrap_run(&mut run, chain, scope, ctx, &mut out)?;
                ctx.push(&block.tag);
                let inner: Vec<&DocumentNode> = self.content(block).collect();
                let rebuilt = self.unflatten(&inner, rest, scope, ctx);
                ctx.pop();
                out.push(DocumentNode::element(head.as_str()).with_children(rebuilt?));
            } else if self.stands_alone(node, scope, ctx) {
                self.wrap_run(&mut run, chain, scope, ctx, &mut out)?;
                out.extend(self.node(node, scope, ctx)?);
            } else {
                run.push(node);
            }
        }
        self.wrap_run(&mut run, chain, scope, ctx, &mut out)?;
        Ok(out)
    }

    /// Wrap a run of loose content in the chain (`content/mp`).
    ///
    /// Runs of whitespace alone are passed through unwrapped.
    fn wrap_run<'s>(
        &'s self,
        run: &mut Vec<&DocumentNode>,
        chain: &[String],
        scope: &'s [ElementRule],
        ctx: &mut TransformContext,
        out: &mut Vec<DocumentNode>,
    ) -> Result<()> {
        let nodes = std::mem::take(run);
        match chain.split_first() {
            Some((head, rest)) if !nodes.iter().all(|node| node.is_blank_text()) => {
                let inner = self.unflatten(&nodes, rest, scope, ctx)?;
                out.push(DocumentNode::element(head.as_str()).with_children(inner));
            }
            _ => {
                for node in nodes {
                    out.extend(self.node(node, scope, ctx)?);
                }
            }
        }
        Ok(())
    }

    /// Children of `element` without layout whitespace, when that is dropped.
    fn content<'e>(&self, element: &'e Element) -> impl Iterator<Item = &'e DocumentNode> + 'e {
        let drop = self.options.drop_blank_text;
        element
            .children
            .iter()
            .filter(move |child| !(drop && element.is_layout_whitespace(child)))
    }

    /// Check whether a child keeps its own place instead of joining the flattened content.
    fn stands_alone(&self, node: &DocumentNode, scope: &[ElementRule], ctx: &TransformContext) -> bool {
        let Some(element) = node.as_element() else {
            return false;
        };
        let direction = self.direction;
        self.rules.hierarchy_for(direction, element).is_some()
            || scope.iter().any(|rule| {
                rule.applies(direction)
                    && rule.input_selector(direction).matches(element, ctx.ancestors())
            })
    }

    fn unmatched<'s>(
        &'s self,
        element: &Element,
        scope: &'s [ElementRule],
        ctx: &mut TransformContext,
    ) -> Result<Vec<DocumentNode>> {
        ctx.stats.unmatched += 1;
        let policy = self.options.unmatched;
        debug!(
            tag = %element.tag,
            path = %ctx.path(),
            direction = %self.direction,
            policy = policy.as_str(),
            "No rule matched element"
        );

        match policy {
            UnmatchedElementPolicy::Unwrap => self.children(element, scope, ctx),
            UnmatchedElementPolicy::Keep => {
                let mut kept = Element::new(&element.tag);
                kept.attributes.clone_from(&element.attributes);
                kept.children = self.children(element, scope, ctx)?;
                Ok(vec![kept.into()])
            }
            UnmatchedElementPolicy::Drop => Ok(Vec::new()),
            UnmatchedElementPolicy::Fail => {
                let path = ctx.path();
                Err(MapperError::UnmatchedElement {
                    selector: format!("<{}>", element.tag),
                    context: (!path.is_empty()).then_some(path),
                })
            }
        }
    }

    /// Transform an element's children in the given scope.
    fn children<'s>(
        &'s self,
        element: &Element,
        scope: &'s [ElementRule],
        ctx: &mut TransformContext,
    ) -> Result<Vec<DocumentNode>> {
        ctx.push(&element.tag);
        let mut out = Vec::new();
        for child in self.content(element) {
            out.extend(self.node(child, scope, ctx)?);
        }
        ctx.pop();
        Ok(out)
    }
}

/// Tag of the block standing for one of several repeated wrappers.
const WRAPPER_BLOCK_TAG: &str = "p";

/// Attribute holding the wrapper chain a block stands for (`content/mp`).
const WRAPPER_ATTRIBUTE: &str = "data-akn-wrapper";

fn is_wrapper_block(element: &Element, chain: &str) -> bool {
    element.tag == WRAPPER_BLOCK_TAG && element.attribute(WRAPPER_ATTRIBUTE) == Some(chain)
}
