use tracing::{debug, trace};

use crate::expr::{ExprId, Graph};
use crate::pattern::{MatchResult, Pattern};

/// A pattern plus the builder producing its replacement.
///
/// Rules are generic over a context `C` handed to the builder at rewrite
/// time (an evaluator, a type table, counters); stateless rules use `()`.
pub trait RewriteRule<C = ()> {
    fn name(&self) -> &str;

    fn pattern(&self) -> &Pattern;

    /// Higher runs first under [`SelectionPolicy::Priority`].
    fn priority(&self) -> i32 {
        0
    }

    /// Build the replacement for a match. `None` declines the rewrite.
    fn build(&self, matched: &MatchResult, graph: &mut Graph, ctx: &mut C) -> Option<ExprId>;

    /// Match `candidate` and build its replacement.
    ///
    /// A builder that hands back the candidate itself did not rewrite anything.
    fn try_rewrite(&self, graph: &mut Graph, candidate: ExprId, ctx: &mut C) -> Option<ExprId> {
        let matched = self.pattern().match_expr(graph, candidate)?;
        let replacement = self.build(&matched, graph, ctx)?;
        (replacement != candidate).then_some(replacement)
    }
}

type Builder<C> = Box<dyn Fn(&MatchResult, &mut Graph, &mut C) -> Option<ExprId> + Send + Sync>;

/// Rule assembled from a pattern and a closure.
pub struct PatternRule<C = ()> {
    name: String,
    pattern: Pattern,
    priority: i32,
    builder: Builder<C>,
}

impl<C> PatternRule<C> {
    pub fn new<F>(name: impl Into<String>, pattern: Pattern, builder: F) -> Self
    where
        F: Fn(&MatchResult, &mut Graph, &mut C) -> Option<ExprId> + Send + Sync + 'static,
    {
        Self { name: name.into(), pattern, priority: 0, builder: Box::new(builder) }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl<C> RewriteRule<C> for PatternRule<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn build(&self, matched: &MatchResult, graph: &mut Graph, ctx: &mut C) -> Option<ExprId> {
        (self.builder)(matched, graph, ctx)
    }
}

/// Which rule wins when several match the same node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Rules are tried in the order they were added.
    #[default]
    FirstMatch,
    /// Highest [`RewriteRule::priority`] first, ties in insertion order.
    Priority,
}

/// Ordered collection of rules sharing a context type.
pub struct RuleSet<C = ()> {
    rules: Vec<Box<dyn RewriteRule<C>>>,
    policy: SelectionPolicy,
    /// Indices into `rules` in trial order.
    order: Vec<usize>,
}

impl<C> Default for RuleSet<C> {
    fn default() -> Self {
        Self::new(SelectionPolicy::default())
    }
}

impl<C> RuleSet<C> {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { rules: Vec::new(), policy, order: Vec::new() }
    }

    pub fn with_rule(mut self, rule: impl RewriteRule<C> + 'static) -> Self {
        self.push(rule);
        self
    }

    pub fn push(&mut self, rule: impl RewriteRule<C> + 'static) {
        self.rules.push(Box::new(rule));
        self.order = (0..self.rules.len()).collect();
        if self.policy == SelectionPolicy::Priority {
            // Stable sort keeps insertion order among equal priorities.
            self.order.sort_by_key(|&i| std::cmp::Reverse(self.rules[i].priority()));
        }
    }

    /// Add a closure-built rule.
    pub fn add<F>(&mut self, name: impl Into<String>, pattern: Pattern, builder: F)
    where
        F: Fn(&MatchResult, &mut Graph, &mut C) -> Option<ExprId> + Send + Sync + 'static,
        C: 'static,
    {
        self.push(PatternRule::new(name, pattern, builder));
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in the order they are tried.
    pub fn iter(&self) -> impl Iterator<Item = &dyn RewriteRule<C>> {
        self.order.iter().map(|&i| self.rules[i].as_ref())
    }

    /// Rewrite `candidate` with the first rule that applies.
    pub fn apply(&self, graph: &mut Graph, candidate: ExprId, ctx: &mut C) -> Option<ExprId> {
        for rule in self.iter() {
            trace!(rule = rule.name(), expr = %candidate, "trying rule");
            if let Some(replacement) = rule.try_rewrite(graph, candidate, ctx) {
                debug!(rule = rule.name(), from = %candidate, to = %replacement, "rule fired");
                return Some(replacement);
            }
        }
        None
    }
}
