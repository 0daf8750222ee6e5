//! Rewrite rules and the fixpoint rewrite driver.
//!
//! A [`RewriteRule`] pairs a [`Pattern`](crate::pattern::Pattern) with a
//! replacement builder. [`rewrite`] applies a [`RuleSet`] to every node
//! reachable from a root, bottom-up, until no rule fires.

pub mod engine;
pub mod rule;

pub use engine::{Convergence, RewriteOptions, RewriteOutput, rewrite, rewrite_with_options};
pub use rule::{PatternRule, RewriteRule, RuleSet, SelectionPolicy};
