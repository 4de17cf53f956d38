//! Entry points used by the outside world: rule submission, per-node
//! evaluation, the redundancy diagnostic and expression validation.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{info, warn};

use implied_core::{LabelSet, Node};

use crate::error::Result;
use crate::expression::{ExpressionError, Expr};
use crate::resolver::{CacheStats, Resolver};
use crate::rule::{Rule, RuleSpec};
use crate::source::{LabelSource, LabelSources, SourceKind};
use crate::store::ImplicationStore;

/// Outcome of validating a single expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum ExpressionCheck {
    Ok,
    Error(String),
}

/// Validate expression text for interactive feedback.
///
/// Empty text is accepted: an empty expression is simply a rule that never
/// fires.
pub fn check_expression(text: &str) -> ExpressionCheck {
    match Expr::parse(text) {
        Ok(_) | Err(ExpressionError::Empty) => ExpressionCheck::Ok,
        Err(e) => ExpressionCheck::Error(format!("Invalid label expression: {}", e)),
    }
}

/// The implication engine wired to its store and label sources.
pub struct ImpliedLabels {
    resolver: Arc<Resolver>,
    store: ImplicationStore,
    sources: LabelSources,
    /// Serializes submissions so the file always matches the active rules.
    submit_lock: Mutex<()>,
}

impl ImpliedLabels {
    /// Load the persisted implications and install them.
    ///
    /// The stored list is re-sorted on load; a stored cycle is an error.
    pub fn open(store: ImplicationStore, sources: LabelSources) -> Result<Self> {
        let rules: Vec<Rule> = store.load()?.iter().map(RuleSpec::build).collect();
        let resolver = Arc::new(Resolver::new());
        resolver.replace_rules(rules)?;
        info!(path = %store.path().display(), rules = resolver.rules().len(), "loaded implications");

        Ok(Self {
            resolver,
            store,
            sources,
            submit_lock: Mutex::new(()),
        })
    }

    /// Replace the rule set and persist it.
    ///
    /// On a cycle nothing is changed or written.
    pub fn submit(&self, specs: &[RuleSpec]) -> Result<()> {
        let rules: Vec<Rule> = specs.iter().map(RuleSpec::build).collect();
        for (spec, rule) in specs.iter().zip(&rules) {
            if rule.expression().is_none() {
                warn!(expression = %spec.expression, atoms = %spec.atoms, "accepting implication that can never match");
            }
        }

        let _guard = self.submit_lock.lock().expect("submit lock poisoned");
        if let Err(e) = self.resolver.replace_rules(rules) {
            warn!(error = %e, "rejected implications");
            return Err(e.into());
        }
        self.store.save(&self.resolver.rules())
    }

    /// Active implications, producers first.
    pub fn implications(&self) -> Arc<Vec<Rule>> {
        self.resolver.rules()
    }

    /// A node's full label set: initial labels plus everything implied.
    pub fn evaluate(&self, node: &Node) -> LabelSet {
        self.resolver.evaluate(&self.sources.initial_labels(node))
    }

    /// Labels declared on or contributed to `node` that the rules derive anyway.
    pub fn redundant_labels(&self, node: &Node) -> LabelSet {
        self.resolver
            .find_redundant(&self.sources.initial_labels(node))
    }

    /// Labels the rules would add to an explicit label string.
    pub fn preview(&self, label_string: &str) -> LabelSet {
        self.resolver.preview(&LabelSet::parse(label_string))
    }

    pub fn check_expression(&self, text: &str) -> ExpressionCheck {
        check_expression(text)
    }

    pub fn stats(&self) -> CacheStats {
        self.resolver.stats()
    }

    pub fn resolver(&self) -> Arc<Resolver> {
        Arc::clone(&self.resolver)
    }

    /// Reload the store whenever its file changes on disk.
    pub fn watch(&mut self) -> Result<()> {
        let resolver = Arc::clone(&self.resolver);
        self.store.watch(resolver)
    }

    /// This engine as a label source, for registries shared with other
    /// discoverers.
    pub fn label_source(&self) -> ImpliedLabelSource {
        ImpliedLabelSource {
            resolver: Arc::clone(&self.resolver),
        }
    }
}

/// [`LabelSource`] view of the engine.
///
/// Carries [`SourceKind::Implied`], so registries never consult it while
/// computing initial labels. It evaluates the node's declared labels and
/// self label only.
pub struct ImpliedLabelSource {
    resolver: Arc<Resolver>,
}

impl LabelSource for ImpliedLabelSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Implied
    }

    fn name(&self) -> &str {
        "implied-labels"
    }

    fn find_labels(&self, node: &Node) -> LabelSet {
        let mut initial = node.declared_labels();
        initial.insert(node.self_label());
        self.resolver.evaluate(&initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_valid_expressions_pass() {
        assert_eq!(check_expression(""), ExpressionCheck::Ok);
        assert_eq!(check_expression("built-in"), ExpressionCheck::Ok);
        assert_eq!(check_expression("!built-in"), ExpressionCheck::Ok);
    }

    #[test]
    fn malformed_expression_reports_error() {
        match check_expression("!||&&") {
            ExpressionCheck::Error(message) => {
                assert!(message.contains("Invalid label expression"), "{message}")
            }
            ExpressionCheck::Ok => panic!("expected an error"),
        }
    }

    #[test]
    fn check_serializes_with_status_tag() {
        let json = serde_json::to_value(check_expression("a &&")).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["message"].as_str().unwrap().starts_with("Invalid label expression"));
    }
}
