//! A single implication: "labels matching this expression also get these atoms".

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use implied_core::LabelSet;

use crate::expression::{ExpressionParser, LabelExpression, LabelExpressionParser};

/// One expression ⇒ atoms implication.
///
/// Immutable once built. A rule whose expression failed to parse is kept but
/// never matches anything.
#[derive(Clone)]
pub struct Rule {
    expression: Option<Arc<dyn LabelExpression>>,
    grants: LabelSet,
}

impl Rule {
    /// Build a rule from raw expression text and a whitespace-separated atom list.
    pub fn new(expression: &str, atoms: &str) -> Self {
        Self::with_parser(&LabelExpressionParser, expression, atoms)
    }

    /// Like [`Rule::new`], with a caller-supplied expression parser.
    pub fn with_parser(parser: &dyn ExpressionParser, expression: &str, atoms: &str) -> Self {
        let expression = match parser.parse(expression) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(expression = %expression, error = %e, "rule expression rejected, rule will never match");
                None
            }
        };
        Self {
            expression,
            grants: LabelSet::parse(atoms),
        }
    }

    pub fn from_parts(expression: Option<Arc<dyn LabelExpression>>, grants: LabelSet) -> Self {
        Self { expression, grants }
    }

    pub fn expression(&self) -> Option<&Arc<dyn LabelExpression>> {
        self.expression.as_ref()
    }

    /// Canonical expression text, empty for an inert rule.
    pub fn expression_text(&self) -> String {
        self.expression
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default()
    }

    pub fn grants(&self) -> &LabelSet {
        &self.grants
    }

    /// Granted atoms joined by a single space.
    pub fn atoms_text(&self) -> String {
        self.grants.to_string()
    }

    /// Atoms the expression mentions; empty for an inert rule.
    pub fn referenced_atoms(&self) -> LabelSet {
        self.expression
            .as_ref()
            .map(|e| e.atoms())
            .unwrap_or_default()
    }

    /// Whether the rule fires for `labels`.
    pub fn matches(&self, labels: &LabelSet) -> bool {
        self.expression
            .as_ref()
            .map(|e| e.matches(labels))
            .unwrap_or(false)
    }

    /// The granted atoms if the rule fires for `labels`, otherwise nothing.
    pub fn infer(&self, labels: &LabelSet) -> LabelSet {
        if self.matches(labels) {
            self.grants.clone()
        } else {
            LabelSet::new()
        }
    }

    pub fn to_spec(&self) -> RuleSpec {
        RuleSpec {
            expression: self.expression_text(),
            atoms: self.atoms_text(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expression {
            Some(expression) => write!(f, "{} => {}", expression, self.grants),
            None => write!(f, "false => {}", self.grants),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule({})", self)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.grants == other.grants && self.expression_text() == other.expression_text()
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.grants.hash(state);
        self.expression_text().hash(state);
    }
}

// ── RuleSpec ────────────────────────────────────────────────────────

/// Raw `(expression, atoms)` text pair, as submitted and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub atoms: String,
}

impl RuleSpec {
    pub fn new(expression: impl Into<String>, atoms: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            atoms: atoms.into(),
        }
    }

    pub fn build(&self) -> Rule {
        Rule::new(&self.expression, &self.atoms)
    }
}

/// Parses the `"<expression> => <atoms>"` form used on the command line.
impl FromStr for RuleSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (expression, atoms) = s
            .split_once("=>")
            .ok_or_else(|| format!("expected '<expression> => <atoms>', got '{}'", s))?;
        Ok(RuleSpec::new(expression.trim(), atoms.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_rule() {
        let rule = Rule::new("a||b", "c d");

        assert_eq!(rule.atoms_text(), "c d");
        assert_eq!(rule.expression_text(), "a||b");
        assert_eq!(rule.to_string(), "a||b => c d");
        assert!(rule.matches(&LabelSet::parse("a")));
        assert_eq!(rule.infer(&LabelSet::parse("b")), LabelSet::parse("c d"));
        assert!(rule.infer(&LabelSet::parse("x")).is_empty());
    }

    #[test]
    fn invalid_rule_is_inert() {
        let rule = Rule::new("||", "c d");

        assert_eq!(rule.atoms_text(), "c d");
        assert_eq!(rule.expression_text(), "");
        assert_eq!(rule.to_string(), "false => c d");
        assert!(rule.expression().is_none());
        assert!(rule.referenced_atoms().is_empty());
        assert!(!rule.matches(&LabelSet::new()));
        assert!(rule.infer(&LabelSet::new()).is_empty());
        assert!(rule.infer(&LabelSet::parse("c d ||")).is_empty());
    }

    #[test]
    fn empty_expression_is_inert() {
        let rule = Rule::new("", "x");
        assert!(rule.expression().is_none());
        assert!(!rule.matches(&LabelSet::parse("x")));
    }

    #[test]
    fn negation_matches_the_empty_set() {
        let rule = Rule::new("!windows", "unix");
        assert!(rule.matches(&LabelSet::new()));
        assert!(!rule.matches(&LabelSet::parse("windows")));
    }

    #[test]
    fn equality_uses_canonical_expression_and_grant_set() {
        assert_eq!(Rule::new("a || b", "d c"), Rule::new("a||b", "c  d"));
        assert_ne!(Rule::new("a||b", "c"), Rule::new("b||a", "c"));
        assert_ne!(Rule::new("a||b", "c"), Rule::new("a||b", "c d"));
        assert_eq!(Rule::new("||", "c"), Rule::new("&&", "c"));
    }

    #[test]
    fn spec_round_trip_through_command_line_form() {
        let spec: RuleSpec = "rhel64 || rhel65 => rhel6".parse().unwrap();
        assert_eq!(spec, RuleSpec::new("rhel64 || rhel65", "rhel6"));
        assert_eq!(spec.build().to_spec(), RuleSpec::new("rhel64||rhel65", "rhel6"));
        assert!("no arrow here".parse::<RuleSpec>().is_err());
    }
}
