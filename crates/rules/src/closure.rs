//! Single-pass closure over a sorted rule list.
//!
//! Callers must pass rules in the order produced by
//! [`sort_rules`](crate::sorter::sort_rules). Each rule then sees the output
//! of every rule it depends on, and one pass reaches the fixpoint.

use implied_core::LabelSet;

use crate::rule::Rule;

/// Every label implied by `initial`, including `initial` itself.
pub fn closure(initial: &LabelSet, rules: &[Rule]) -> LabelSet {
    let mut accumulated = initial.clone();
    for rule in rules {
        if rule.matches(&accumulated) {
            accumulated.extend_from(rule.grants());
        }
    }
    accumulated
}

/// Explicit labels the rules would have derived anyway.
///
/// Collects every atom granted during the pass and keeps those that were
/// already present in `initial`.
pub fn find_redundant(initial: &LabelSet, rules: &[Rule]) -> LabelSet {
    let mut accumulated = initial.clone();
    let mut inferred = LabelSet::new();
    for rule in rules {
        if rule.matches(&accumulated) {
            inferred.extend_from(rule.grants());
            accumulated.extend_from(rule.grants());
        }
    }
    inferred.intersection(initial)
}

/// Labels the rules add on top of `explicit`.
pub fn inferred_only(explicit: &LabelSet, rules: &[Rule]) -> LabelSet {
    closure(explicit, rules).difference(explicit)
}
