//! Active rule set plus memoized closures.
//!
//! The sorted rule list and the closure cache live behind one `RwLock`, so a
//! rule replacement and the cache clear it implies are observed together.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{debug, info, trace};

use implied_core::LabelSet;

use crate::closure;
use crate::error::CycleDetected;
use crate::rule::Rule;
use crate::sorter::sort_rules;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Incremented on every successful rule replacement.
    pub generation: u64,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

struct State {
    generation: u64,
    rules: Arc<Vec<Rule>>,
    cache: HashMap<LabelSet, LabelSet>,
}

/// Owns the sorted rule list and the closure cache.
///
/// Evaluations of different label sets run in parallel: the lock is only
/// held for the cache lookup and the insert, never while computing. Two
/// concurrent misses on the same label set may both compute; the results are
/// identical and the second insert overwrites the first. Sequential repeats
/// always hit the cache.
pub struct Resolver {
    state: RwLock<State>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Resolver {
    /// A resolver with no rules.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                generation: 0,
                rules: Arc::new(Vec::new()),
                cache: HashMap::new(),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_rules(candidates: Vec<Rule>) -> Result<Self, CycleDetected> {
        let resolver = Self::new();
        resolver.replace_rules(candidates)?;
        Ok(resolver)
    }

    /// Sort `candidates` and install them, clearing the cache.
    ///
    /// On a cycle nothing changes: the previous rules and cache stay active.
    pub fn replace_rules(&self, candidates: Vec<Rule>) -> Result<(), CycleDetected> {
        let sorted = sort_rules(candidates)?;
        let count = sorted.len();

        let mut state = self.state.write().expect("resolver lock poisoned");
        state.rules = Arc::new(sorted);
        state.generation += 1;
        debug!(entries = state.cache.len(), "clearing cache when implications changed");
        state.cache.clear();

        info!(rules = count, generation = state.generation, "installed implications");
        Ok(())
    }

    /// The active rules, producers first.
    pub fn rules(&self) -> Arc<Vec<Rule>> {
        Arc::clone(&self.state.read().expect("resolver lock poisoned").rules)
    }

    /// Closure of `initial` under the active rules, memoized per label set.
    pub fn evaluate(&self, initial: &LabelSet) -> LabelSet {
        let (generation, rules) = {
            let state = self.state.read().expect("resolver lock poisoned");
            if let Some(labels) = state.cache.get(initial) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(initial = %initial, "closure cache hit");
                return labels.clone();
            }
            (state.generation, Arc::clone(&state.rules))
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        let labels = closure::closure(initial, &rules);

        let mut state = self.state.write().expect("resolver lock poisoned");
        if state.generation == generation {
            debug!(initial = %initial, labels = %labels, "caching closure");
            state.cache.insert(initial.clone(), labels.clone());
        } else {
            debug!(initial = %initial, "implications replaced during evaluation, not caching");
        }
        labels
    }

    /// Labels in `initial` the active rules also derive. Not cached.
    pub fn find_redundant(&self, initial: &LabelSet) -> LabelSet {
        closure::find_redundant(initial, &self.rules())
    }

    /// Labels the active rules would add to `explicit`. Not cached.
    pub fn preview(&self, explicit: &LabelSet) -> LabelSet {
        closure::inferred_only(explicit, &self.rules())
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.read().expect("resolver lock poisoned");
        CacheStats {
            generation: state.generation,
            entries: state.cache.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::sync::atomic::AtomicBool;
    use std::sync::Barrier;

    use super::*;
    use crate::expression::LabelExpression;

    fn distro_rules() -> Vec<Rule> {
        vec![
            Rule::new("rhel64 || rhel65", "rhel6"),
            Rule::new("rhel4 || rhel5 || rhel6", "rhel"),
            Rule::new("fedora17 || fedora18", "fedora"),
            Rule::new("rhel || fedora", "linux"),
        ]
    }

    #[test]
    fn repeated_evaluation_hits_cache() {
        let resolver = Resolver::with_rules(distro_rules()).unwrap();
        let initial = LabelSet::parse("fedora17 f1");

        for _ in 0..3 {
            assert_eq!(
                resolver.evaluate(&initial),
                LabelSet::parse("fedora17 fedora linux f1")
            );
        }

        let stats = resolver.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn replacing_rules_clears_cache_and_bumps_generation() {
        let resolver = Resolver::with_rules(distro_rules()).unwrap();
        resolver.evaluate(&LabelSet::parse("rhel65"));
        assert_eq!(resolver.stats().entries, 1);
        let generation = resolver.stats().generation;

        resolver.replace_rules(distro_rules()).unwrap();
        let stats = resolver.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.generation, generation + 1);
    }

    #[test]
    fn cycle_leaves_previous_rules_and_cache() {
        let resolver = Resolver::with_rules(distro_rules()).unwrap();
        resolver.evaluate(&LabelSet::parse("rhel65"));
        let before = resolver.stats();

        let err = resolver
            .replace_rules(vec![Rule::new("a", "b"), Rule::new("b", "a")])
            .unwrap_err();
        assert_eq!(err.rules.len(), 3);

        assert_eq!(resolver.stats(), before);
        assert_eq!(resolver.rules().len(), 4);
    }

    #[test]
    fn new_rules_take_effect_after_replacement() {
        let resolver = Resolver::with_rules(vec![Rule::new("a", "b")]).unwrap();
        assert_eq!(resolver.evaluate(&LabelSet::parse("a")), LabelSet::parse("a b"));

        resolver.replace_rules(vec![Rule::new("a", "c")]).unwrap();
        assert_eq!(resolver.evaluate(&LabelSet::parse("a")), LabelSet::parse("a c"));
    }

    #[test]
    fn redundant_and_preview_are_not_cached() {
        let resolver = Resolver::with_rules(distro_rules()).unwrap();
        assert_eq!(
            resolver.find_redundant(&LabelSet::parse("rhel65 linux")),
            LabelSet::parse("linux")
        );
        assert_eq!(
            resolver.preview(&LabelSet::parse("rhel65")),
            LabelSet::parse("rhel6 rhel linux")
        );
        assert_eq!(resolver.stats().entries, 0);
    }

    /// Blocks inside the first `matches` call until released.
    #[derive(Debug)]
    struct GateExpression {
        armed: AtomicBool,
        entered: Arc<Barrier>,
        release: Arc<Barrier>,
    }

    impl fmt::Display for GateExpression {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("gate")
        }
    }

    impl LabelExpression for GateExpression {
        fn matches(&self, _labels: &LabelSet) -> bool {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.entered.wait();
                self.release.wait();
            }
            true
        }

        fn atoms(&self) -> LabelSet {
            LabelSet::new()
        }
    }

    #[test]
    fn closure_computed_under_replaced_rules_is_not_cached() {
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let gate = GateExpression {
            armed: AtomicBool::new(true),
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        };
        let resolver = Resolver::with_rules(vec![Rule::from_parts(
            Some(Arc::new(gate)),
            LabelSet::parse("old"),
        )])
        .unwrap();

        std::thread::scope(|scope| {
            let evaluation = scope.spawn(|| resolver.evaluate(&LabelSet::parse("x")));

            entered.wait();
            resolver.replace_rules(vec![Rule::new("x", "new")]).unwrap();
            release.wait();

            // The in-flight evaluation still reports what the old rules implied.
            assert_eq!(evaluation.join().unwrap(), LabelSet::parse("x old"));
        });

        assert_eq!(resolver.stats().entries, 0);
        assert_eq!(resolver.evaluate(&LabelSet::parse("x")), LabelSet::parse("x new"));
    }
}
