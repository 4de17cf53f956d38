//! Dependency ordering of rules.
//!
//! Rule `R` depends on rule `S` when `R`'s expression mentions an atom that
//! `S` grants. Sorting places every rule after all rules it depends on, so a
//! single in-order pass sees each producer before its consumers.

use implied_core::LabelSet;
use tracing::debug;

use crate::error::CycleDetected;
use crate::rule::Rule;

/// DFS visit state of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Rules plus their dependency edges, indexed by position.
#[derive(Debug)]
pub struct RuleGraph {
    rules: Vec<Rule>,
    /// `edges[r]` holds every `s` that rule `r` depends on.
    edges: Vec<Vec<usize>>,
}

impl RuleGraph {
    pub fn new(rules: Vec<Rule>) -> Self {
        let references: Vec<LabelSet> = rules.iter().map(Rule::referenced_atoms).collect();

        let edges: Vec<Vec<usize>> = references
            .iter()
            .enumerate()
            .map(|(r, referenced)| {
                rules
                    .iter()
                    .enumerate()
                    .filter(|(s, producer)| *s != r && !referenced.is_disjoint(producer.grants()))
                    .map(|(s, _)| s)
                    .collect::<Vec<_>>()
            })
            .collect();

        Self { rules, edges }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    /// Indices of the rules `rule` depends on.
    pub fn dependencies(&self, rule: usize) -> &[usize] {
        &self.edges[rule]
    }

    /// Consume the graph and return its rules producers-first.
    pub fn sort(self) -> Result<Vec<Rule>, CycleDetected> {
        let n = self.rules.len();
        let mut marks = vec![Mark::Unvisited; n];
        let mut path = Vec::new();
        let mut order = Vec::with_capacity(n);

        for start in 0..n {
            if let Err(cycle) = self.visit(start, &mut marks, &mut path, &mut order) {
                return Err(CycleDetected {
                    rules: cycle.into_iter().map(|i| self.rules[i].to_string()).collect(),
                });
            }
        }

        debug!(rules = n, edges = self.edge_count(), "sorted implications");

        let mut slots: Vec<Option<Rule>> = self.rules.into_iter().map(Some).collect();
        Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
    }

    /// Depth-first visit; on a back edge returns the cycle as rule indices,
    /// first and last entry being the same rule.
    fn visit(
        &self,
        node: usize,
        marks: &mut [Mark],
        path: &mut Vec<usize>,
        order: &mut Vec<usize>,
    ) -> Result<(), Vec<usize>> {
        match marks[node] {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                let start = path.iter().position(|&i| i == node).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(node);
                return Err(cycle);
            }
            Mark::Unvisited => {}
        }

        marks[node] = Mark::InProgress;
        path.push(node);
        for &dependency in &self.edges[node] {
            self.visit(dependency, marks, path, order)?;
        }
        path.pop();
        marks[node] = Mark::Done;
        order.push(node);
        Ok(())
    }
}

/// Order `candidates` so producers precede consumers, or report a cycle.
pub fn sort_rules(candidates: Vec<Rule>) -> Result<Vec<Rule>, CycleDetected> {
    RuleGraph::new(candidates).sort()
}
