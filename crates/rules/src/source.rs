//! Label discovery: where a node's initial labels come from.

use implied_core::{LabelSet, Node};

/// What kind of contributor a [`LabelSource`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Any discoverer other than the implication engine.
    Contributed,
    /// The implication engine itself. Never consulted for initial labels.
    Implied,
}

/// Something that can attach labels to a node.
pub trait LabelSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Short name for logs.
    fn name(&self) -> &str;

    fn find_labels(&self, node: &Node) -> LabelSet;
}

/// Ordered registry of label sources.
#[derive(Default)]
pub struct LabelSources {
    sources: Vec<Box<dyn LabelSource>>,
}

impl LabelSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Box<dyn LabelSource>) {
        tracing::debug!(source = source.name(), kind = ?source.kind(), "registered label source");
        self.sources.push(source);
    }

    pub fn with(mut self, source: impl LabelSource + 'static) -> Self {
        self.register(Box::new(source));
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Labels a node starts with before implications apply: its declared
    /// labels, its self label, and every contributed source's labels.
    pub fn initial_labels(&self, node: &Node) -> LabelSet {
        let mut labels = node.declared_labels();
        labels.insert(node.self_label());

        for source in &self.sources {
            if source.kind() == SourceKind::Implied {
                continue;
            }
            labels.extend_from(&source.find_labels(node));
        }
        labels
    }
}

/// A fixed set of labels for every node whose name matches, handy for
/// static inventories.
#[derive(Debug, Clone)]
pub struct StaticLabels {
    name: String,
    node_name: Option<String>,
    labels: LabelSet,
}

impl StaticLabels {
    /// Labels for every node.
    pub fn everywhere(name: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            name: name.into(),
            node_name: None,
            labels,
        }
    }

    /// Labels for the node called `node_name` only.
    pub fn for_node(name: impl Into<String>, node_name: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            name: name.into(),
            node_name: Some(node_name.into()),
            labels,
        }
    }
}

impl LabelSource for StaticLabels {
    fn kind(&self) -> SourceKind {
        SourceKind::Contributed
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn find_labels(&self, node: &Node) -> LabelSet {
        match &self.node_name {
            Some(only) if *only != node.name => LabelSet::new(),
            _ => self.labels.clone(),
        }
    }
}
