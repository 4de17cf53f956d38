use serde::{Deserialize, Serialize};

use crate::label::{Atom, LabelSet};

/// A labelled resource: a name plus the label string declared on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub label_string: String,
}

impl Node {
    pub fn new(name: impl Into<String>, label_string: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label_string: label_string.into(),
        }
    }

    /// The label every node carries for its own name.
    pub fn self_label(&self) -> Atom {
        Atom::new(&self.name)
    }

    /// Labels parsed from the declared label string.
    pub fn declared_labels(&self) -> LabelSet {
        LabelSet::parse(&self.label_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_labels_exclude_self_label() {
        let node = Node::new("agent-1", "rhel65 x86_64");
        assert_eq!(node.declared_labels(), LabelSet::parse("rhel65 x86_64"));
        assert_eq!(node.self_label(), Atom::new("agent-1"));
    }
}
