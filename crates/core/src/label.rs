use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single label name.
///
/// Atoms are compared, ordered and hashed by name. Cloning is cheap: the
/// name is shared behind an `Arc<str>`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom(Arc<str>);

impl Atom {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl From<&str> for Atom {
    fn from(name: &str) -> Self {
        Atom::new(name)
    }
}

impl From<String> for Atom {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Serialize for Atom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Atom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Atom::from)
    }
}

// ── LabelSet ──────────────────────────────────────────────────

/// Unordered, deduplicated collection of atoms.
///
/// Backed by a `BTreeSet` so equal sets hash identically regardless of
/// insertion order, which makes a `LabelSet` usable as a cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeSet<Atom>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whitespace-separated label string.
    ///
    /// A double-quoted token may contain whitespace; its quotes are removed.
    /// Empty tokens are dropped, so this never fails.
    pub fn parse(text: &str) -> Self {
        let mut labels = LabelSet::new();
        let mut current = String::new();
        let mut quoted = false;

        for c in text.chars() {
            match c {
                '"' => quoted = !quoted,
                c if c.is_whitespace() && !quoted => {
                    if !current.is_empty() {
                        labels.insert(Atom::from(std::mem::take(&mut current)));
                    }
                }
                c => current.push(c),
            }
        }
        if !current.is_empty() {
            labels.insert(Atom::from(current));
        }
        labels
    }

    pub fn contains(&self, atom: &Atom) -> bool {
        self.0.contains(atom)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.0.iter().any(|a| a.name() == name)
    }

    /// Insert an atom, returning `true` if it was not already present.
    pub fn insert(&mut self, atom: Atom) -> bool {
        self.0.insert(atom)
    }

    /// Add every atom of `other`.
    pub fn extend_from(&mut self, other: &LabelSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Atom> {
        self.0.iter()
    }

    pub fn union(&self, other: &LabelSet) -> LabelSet {
        Self(self.0.union(&other.0).cloned().collect())
    }

    pub fn intersection(&self, other: &LabelSet) -> LabelSet {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    pub fn difference(&self, other: &LabelSet) -> LabelSet {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    pub fn is_disjoint(&self, other: &LabelSet) -> bool {
        self.0.is_disjoint(&other.0)
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for atom in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            // Quote names that would not survive a round trip through `parse`.
            if atom.name().chars().any(char::is_whitespace) {
                write!(f, "\"{}\"", atom)?;
            } else {
                write!(f, "{}", atom)?;
            }
        }
        Ok(())
    }
}

impl FromIterator<Atom> for LabelSet {
    fn from_iter<I: IntoIterator<Item = Atom>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for LabelSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(Atom::new).collect())
    }
}

impl Extend<Atom> for LabelSet {
    fn extend<I: IntoIterator<Item = Atom>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for LabelSet {
    type Item = Atom;
    type IntoIter = btree_set::IntoIter<Atom>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a Atom;
    type IntoIter = btree_set::Iter<'a, Atom>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
