//! Error types for rule-set management.

/// The candidate rule set contains a dependency cycle.
///
/// `rules` lists the rules on the detected cycle, each in its
/// `"<expr> => <atoms>"` form, starting and ending with the same rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Implication cycle detected: {}", rules.join(" -> "))]
pub struct CycleDetected {
    pub rules: Vec<String>,
}

/// Errors that can occur while replacing, persisting or reloading rules.
#[derive(Debug, thiserror::Error)]
pub enum ImplicationError {
    /// The submitted rules depend on each other in a loop.
    #[error(transparent)]
    Cycle(#[from] CycleDetected),

    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Filesystem watcher error.
    #[error("Notify watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Result alias for rule-set operations.
pub type Result<T> = std::result::Result<T, ImplicationError>;
