//! Label implication engine.
//!
//! This crate provides:
//! - Boolean label expressions behind a pluggable parser trait
//! - Implication rules ("expression => atoms") and their dependency sort
//! - Single-pass closure evaluation with a per-label-set cache
//! - YAML persistence of the rule list with hot-reload via `notify`
//! - Label source registry for computing a node's initial labels

pub mod closure;
pub mod error;
pub mod expression;
pub mod resolver;
pub mod rule;
pub mod service;
pub mod sorter;
pub mod source;
pub mod store;

pub use error::{CycleDetected, ImplicationError, Result};
pub use resolver::{CacheStats, Resolver};
pub use rule::{Rule, RuleSpec};
pub use service::{check_expression, ExpressionCheck, ImpliedLabelSource, ImpliedLabels};
pub use source::{LabelSource, LabelSources, SourceKind, StaticLabels};
pub use store::ImplicationStore;
