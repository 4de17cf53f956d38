//! Boolean label expressions.
//!
//! The rule engine only sees expressions through [`LabelExpression`] and
//! [`ExpressionParser`]. [`Expr`] is the stock implementation: the usual
//! label language with `!`, `&&`, `||`, `->`, `<->`, parentheses and
//! (optionally double-quoted) atoms.

mod ast;
mod parse;

use std::fmt;
use std::sync::Arc;

use implied_core::LabelSet;

pub use ast::Expr;

/// Errors produced while parsing expression text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// The text was empty or whitespace only.
    #[error("empty label expression")]
    Empty,

    /// The text does not follow the expression grammar.
    #[error("invalid label expression '{input}': {message}")]
    Syntax { input: String, message: String },
}

/// A parsed predicate over a label set.
///
/// `Display` must produce the canonical text of the expression: rules
/// compare and persist expressions by that text.
pub trait LabelExpression: fmt::Debug + fmt::Display + Send + Sync {
    /// Evaluate against a set of labels.
    fn matches(&self, labels: &LabelSet) -> bool;

    /// Every atom the expression mentions, negated or not.
    fn atoms(&self) -> LabelSet;
}

/// Turns expression text into a [`LabelExpression`].
pub trait ExpressionParser {
    fn parse(&self, text: &str) -> Result<Arc<dyn LabelExpression>, ExpressionError>;
}

/// Parser for the stock [`Expr`] language.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelExpressionParser;

impl ExpressionParser for LabelExpressionParser {
    fn parse(&self, text: &str) -> Result<Arc<dyn LabelExpression>, ExpressionError> {
        let expr = Expr::parse(text)?;
        Ok(Arc::new(expr))
    }
}
