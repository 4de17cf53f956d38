//! Expression tree, evaluation and canonical formatting.

use std::fmt;

use implied_core::{Atom, LabelSet};

use super::{parse, ExpressionError, LabelExpression};

/// Label expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Atom(Atom),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    /// `a -> b`, true unless `a` holds and `b` does not.
    Implies(Box<Expr>, Box<Expr>),
    /// `a <-> b`, true when both sides agree.
    Iff(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse expression text. Empty text is an error.
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        parse::parse_expression(text)
    }

    pub fn evaluate(&self, labels: &LabelSet) -> bool {
        match self {
            Expr::Atom(atom) => labels.contains(atom),
            Expr::Not(inner) => !inner.evaluate(labels),
            Expr::And(l, r) => l.evaluate(labels) && r.evaluate(labels),
            Expr::Or(l, r) => l.evaluate(labels) || r.evaluate(labels),
            Expr::Implies(l, r) => !l.evaluate(labels) || r.evaluate(labels),
            Expr::Iff(l, r) => l.evaluate(labels) == r.evaluate(labels),
        }
    }

    fn collect_atoms(&self, out: &mut LabelSet) {
        match self {
            Expr::Atom(atom) => {
                out.insert(atom.clone());
            }
            Expr::Not(inner) => inner.collect_atoms(out),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Implies(l, r) | Expr::Iff(l, r) => {
                l.collect_atoms(out);
                r.collect_atoms(out);
            }
        }
    }

    /// Binding strength, higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            Expr::Iff(..) => 1,
            Expr::Implies(..) => 2,
            Expr::Or(..) => 3,
            Expr::And(..) => 4,
            Expr::Not(_) => 5,
            Expr::Atom(_) => 6,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parens: bool) -> fmt::Result {
        if parens {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }

    fn fmt_binary(
        &self,
        f: &mut fmt::Formatter<'_>,
        l: &Expr,
        op: &str,
        r: &Expr,
        right_assoc: bool,
    ) -> fmt::Result {
        let p = self.precedence();
        let (left_parens, right_parens) = if right_assoc {
            (l.precedence() <= p, r.precedence() < p)
        } else {
            (l.precedence() < p, r.precedence() <= p)
        };
        l.fmt_child(f, left_parens)?;
        f.write_str(op)?;
        r.fmt_child(f, right_parens)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Atom(atom) => {
                if parse::is_bare_atom(atom.name()) {
                    write!(f, "{}", atom)
                } else {
                    write!(f, "\"{}\"", atom)
                }
            }
            Expr::Not(inner) => {
                f.write_str("!")?;
                inner.fmt_child(f, inner.precedence() < self.precedence())
            }
            Expr::And(l, r) => self.fmt_binary(f, l, "&&", r, false),
            Expr::Or(l, r) => self.fmt_binary(f, l, "||", r, false),
            Expr::Implies(l, r) => self.fmt_binary(f, l, "->", r, true),
            Expr::Iff(l, r) => self.fmt_binary(f, l, "<->", r, false),
        }
    }
}

impl LabelExpression for Expr {
    fn matches(&self, labels: &LabelSet) -> bool {
        self.evaluate(labels)
    }

    fn atoms(&self) -> LabelSet {
        let mut out = LabelSet::new();
        self.collect_atoms(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str, labels: &str) -> bool {
        Expr::parse(expr).unwrap().evaluate(&LabelSet::parse(labels))
    }

    #[test]
    fn or_and_not() {
        assert!(eval("a||b", "b"));
        assert!(!eval("a||b", "c"));
        assert!(eval("a&&b", "a b"));
        assert!(!eval("a&&b", "a"));
        assert!(eval("!a", ""));
        assert!(!eval("!a", "a"));
    }

    #[test]
    fn implies_and_iff() {
        assert!(eval("a->b", ""));
        assert!(eval("a->b", "a b"));
        assert!(!eval("a->b", "a"));
        assert!(eval("a<->b", ""));
        assert!(eval("a<->b", "a b"));
        assert!(!eval("a<->b", "b"));
    }

    #[test]
    fn precedence_and_binds_tighter_than_or() {
        // a || (b && c)
        assert!(eval("a || b && c", "a"));
        assert!(!eval("a || b && c", "b"));
        // (a || b) && c
        assert!(!eval("(a || b) && c", "a"));
        assert!(eval("(a || b) && c", "a c"));
    }

    #[test]
    fn atoms_include_negated_references() {
        let expr = Expr::parse("rhel || !windows && (arm -> \"big endian\")").unwrap();
        let expected: LabelSet = ["rhel", "windows", "arm", "big endian"].into_iter().collect();
        assert_eq!(expr.atoms(), expected);
    }

    #[test]
    fn display_is_canonical() {
        let cases = [
            ("a || b", "a||b"),
            ("rhel64 ||  rhel65", "rhel64||rhel65"),
            ("(a || b) && c", "(a||b)&&c"),
            ("a || (b && c)", "a||b&&c"),
            ("!(a && b)", "!(a&&b)"),
            ("!!a", "!!a"),
            ("a -> b -> c", "a->b->c"),
            ("(a -> b) -> c", "(a->b)->c"),
            ("a || (b || c)", "a||(b||c)"),
            ("\"with space\" && x", "\"with space\"&&x"),
        ];
        for (input, expected) in cases {
            let expr = Expr::parse(input).unwrap();
            assert_eq!(expr.to_string(), expected, "formatting {input}");
            // The canonical form parses back to the same tree.
            assert_eq!(Expr::parse(expected).unwrap(), expr, "reparsing {expected}");
        }
    }
}
