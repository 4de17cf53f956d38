//! nom grammar for label expressions.
//!
//! ```text
//! iff     := implies ("<->" implies)*
//! implies := or ("->" implies)?
//! or      := and ("||" and)*
//! and     := unary ("&&" unary)*
//! unary   := "!" unary | primary
//! primary := "(" iff ")" | atom
//! atom    := '"' [^"]+ '"' | bare
//! ```

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{char as nomchar, multispace0},
    combinator::{all_consuming, map, opt},
    error::{context, ErrorKind, ParseError, VerboseError},
    multi::many0,
    sequence::{delimited, preceded},
    Finish,
};

use implied_core::Atom;

use super::{ExpressionError, Expr};

type In<'a> = &'a str;
type IResult<I, O, E = VerboseError<I>> = Result<(I, O), nom::Err<E>>;

/// Characters that end a bare atom.
const RESERVED: &str = "!&|()<>\"";

fn bare_atom_len(input: In) -> usize {
    let mut end = 0;
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() || RESERVED.contains(c) {
            break;
        }
        // `x86-64` is one atom, `a->b` is an implication.
        if c == '-' && matches!(chars.peek(), Some((_, '>'))) {
            break;
        }
        end = i + c.len_utf8();
    }
    end
}

/// Whether `name` can be written without quotes.
pub(super) fn is_bare_atom(name: &str) -> bool {
    !name.is_empty() && bare_atom_len(name) == name.len()
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(In<'a>) -> IResult<In<'a>, O>
where
    F: FnMut(In<'a>) -> IResult<In<'a>, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn bare_atom(s: In) -> IResult<In, In> {
    match bare_atom_len(s) {
        0 => Err(nom::Err::Error(VerboseError::from_error_kind(s, ErrorKind::TakeWhile1))),
        end => Ok((&s[end..], &s[..end])),
    }
}

fn quoted_atom(s: In) -> IResult<In, In> {
    delimited(nomchar('"'), is_not("\""), nomchar('"'))(s)
}

fn atom(s: In) -> IResult<In, Expr> {
    context(
        "atom",
        map(alt((quoted_atom, bare_atom)), |name| Expr::Atom(Atom::new(name))),
    )(s)
}

fn primary(s: In) -> IResult<In, Expr> {
    let parenthesized = delimited(ws(nomchar('(')), iff, ws(nomchar(')')));
    alt((parenthesized, ws(atom)))(s)
}

fn unary(s: In) -> IResult<In, Expr> {
    let negated = map(preceded(ws(nomchar('!')), unary), |e| Expr::Not(Box::new(e)));
    alt((negated, primary))(s)
}

fn and(s: In) -> IResult<In, Expr> {
    let (s, first) = unary(s)?;
    let (s, rest) = many0(preceded(ws(tag("&&")), unary))(s)?;
    let expr = rest
        .into_iter()
        .fold(first, |l, r| Expr::And(Box::new(l), Box::new(r)));
    Ok((s, expr))
}

fn or(s: In) -> IResult<In, Expr> {
    let (s, first) = and(s)?;
    let (s, rest) = many0(preceded(ws(tag("||")), and))(s)?;
    let expr = rest
        .into_iter()
        .fold(first, |l, r| Expr::Or(Box::new(l), Box::new(r)));
    Ok((s, expr))
}

fn implies(s: In) -> IResult<In, Expr> {
    let (s, lhs) = or(s)?;
    let (s, rhs) = opt(preceded(ws(tag("->")), implies))(s)?;
    let expr = match rhs {
        Some(rhs) => Expr::Implies(Box::new(lhs), Box::new(rhs)),
        None => lhs,
    };
    Ok((s, expr))
}

fn iff(s: In) -> IResult<In, Expr> {
    let (s, first) = implies(s)?;
    let (s, rest) = many0(preceded(ws(tag("<->")), implies))(s)?;
    let expr = rest
        .into_iter()
        .fold(first, |l, r| Expr::Iff(Box::new(l), Box::new(r)));
    Ok((s, expr))
}

pub(super) fn parse_expression(text: &str) -> Result<Expr, ExpressionError> {
    if text.trim().is_empty() {
        return Err(ExpressionError::Empty);
    }

    all_consuming(ws(iff))(text)
        .finish()
        .map(|(_, expr)| expr)
        .map_err(|e| {
            let rest = e.errors.first().map(|(rest, _)| *rest).unwrap_or("");
            let message = match rest.chars().next() {
                None => "unexpected end of expression".to_string(),
                Some(c) => format!("unexpected '{}' at column {}", c, text.len() - rest.len() + 1),
            };
            ExpressionError::Syntax {
                input: text.to_string(),
                message,
            }
        })
}
