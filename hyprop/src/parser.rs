//! Parser for the infix formula language using chumsky.
//!
//! Role
//! - Turn text such as `(a>b)>((b>c)>(a>c))` into an [`Expression`].
//! - Accepts exactly what [`Expression::string`] prints for variable-only formulas, so rendering
//!   and parsing round-trip.
//!
//! Three stages:
//! 1) Tokenisation from the input string to a spanned `Token` stream.
//! 2) A linear scan over tokens reporting unbalanced parentheses and consecutive binary operators
//!    with precise positions.
//! 3) Parsing tokens directly into arena expressions.
//!
//! Syntax
//! - Variables: single letters `a`..`z`, mapped to ids `1..=26`.
//! - Prefix `!`, binding tightest. It is applied with [`Expression::negate`], so `!(a>b)` parses
//!   to `a*!b` and `!!a` to `a`.
//! - Binary operators, tightest first: `*`, `|`, then `+` and `=`, then `>`. All of them are
//!   right-associative: `a>b>c` is `a>(b>c)`.
//! - Parentheses group; whitespace is ignored.
use std::fmt;

use chumsky::prelude::*;
use thiserror::Error;

use crate::expr::Expression;
use crate::term::{Operation, Term, Value};

pub type Spanned<T> = (T, SimpleSpan);

type Extra<'t> = extra::Err<Rich<'t, Token>>;

/// Failure to turn text into an [`Expression`]. Positions are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty formula")]
    Empty,
    #[error("invalid character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("unbalanced parenthesis at position {position}")]
    UnbalancedParentheses { position: usize },
    #[error("consecutive binary operators at position {position}")]
    ConsecutiveOperators { position: usize },
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },
}

impl ParseError {
    /// Byte offset the error points at, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::Empty => None,
            ParseError::InvalidCharacter { position, .. }
            | ParseError::UnbalancedParentheses { position }
            | ParseError::ConsecutiveOperators { position }
            | ParseError::Syntax { position, .. } => Some(*position),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Token {
    LParen,
    RParen,
    Not,
    Op(Operation),
    Var(Value),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Not => f.write_str("!"),
            Token::Op(op) => write!(f, "{op}"),
            Token::Var(v) => f.write_str(&crate::term::letter(*v, false)),
        }
    }
}

// ---------------- Lexer ----------------

fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<Spanned<Token>>, extra::Err<Rich<'a, char>>> {
    let variable = any()
        .filter(|c: &char| c.is_ascii_lowercase())
        .map(|c: char| Token::Var((c as u8 - b'a') as Value + 1));

    let symbol = select! {
        '(' => Token::LParen,
        ')' => Token::RParen,
        '!' => Token::Not,
        '>' => Token::Op(Operation::Implication),
        '|' => Token::Op(Operation::Disjunction),
        '*' => Token::Op(Operation::Conjunction),
        '+' => Token::Op(Operation::Xor),
        '=' => Token::Op(Operation::Equivalent),
    };

    variable
        .or(symbol)
        .map_with(|tok, e| (tok, e.span()))
        .padded()
        .repeated()
        .collect()
        .then_ignore(end())
}

// ---------------- Token checks ----------------

fn check_structure(tokens: &[Spanned<Token>]) -> Result<(), ParseError> {
    let mut open: Vec<usize> = Vec::new();
    let mut previous: Option<Token> = None;

    for (token, span) in tokens {
        match token {
            Token::LParen => open.push(span.start),
            Token::RParen => {
                if open.pop().is_none() {
                    return Err(ParseError::UnbalancedParentheses {
                        position: span.start,
                    });
                }
            }
            Token::Op(_) if matches!(previous, Some(Token::Op(_))) => {
                return Err(ParseError::ConsecutiveOperators {
                    position: span.start,
                });
            }
            _ => {}
        }
        previous = Some(*token);
    }

    match open.pop() {
        Some(position) => Err(ParseError::UnbalancedParentheses { position }),
        None => Ok(()),
    }
}

// ---------------- chumsky parser over tokens ----------------

/// `a0 o1 a1 o2 a2` grouped as `a0 o1 (a1 o2 a2)`.
fn fold_right(first: Expression, rest: Vec<(Operation, Expression)>) -> Expression {
    let mut last = first;
    let mut pending = Vec::with_capacity(rest.len());
    for (op, operand) in rest {
        pending.push((std::mem::replace(&mut last, operand), op));
    }
    pending
        .into_iter()
        .rev()
        .fold(last, |rhs, (lhs, op)| Expression::construct(&lhs, op, &rhs))
}

/// One precedence level of right-associative binary operators drawn from `ops`.
fn right_assoc<'t, P>(
    operand: P,
    ops: &'static [Operation],
) -> impl Parser<'t, &'t [Token], Expression, Extra<'t>> + Clone
where
    P: Parser<'t, &'t [Token], Expression, Extra<'t>> + Clone,
{
    let op = select! { Token::Op(op) if ops.contains(&op) => op };
    operand
        .clone()
        .then(op.then(operand).repeated().collect::<Vec<_>>())
        .map(|(first, rest)| fold_right(first, rest))
}

fn formula_parser<'t>() -> impl Parser<'t, &'t [Token], Expression, Extra<'t>> + Clone {
    recursive(|formula| {
        let variable = select! { Token::Var(v) => Expression::from_term(Term::variable(v)) };

        let atom = variable
            .or(formula.delimited_by(just(Token::LParen), just(Token::RParen)))
            .labelled("operand");

        let prefix = just(Token::Not)
            .repeated()
            .foldr(atom, |_, mut operand: Expression| {
                operand.negate(0);
                operand
            });

        let conjunction = right_assoc(prefix, &[Operation::Conjunction]).boxed();
        let disjunction = right_assoc(conjunction, &[Operation::Disjunction]).boxed();
        let parity = right_assoc(disjunction, &[Operation::Xor, Operation::Equivalent]).boxed();
        right_assoc(parity, &[Operation::Implication]).labelled("formula")
    })
}

// ---------------- Public API ----------------

/// Parse an infix formula into an [`Expression`].
///
/// Example
/// ```
/// use hyprop::parser::parse;
///
/// let e = parse("a | !(b > c)").unwrap();
/// assert_eq!(e.string(), "a|(b*!c)");
/// ```
pub fn parse(src: &str) -> Result<Expression, ParseError> {
    if src.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let tokens = lexer()
        .parse(src)
        .into_result()
        .map_err(|errors| lexing_error(src, &errors))?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    check_structure(&tokens)?;

    let plain: Vec<Token> = tokens.iter().map(|(t, _)| *t).collect();
    formula_parser()
        .then_ignore(end())
        .parse(plain.as_slice())
        .into_result()
        .map_err(|errors| syntax_error(src, &tokens, &errors))
}

fn lexing_error(src: &str, errors: &[Rich<'_, char>]) -> ParseError {
    let position = errors.first().map_or(src.len(), |e| e.span().start);
    match src.get(position..).and_then(|rest| rest.chars().next()) {
        Some(character) => ParseError::InvalidCharacter {
            character,
            position,
        },
        None => ParseError::Syntax {
            position,
            message: "unexpected end of input".to_owned(),
        },
    }
}

fn syntax_error(src: &str, tokens: &[Spanned<Token>], errors: &[Rich<'_, Token>]) -> ParseError {
    let Some(error) = errors.first() else {
        return ParseError::Syntax {
            position: src.len(),
            message: "invalid formula".to_owned(),
        };
    };
    // Token-index spans back to byte offsets.
    let position = tokens
        .get(error.span().start)
        .map_or(src.len(), |(_, span)| span.start);
    ParseError::Syntax {
        position,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(src: &str) -> String {
        parse(src).unwrap().string().to_owned()
    }

    #[test]
    fn variables_and_negation() {
        assert_eq!(render("a"), "a");
        assert_eq!(render("z"), "z");
        assert_eq!(render("!a"), "!a");
        assert_eq!(render("!!a"), "a");
        assert_eq!(render("!(a>b)"), "a*!b");
        assert_eq!(render(" ( a ) "), "a");
        assert_eq!(parse("z").unwrap().variables(), vec![26]);
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(render("a>b>c"), "a>(b>c)");
        assert_eq!(render("a*b|c"), "(a*b)|c");
        assert_eq!(render("a|b*c"), "a|(b*c)");
        assert_eq!(render("a+b>c"), "(a+b)>c");
        assert_eq!(render("a>b=c"), "a>(b=c)");
        assert_eq!(render("a+b=c"), "a+(b=c)");
        assert_eq!(render("a*b*c"), "a*(b*c)");
        assert_eq!(render("!a*b"), "!a*b");
        assert_eq!(render("(a>b)>c"), "(a>b)>c");
    }

    #[test]
    fn parses_in_preorder() {
        let e = parse("(a>b)*c").unwrap();
        let labels: Vec<String> = e.nodes().iter().map(|n| n.term.to_string()).collect();
        assert_eq!(labels, ["*", ">", "a", "b", "c"]);
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(ParseError::Empty.position(), None);
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(parse("\t\n"), Err(ParseError::Empty));
        assert_eq!(render("a  "), "a");
    }

    #[test]
    fn invalid_characters() {
        assert_eq!(
            parse("a>B"),
            Err(ParseError::InvalidCharacter {
                character: 'B',
                position: 2
            })
        );
        assert_eq!(
            parse("a & b"),
            Err(ParseError::InvalidCharacter {
                character: '&',
                position: 2
            })
        );
    }

    #[test]
    fn unbalanced_parentheses() {
        assert_eq!(
            parse("(a>b"),
            Err(ParseError::UnbalancedParentheses { position: 0 })
        );
        assert_eq!(
            parse("a>b)"),
            Err(ParseError::UnbalancedParentheses { position: 3 })
        );
        assert_eq!(
            parse("((a)"),
            Err(ParseError::UnbalancedParentheses { position: 0 })
        );
    }

    #[test]
    fn consecutive_operators() {
        assert_eq!(parse("a>>b").unwrap_err().position(), Some(2));
        assert_eq!(
            parse("a>>b"),
            Err(ParseError::ConsecutiveOperators { position: 2 })
        );
        assert_eq!(
            parse("a * | b"),
            Err(ParseError::ConsecutiveOperators { position: 4 })
        );
    }

    #[test]
    fn other_syntax_errors() {
        for src in ["a b", "a>", "()", ">a", "a!"] {
            assert!(
                matches!(parse(src), Err(ParseError::Syntax { .. })),
                "{src} should be rejected"
            );
        }
        assert!(matches!(
            parse("a b"),
            Err(ParseError::Syntax { position: 2, .. })
        ));
    }
}
