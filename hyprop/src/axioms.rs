//! The classical axiom schemas of the implication/negation calculus.
//!
//! Built node by node rather than parsed, so they are available without going through
//! [`crate::parser`].
use crate::expr::Expression;
use crate::term::{Operation, Term, Value};

fn var(value: Value) -> Expression {
    Expression::from_term(Term::variable(value))
}

fn not(value: Value) -> Expression {
    let mut term = Term::variable(value);
    term.toggle_negation();
    Expression::from_term(term)
}

fn implies(lhs: Expression, rhs: Expression) -> Expression {
    Expression::construct(&lhs, Operation::Implication, &rhs)
}

/// `a>(b>a)`
pub fn weakening() -> Expression {
    implies(var(1), implies(var(2), var(1)))
}

/// `(a>(b>c))>((a>b)>(a>c))`
pub fn distribution() -> Expression {
    implies(
        implies(var(1), implies(var(2), var(3))),
        implies(implies(var(1), var(2)), implies(var(1), var(3))),
    )
}

/// `(!a>!b)>((!a>b)>a)`
pub fn reductio() -> Expression {
    implies(
        implies(not(1), not(2)),
        implies(implies(not(1), var(2)), var(1)),
    )
}

/// The three schemas, in the conventional order.
pub fn classical() -> Vec<Expression> {
    vec![weakening(), distribution(), reductio()]
}

/// Contraposition lemma `(!a>!b)>(b>a)`, seeded into every search.
pub fn contraposition() -> Expression {
    implies(implies(not(1), not(2)), implies(var(2), var(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn schemas_match_their_text() {
        let texts = [
            "a>(b>a)",
            "(a>(b>c))>((a>b)>(a>c))",
            "(!a>!b)>((!a>b)>a)",
        ];
        for (axiom, text) in classical().iter().zip(texts) {
            assert_eq!(axiom.string(), text);
            assert_eq!(*axiom, parse(text).unwrap());
        }
        assert_eq!(contraposition(), parse("(!a>!b)>(b>a)").unwrap());
    }
}
