//! Inference rules.
use log::trace;

use crate::expr::Expression;
use crate::term::Operation;
use crate::unify::{apply, unify_disjoint_above};

/// Modus ponens: from `minor` (`A`) and `major` (`A'>B`) derive `B` under the unifier of `A` and
/// `A'`, normalized.
///
/// Returns an empty expression when the rule does not apply: an empty operand, a major premise
/// whose root is not an implication, or an antecedent that does not unify with `minor`.
///
/// ```
/// use hyprop::parser::parse;
/// use hyprop::rules::apply_modus_ponens;
///
/// let b = apply_modus_ponens(&parse("a>a").unwrap(), &parse("a>(b>a)").unwrap());
/// assert_eq!(b.string(), "a>(b>b)");
/// assert!(apply_modus_ponens(&parse("a").unwrap(), &parse("a*b").unwrap()).is_empty());
/// ```
pub fn apply_modus_ponens(minor: &Expression, major: &Expression) -> Expression {
    if minor.is_empty() || !major.is_rooted_at(Operation::Implication) {
        return Expression::new();
    }

    let mut major = major.clone();
    major.change_variables(minor.max_value() + 1);
    let antecedent = major.copy_subtree(major.left(0));

    // Fresh variables must not capture variables that only occur in the consequent.
    let substitution = match unify_disjoint_above(minor, &antecedent, major.max_value() + 1) {
        Ok(substitution) => substitution,
        Err(err) => {
            trace!("mp({minor}, {major}) rejected: {err}");
            return Expression::new();
        }
    };

    let mut conclusion = apply(&substitution, &major.copy_subtree(major.right(0)));
    conclusion.normalize();
    conclusion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn normalized(src: &str) -> Expression {
        let mut e = parse(src).unwrap();
        e.normalize();
        e
    }

    #[test]
    fn detaches_the_consequent() {
        let b = apply_modus_ponens(&parse("a").unwrap(), &parse("a>b").unwrap());
        assert_eq!(b, normalized("b"));
    }

    #[test]
    fn instantiates_the_consequent() {
        let minor = parse("c>d").unwrap();
        let major = parse("a>(b>a)").unwrap();
        assert_eq!(apply_modus_ponens(&minor, &major).string(), "a>(b>c)");
    }

    #[test]
    fn minor_variables_do_not_collide_with_major_ones() {
        // The minor premise uses `b`, the major premise uses it for something else.
        let minor = parse("b").unwrap();
        let major = parse("a>(b>a)").unwrap();
        assert_eq!(apply_modus_ponens(&minor, &major).string(), "a>b");
    }

    #[test]
    fn consequent_only_variables_stay_free() {
        let minor = parse("a>a").unwrap();
        let major = parse("(a>b)>(c>a)").unwrap();
        assert_eq!(apply_modus_ponens(&minor, &major).string(), "a>b");
    }

    #[test]
    fn constants_stay_frozen() {
        let mut minor = parse("a").unwrap();
        minor.make_constant();
        let major = parse("a>(b>a)").unwrap();
        assert_eq!(apply_modus_ponens(&minor, &major).string(), "a>A");

        let mut wrong = parse("a>b").unwrap();
        wrong.make_constant();
        let mut other = parse("b").unwrap();
        other.make_constant();
        assert!(apply_modus_ponens(&other, &wrong).is_empty());
    }

    #[test]
    fn negated_antecedent() {
        let mut minor = parse("!a").unwrap();
        minor.make_constant();
        let major = parse("!a>(a>b)").unwrap();
        assert_eq!(apply_modus_ponens(&minor, &major).string(), "A>a");
    }

    #[test]
    fn inapplicable_inputs_yield_empty() {
        let a = parse("a").unwrap();
        assert!(apply_modus_ponens(&a, &parse("a*b").unwrap()).is_empty());
        assert!(apply_modus_ponens(&a, &parse("a").unwrap()).is_empty());
        assert!(apply_modus_ponens(&Expression::new(), &parse("a>b").unwrap()).is_empty());
        assert!(apply_modus_ponens(&a, &Expression::new()).is_empty());
        assert!(apply_modus_ponens(&parse("a>b").unwrap(), &parse("(a*b)>a").unwrap()).is_empty());
    }
}
