#![allow(dead_code)]

use hyprop::expr::Expression;
use hyprop::term::{Operation, Term, Value};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

pub fn rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Random formula without disjunctions over variables `1..=variables`, at most `budget` deep.
///
/// Negation only ever sits on leaves, as in every rendered formula.
pub fn random_formula(rng: &mut impl Rng, budget: usize, variables: Value) -> Expression {
    if budget == 0 || rng.random_bool(0.25) {
        let mut term = Term::variable(rng.random_range(1..=variables));
        if rng.random_bool(0.3) {
            term.toggle_negation();
        }
        return Expression::from_term(term);
    }

    let op = match rng.random_range(0..4) {
        0 | 1 => Operation::Implication,
        2 => Operation::Conjunction,
        _ => {
            if rng.random_bool(0.5) {
                Operation::Xor
            } else {
                Operation::Equivalent
            }
        }
    };
    let left = random_formula(rng, budget - 1, variables);
    let right = random_formula(rng, budget - 1, variables);
    Expression::construct(&left, op, &right)
}

/// Like [`random_formula`], with every leaf frozen.
pub fn random_constant_formula(rng: &mut impl Rng, budget: usize, variables: Value) -> Expression {
    let mut e = random_formula(rng, budget, variables);
    e.make_constant();
    e
}
