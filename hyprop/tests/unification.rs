mod common;

use std::collections::BTreeMap;

use hyprop::parser::parse;
use hyprop::prelude::*;
use hyprop::unify::{apply, resolve, unify_disjoint};

use common::{random_constant_formula, random_formula, rng};

#[test]
fn schemas_unify_with_their_instances() {
    let mut rng = rng(0xC0FFEE);
    for _ in 0..200 {
        let schema = random_formula(&mut rng, 4, 3);
        let chosen: BTreeMap<Value, Expression> = (1..=3)
            .map(|variable| (variable, random_constant_formula(&mut rng, 2, 4)))
            .collect();
        let instance = apply(&chosen, &schema);

        let substitution = unify(&schema, &instance)
            .unwrap_or_else(|err| panic!("{schema} against {instance}: {err}"));
        assert_eq!(apply(&substitution, &schema), instance);
        assert_eq!(apply(&substitution, &instance), instance);
    }
}

#[test]
fn successful_unifiers_equalize_both_sides() {
    let mut rng = rng(0xBEEF);
    let mut unified = 0;
    for _ in 0..500 {
        let left = random_formula(&mut rng, 3, 3);
        let mut right = random_formula(&mut rng, 3, 3);
        right.change_variables(left.max_value() + 1);

        if let Ok(substitution) = unify_disjoint(&left, &right) {
            unified += 1;
            let l = apply(&substitution, &left);
            let r = apply(&substitution, &right);
            assert_eq!(l, r, "{left} against {right}");

            for variable in substitution.keys() {
                assert!(!l.contains_variable(*variable));
            }
        }
    }
    assert!(unified > 0);
}

#[test]
fn occurs_check_rejects_self_reference() {
    let x = parse("a").unwrap();
    for src in ["a>b", "b*(c>a)", "!a=b"] {
        assert!(
            matches!(
                unify_disjoint(&x, &parse(src).unwrap()),
                Err(UnificationError::OccursCheck { variable: 1, .. })
            ),
            "a against {src}"
        );
    }
}

#[test]
fn distinct_constants_never_unify() {
    let mut a = parse("a").unwrap();
    a.make_constant();
    let mut b = parse("b").unwrap();
    b.make_constant();
    assert!(matches!(
        unify(&a, &b),
        Err(UnificationError::ConstantClash { .. })
    ));
    assert!(unify(&a, &a).unwrap().is_empty());
}

#[test]
fn chains_resolve_with_polarity() {
    // a := !b, b := c>d
    let mut substitution = Substitution::new();
    let mut not_b = Term::variable(2);
    not_b.toggle_negation();
    substitution.insert(1, Expression::from_term(not_b));
    substitution.insert(2, parse("c>d").unwrap());

    let a = resolve(&substitution, Term::variable(1)).unwrap();
    assert_eq!(a.string(), "c*!d");

    let mut not_a = Term::variable(1);
    not_a.toggle_negation();
    assert_eq!(resolve(&substitution, not_a).unwrap().string(), "c>d");
    assert!(resolve(&substitution, Term::variable(3)).is_none());
    assert!(resolve(&substitution, Term::constant(1)).is_none());
}

#[test]
fn axiom_schema_matches_its_instance() {
    let distribution = axioms::distribution();
    let instance = parse("(a>((b>a)>a))>((a>(b>a))>(a>a))").unwrap();
    let substitution = unify(&instance, &distribution).unwrap();

    let mut schema = distribution.clone();
    schema.change_variables(instance.max_value() + 1);
    let unified = apply(&substitution, &instance);
    assert_eq!(apply(&substitution, &schema), unified);

    // Only renamings happen on the instance side.
    let mut renamed = unified.clone();
    renamed.normalize();
    assert_eq!(renamed, instance);
}
