//! Structural unification of formulas.
//!
//! Two formulas unify when some substitution of their variables makes them positionally equal.
//! Constants never bind. A negated variable leaf `!x` matched against `F` binds `x` to the
//! logical negation of `F` (see [`Expression::negate`]).
//!
//! The work queue holds owned subtree pairs. Each side is first resolved through the bindings
//! collected so far, then the pair is classified:
//! - function/function: operators must agree, children are queued pairwise;
//! - constant/constant: labels must be identical, polarity included;
//! - variable/constant and variable/function: the variable binds, after an occurs check;
//! - variable/variable: same variable needs the same polarity, distinct variables are both bound
//!   to a fresh variable.
//!
//! Once the queue drains, bindings are ordered by a topological sort of their dependency graph and
//! expanded so that no bound variable appears in any bound value. A dependency cycle fails the
//! whole unification.
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use thiserror::Error;

use crate::expr::Expression;
use crate::term::{Operation, Term, TermType, Value};

/// Variable id to bound formula. Ordered so iteration is deterministic.
pub type Substitution = BTreeMap<Value, Expression>;

pub type UnificationResult = Result<Substitution, UnificationError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnificationError {
    #[error("cannot unify an empty formula")]
    EmptyOperand,
    #[error("operator clash: '{left}' against '{right}'")]
    OperatorClash { left: Operation, right: Operation },
    #[error("constant clash: {left} against {right}")]
    ConstantClash { left: String, right: String },
    #[error("variable {variable} is required with both polarities")]
    PolarityClash { variable: Value },
    #[error("variable {variable} occurs in {term}")]
    OccursCheck { variable: Value, term: String },
    #[error("bindings depend on each other through variable {variable}")]
    Cycle { variable: Value },
    #[error("cannot match {left} against {right}")]
    Mismatch { left: String, right: String },
}

/// Unify `left` and `right` after moving the variables of `right` out of the way.
///
/// The variables of `right` are renamed as by `change_variables(left.max_value() + 1)` before
/// matching; keys of the returned substitution referring to `right` use the renamed ids.
pub fn unify(left: &Expression, right: &Expression) -> UnificationResult {
    let mut right = right.clone();
    right.change_variables(left.max_value() + 1);
    unify_disjoint(left, &right)
}

/// Unify two formulas whose variables are already kept apart by the caller.
///
/// Fresh variables are allocated above the largest variable of both sides.
pub fn unify_disjoint(left: &Expression, right: &Expression) -> UnificationResult {
    unify_disjoint_above(left, right, 0)
}

/// Like [`unify_disjoint`], with fresh variables allocated at `floor` or above.
///
/// Callers that apply the substitution to a larger formula than `right` pass a floor above that
/// formula's variables so fresh ids never capture them.
pub fn unify_disjoint_above(
    left: &Expression,
    right: &Expression,
    floor: Value,
) -> UnificationResult {
    if left.is_empty() || right.is_empty() {
        return Err(UnificationError::EmptyOperand);
    }

    let mut unifier = Unifier {
        bindings: Substitution::new(),
        fresh: floor.max(left.max_value().max(right.max_value()) + 1),
    };
    let mut queue = VecDeque::from([(left.clone(), right.clone())]);
    while let Some((lhs, rhs)) = queue.pop_front() {
        let lhs = unifier.chase(lhs);
        let rhs = unifier.chase(rhs);
        unifier.step(lhs, rhs, &mut queue)?;
    }
    unifier.finish()
}

struct Unifier {
    bindings: Substitution,
    fresh: Value,
}

impl Unifier {
    /// Follow variable roots through the bindings, toggling polarity on each negated hop.
    fn chase(&self, mut expr: Expression) -> Expression {
        while let Some(&root) = expr.root() {
            if !root.is_variable() {
                break;
            }
            let Some(bound) = self.bindings.get(&root.value) else {
                break;
            };
            expr = bound.clone();
            if root.is_negated() {
                expr.negate(0);
            }
        }
        expr
    }

    fn step(
        &mut self,
        lhs: Expression,
        rhs: Expression,
        queue: &mut VecDeque<(Expression, Expression)>,
    ) -> Result<(), UnificationError> {
        let (Some(&l), Some(&r)) = (lhs.root(), rhs.root()) else {
            return Err(UnificationError::EmptyOperand);
        };

        match (l.kind, r.kind) {
            (TermType::Function, TermType::Function) => {
                if l.op != r.op {
                    return Err(UnificationError::OperatorClash {
                        left: l.op,
                        right: r.op,
                    });
                }
                queue.push_back((lhs.copy_subtree(lhs.left(0)), rhs.copy_subtree(rhs.left(0))));
                queue.push_back((
                    lhs.copy_subtree(lhs.right(0)),
                    rhs.copy_subtree(rhs.right(0)),
                ));
                Ok(())
            }
            (TermType::Constant, TermType::Constant) => {
                if l == r {
                    Ok(())
                } else {
                    Err(UnificationError::ConstantClash {
                        left: l.to_string(),
                        right: r.to_string(),
                    })
                }
            }
            (TermType::Variable, TermType::Variable) if l.value == r.value => {
                if l.op == r.op {
                    Ok(())
                } else {
                    Err(UnificationError::PolarityClash { variable: l.value })
                }
            }
            (TermType::Variable, TermType::Variable) => {
                let fresh = Expression::from_term(Term::variable(self.fresh));
                self.fresh += 1;
                self.bind(l, &fresh)?;
                self.bind(r, &fresh)
            }
            (TermType::Variable, TermType::Constant | TermType::Function) => self.bind(l, &rhs),
            (TermType::Constant | TermType::Function, TermType::Variable) => self.bind(r, &lhs),
            _ => Err(UnificationError::Mismatch {
                left: lhs.to_string(),
                right: rhs.to_string(),
            }),
        }
    }

    /// Whether `variable` occurs in `expr` once the current bindings are expanded.
    fn reaches(&self, expr: &Expression, variable: Value) -> bool {
        let mut pending = expr.variables();
        let mut seen = BTreeSet::new();
        while let Some(next) = pending.pop() {
            if next == variable {
                return true;
            }
            if seen.insert(next) {
                if let Some(bound) = self.bindings.get(&next) {
                    pending.extend(bound.variables());
                }
            }
        }
        false
    }

    /// Bind the (unbound) variable leaf `variable` so that it matches `target`.
    ///
    /// Bindings stay acyclic: a value reaching `variable` through earlier bindings is rejected.
    fn bind(&mut self, variable: Term, target: &Expression) -> Result<(), UnificationError> {
        debug_assert!(variable.is_variable() && !self.bindings.contains_key(&variable.value));

        let mut value = target.clone();
        if variable.is_negated() {
            value.negate(0);
        }
        if self.reaches(&value, variable.value) {
            return Err(UnificationError::OccursCheck {
                variable: variable.value,
                term: value.to_string(),
            });
        }
        self.bindings.insert(variable.value, value);
        Ok(())
    }

    /// Expand every binding so that no bound variable remains in any value.
    fn finish(self) -> UnificationResult {
        let mut graph: DiGraphMap<Value, ()> = DiGraphMap::new();
        for (&variable, value) in &self.bindings {
            graph.add_node(variable);
            for dependency in value.variables() {
                if self.bindings.contains_key(&dependency) {
                    graph.add_edge(variable, dependency, ());
                }
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| UnificationError::Cycle {
            variable: cycle.node_id(),
        })?;

        // Dependencies come last in topological order, so walk it backwards.
        let mut resolved = Substitution::new();
        for variable in order.into_iter().rev() {
            let Some(value) = self.bindings.get(&variable) else {
                continue;
            };
            let expanded = substitute(value, &resolved);
            if expanded.contains_variable(variable) {
                return Err(UnificationError::OccursCheck {
                    variable,
                    term: expanded.to_string(),
                });
            }
            resolved.insert(variable, expanded);
        }
        Ok(resolved)
    }
}

fn substitute(expr: &Expression, substitution: &Substitution) -> Expression {
    let variables: BTreeSet<Value> = expr.variables().into_iter().collect();
    let mut out = expr.clone();
    let mut changed = false;
    for variable in variables {
        if let Some(value) = substitution.get(&variable) {
            changed |= out.replace(variable, value) > 0;
        }
    }
    if changed { out.copy_subtree(0) } else { out }
}

/// Value of the leaf `term` under `substitution`, following chains and polarity.
///
/// `None` when `term` is not a bound variable.
pub fn resolve(substitution: &Substitution, term: Term) -> Option<Expression> {
    if !term.is_variable() {
        return None;
    }
    let mut value = substitution.get(&term.value)?.clone();
    if term.is_negated() {
        value.negate(0);
    }
    while let Some(&root) = value.root() {
        if !root.is_variable() {
            break;
        }
        let Some(next) = substitution.get(&root.value) else {
            break;
        };
        value = next.clone();
        if root.is_negated() {
            value.negate(0);
        }
    }
    Some(value)
}

/// Simultaneously substitute every bound variable of `expr`.
///
/// Expects a substitution as returned by [`unify`], where values mention no bound variable. The
/// result is laid out canonically.
pub fn apply(substitution: &Substitution, expr: &Expression) -> Expression {
    substitute(expr, substitution)
}
