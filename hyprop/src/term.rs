//! Node labels of a formula tree.
//!
//! A [`Term`] is the value stored at one node of an [`Expression`](crate::expr::Expression):
//! leaves are variables or constants identified by their numeric [`Value`], inner nodes are
//! functions carrying the binary connective of that node. Leaves additionally carry their own
//! polarity in [`Term::op`]: [`Operation::Negation`] for `!x`, [`Operation::Nop`] otherwise.
use std::fmt;

use strum::{EnumCount, EnumIter, FromRepr, IntoStaticStr};

/// Numeric identifier of a variable or constant. Letters start at `1` (`a`).
pub type Value = i32;

/// Kind of a tree node.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, IntoStaticStr,
)]
pub enum TermType {
    /// Placeholder, never produced by valid construction.
    #[default]
    None,
    /// Frozen leaf: unification may never substitute it.
    Constant,
    /// Free leaf.
    Variable,
    /// Inner node with exactly two children.
    Function,
}

/// Connectives, plus the `Nop`/`Negation` polarity markers used on leaves.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    EnumCount,
    FromRepr,
    IntoStaticStr,
)]
#[repr(u8)]
pub enum Operation {
    #[default]
    Nop,
    Negation,
    Implication,
    Disjunction,
    Conjunction,
    Xor,
    Equivalent,
}

impl Operation {
    /// Operator used when the node is logically negated.
    ///
    /// The table is deliberately not an involution: `Disjunction` maps to `Conjunction`, which
    /// maps back to `Implication`. [`Expression::negate`](crate::expr::Expression::negate) and
    /// [`Expression::standardize`](crate::expr::Expression::standardize) depend on it.
    pub const fn opposite(self) -> Self {
        match self {
            Operation::Nop => Operation::Nop,
            Operation::Negation => Operation::Negation,
            Operation::Implication => Operation::Conjunction,
            Operation::Disjunction => Operation::Conjunction,
            Operation::Conjunction => Operation::Implication,
            Operation::Xor => Operation::Equivalent,
            Operation::Equivalent => Operation::Xor,
        }
    }

    /// Surface syntax of the operator (empty for `Nop`).
    pub const fn symbol(self) -> &'static str {
        match self {
            Operation::Nop => "",
            Operation::Negation => "!",
            Operation::Implication => ">",
            Operation::Disjunction => "|",
            Operation::Conjunction => "*",
            Operation::Xor => "+",
            Operation::Equivalent => "=",
        }
    }

    /// Inverse of [`Operation::symbol`] for the single-character operators.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '!' => Some(Operation::Negation),
            '>' => Some(Operation::Implication),
            '|' => Some(Operation::Disjunction),
            '*' => Some(Operation::Conjunction),
            '+' => Some(Operation::Xor),
            '=' => Some(Operation::Equivalent),
            _ => None,
        }
    }

    /// Whether the operator is a binary connective.
    pub const fn is_binary(self) -> bool {
        !matches!(self, Operation::Nop | Operation::Negation)
    }

    pub const fn is_commutative(self) -> bool {
        self.is_binary() && !matches!(self, Operation::Implication)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Label of a single tree node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Term {
    pub kind: TermType,
    pub op: Operation,
    pub value: Value,
}

impl Term {
    pub const fn new(kind: TermType, op: Operation, value: Value) -> Self {
        Self { kind, op, value }
    }

    /// Positive variable leaf.
    pub const fn variable(value: Value) -> Self {
        Self::new(TermType::Variable, Operation::Nop, value)
    }

    /// Positive constant leaf.
    pub const fn constant(value: Value) -> Self {
        Self::new(TermType::Constant, Operation::Nop, value)
    }

    /// Inner node for a binary connective.
    pub const fn function(op: Operation) -> Self {
        Self::new(TermType::Function, op, 0)
    }

    pub const fn is_leaf(&self) -> bool {
        matches!(self.kind, TermType::Variable | TermType::Constant)
    }

    pub const fn is_variable(&self) -> bool {
        matches!(self.kind, TermType::Variable)
    }

    pub const fn is_function(&self) -> bool {
        matches!(self.kind, TermType::Function)
    }

    /// Polarity flag of a leaf.
    pub const fn is_negated(&self) -> bool {
        matches!(self.op, Operation::Negation)
    }

    /// Flip the polarity of a leaf.
    pub fn toggle_negation(&mut self) {
        self.op = match self.op {
            Operation::Negation => Operation::Nop,
            _ => Operation::Negation,
        };
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TermType::None => f.write_str("?"),
            TermType::Function => f.write_str(self.op.symbol()),
            TermType::Variable | TermType::Constant => {
                if self.is_negated() {
                    f.write_str(Operation::Negation.symbol())?;
                }
                write_letter(f, self.value, self.kind == TermType::Constant)
            }
        }
    }
}

/// Letter for a leaf value: `a`..`z` for `1..=26`, then `a1`..`z1`, `a2`, ...
///
/// Only the absolute value is used. `0` has no letter and renders as `_`.
pub fn letter(value: Value, uppercase: bool) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    let _ = write_letter(&mut out, value, uppercase);
    out
}

fn write_letter(out: &mut impl fmt::Write, value: Value, uppercase: bool) -> fmt::Result {
    let id = value.unsigned_abs();
    if id == 0 {
        return out.write_char('_');
    }

    let base = if uppercase { b'A' } else { b'a' };
    let index = id - 1;
    out.write_char((base + (index % 26) as u8) as char)?;
    match index / 26 {
        0 => Ok(()),
        cycle => write!(out, "{cycle}"),
    }
}
