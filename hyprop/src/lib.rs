//! Hyprop: a Hilbert-style prover for classical propositional logic.
//!
//! Formulas are binary trees over `!`, `>`, `|`, `*`, `+` and `=` stored in a flat index arena.
//! Proof search saturates a set of axioms under modus ponens, where the premises are matched by
//! syntactic unification rather than equality, so axiom schemas instantiate themselves.
//!
//! Layers
//!  - [`term`] and [`relation`]: node labels and the four links of an arena slot.
//!  - [`expr`]: the arena [`expr::Expression`] with its rewrites and a pretty-printer.
//!  - [`walker`]: visitor-driven and iterator traversals over the arena.
//!  - [`parser`]: text to expression, with positioned errors.
//!  - [`unify`] and [`rules`]: most general unifiers and modus ponens on top of them.
//!  - [`solver`]: deduction-theorem decomposition, bounded saturation and proof replay through a
//!    derivation log.
//!
//! Example
//! ```
//! use hyprop::prelude::*;
//!
//! let target = Solver::prepare_target(parse("a>a").unwrap());
//! let mut solver = Solver::new(axioms::classical(), target, 5_000).unwrap();
//! assert_eq!(solver.solve().unwrap(), ProofStatus::Proved);
//! println!("{}", solver.proof_narrative());
//! solver.close().unwrap();
//! ```

/// Classical axiom schemas.
pub mod axioms;
/// Solver settings and their TOML form.
pub mod config;
/// Crate-level error type.
pub mod error;
/// Arena formulas.
pub mod expr;
/// Formula parser.
pub mod parser;
/// Node links.
pub mod relation;
/// Inference rules.
pub mod rules;
/// Proof search.
pub mod solver;
/// Node labels: kinds, operators and values.
pub mod term;
/// Syntactic unification.
pub mod unify;
/// Traversals over the arena.
pub mod walker;

pub mod prelude {
    //! Convenient re-exports for end users.
    //!
    //! - Formulas, their terms and the pretty-printer
    //! - Parser entry point
    //! - Unification and modus ponens
    //! - Solver, its configuration and errors
    pub use crate::axioms;
    pub use crate::config::SolverConfig;
    pub use crate::error::{ProverError, ProverResult};
    pub use crate::expr::{Expression, pretty::PrettyExpression};
    pub use crate::parser::{ParseError, parse};
    pub use crate::rules::apply_modus_ponens;
    pub use crate::solver::{ProofStatus, Solver, SolverState};
    pub use crate::term::{Operation, Term, TermType, Value};
    pub use crate::unify::{Substitution, UnificationError, unify};

    // Walker ergonomics
    pub use crate::walker::{inorder, preorder, walk};
}
