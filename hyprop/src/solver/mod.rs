//! Bounded forward-chaining proof search.
//!
//! Role
//! - Decompose an implicational target with the deduction theorem, seed the axioms, then grow
//!   generations of formulas by modus ponens until a target is reached or the time budget runs
//!   out.
//! - Every accepted formula is appended to a [`DerivationLog`]; once a target is reached the
//!   proof is replayed from that log into a numbered [`ProofChain`].
//!
//! States: `Decomposing -> Seeding -> Searching -> {Found | TimedOut | Exhausted} ->
//! Reconstructing -> {Rendered | Failed}`.
//!
//! Example
//! ```
//! use hyprop::axioms;
//! use hyprop::parser::parse;
//! use hyprop::solver::{ProofStatus, Solver};
//!
//! let target = Solver::prepare_target(parse("a>(b>a)").unwrap());
//! let mut solver = Solver::new(axioms::classical(), target, 10_000).unwrap();
//! assert_eq!(solver.solve().unwrap(), ProofStatus::Proved);
//! assert!(solver.proof_narrative().ends_with("proved: A>(B>A)\n"));
//! solver.close().unwrap();
//! ```
pub mod chain;
pub mod deadline;
pub mod log;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Display;
use std::path::Path;

use ::log::{debug, info};

use crate::axioms;
use crate::config::SolverConfig;
use crate::error::{ProverError, ProverResult};
use crate::expr::Expression;
use crate::rules::apply_modus_ponens;
use crate::term::{Operation, letter};
use crate::unify::unify_disjoint;

use self::chain::ProofChain;
use self::deadline::Deadline;
use self::log::{Derivation, DerivationLog};

/// Fewest axioms a solver accepts.
pub const REQUIRED_AXIOMS: usize = 3;

/// `(minor, major)` indices of the lemmas derived from the classical axioms. Lemma `i` lands at
/// index `3 + i`.
const LEMMA_CHAIN: [(usize, usize); 8] = [
    (0, 0),
    (1, 0),
    (3, 1),
    (4, 1),
    (2, 5),
    (6, 5),
    (7, 8),
    (3, 9),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverState {
    Decomposing,
    Seeding,
    Searching,
    Found,
    TimedOut,
    /// A generation produced nothing new.
    Exhausted,
    Reconstructing,
    Rendered,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofStatus {
    Proved,
    NotFound,
}

/// Whether `candidate` establishes `target`: same size and root operator, and positionally equal
/// once both are normalized, ignoring the variable/constant distinction.
pub fn is_proved_by(target: &Expression, candidate: &Expression) -> bool {
    if candidate.is_empty()
        || target.size() != candidate.size()
        || target.root().map(|t| t.op) != candidate.root().map(|t| t.op)
    {
        return false;
    }
    let mut target = target.clone();
    target.normalize();
    let mut candidate = candidate.clone();
    candidate.normalize();
    target.equals(&candidate, true)
}

pub struct Solver {
    config: SolverConfig,
    axioms: Vec<Expression>,
    produced: Vec<Expression>,
    targets: Vec<Expression>,
    known: HashSet<String>,
    log: DerivationLog,
    narrative: String,
    state: SolverState,
}

impl Solver {
    /// Solver with default settings and the given time budget (`0` selects the default).
    pub fn new(
        axioms: Vec<Expression>,
        target: Expression,
        time_budget_ms: u64,
    ) -> ProverResult<Self> {
        Self::with_config(
            axioms,
            target,
            SolverConfig::default().with_time_budget(time_budget_ms),
        )
    }

    /// Fails with [`ProverError::NotEnoughAxioms`] before touching the file system, or with
    /// [`ProverError::LogUnavailable`] when the derivation log cannot be created.
    pub fn with_config(
        axioms: Vec<Expression>,
        target: Expression,
        config: SolverConfig,
    ) -> ProverResult<Self> {
        if axioms.len() < REQUIRED_AXIOMS {
            return Err(ProverError::NotEnoughAxioms {
                found: axioms.len(),
                required: REQUIRED_AXIOMS,
            });
        }

        let log = match &config.log_path {
            Some(path) => DerivationLog::create(path).map_err(|source| {
                ProverError::LogUnavailable {
                    path: path.clone(),
                    source,
                }
            })?,
            None => DerivationLog::create_temp().map_err(|source| ProverError::LogUnavailable {
                path: std::env::temp_dir(),
                source,
            })?,
        };
        debug!(
            "solver: {} axioms, target {target}, log {}",
            axioms.len(),
            log.path().display()
        );

        Ok(Self {
            config,
            axioms,
            produced: Vec::new(),
            targets: vec![target],
            known: HashSet::new(),
            log,
            narrative: String::new(),
            state: SolverState::Decomposing,
        })
    }

    /// Freeze a user formula into a target: disjunctions rewritten, variables made constant.
    pub fn prepare_target(mut target: Expression) -> Expression {
        target.standardize();
        target.make_constant();
        target
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Current axiom list. After a search, the formulas promoted during it.
    pub fn axioms(&self) -> &[Expression] {
        &self.axioms
    }

    /// The original target followed by every sub-goal of the decomposition.
    pub fn targets(&self) -> &[Expression] {
        &self.targets
    }

    pub fn log_path(&self) -> &Path {
        self.log.path()
    }

    pub fn proof_narrative(&self) -> &str {
        &self.narrative
    }

    fn transition(&mut self, state: SolverState) {
        debug!("solver: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn say(&mut self, line: impl Display) {
        self.narrative.push_str(&line.to_string());
        self.narrative.push('\n');
    }

    /// Log the classical axioms and the lemmas derived from them, so proofs through the seeded
    /// contraposition lemma can be replayed.
    pub fn write_initial_axioms(&mut self) -> ProverResult<()> {
        let mut lemmas = axioms::classical();
        for axiom in &lemmas {
            self.log.record_axiom(axiom)?;
        }

        for (minor, major) in LEMMA_CHAIN {
            let lemma = apply_modus_ponens(&lemmas[minor], &lemmas[major]);
            if !lemma.is_empty() {
                self.log
                    .record_modus_ponens(&lemma, &lemmas[minor], &lemmas[major])?;
            }
            lemmas.push(lemma);
        }
        debug!(
            "solver: {} initial lemmas logged",
            lemmas[REQUIRED_AXIOMS..]
                .iter()
                .filter(|lemma| !lemma.is_empty())
                .count()
        );
        Ok(())
    }

    /// Run the search and render the narrative.
    ///
    /// Calling it again after completion returns the previous outcome.
    pub fn solve(&mut self) -> ProverResult<ProofStatus> {
        match self.state {
            SolverState::Rendered => return Ok(ProofStatus::Proved),
            SolverState::Failed => return Ok(ProofStatus::NotFound),
            _ => {}
        }

        self.narrative.clear();
        self.decompose();
        self.seed()?;
        self.search()?;
        self.reconstruct()
    }

    fn decompose(&mut self) {
        self.transition(SolverState::Decomposing);
        while let Some(current) = self.targets.last() {
            if !current.is_rooted_at(Operation::Implication) {
                break;
            }
            let antecedent = current.copy_subtree(current.left(0));
            let consequent = current.copy_subtree(current.right(0));
            let line = format!(
                "deduction theorem: Γ ⊢ {current} <=> Γ U {{{antecedent}}} ⊢ {consequent}"
            );
            self.say(line);
            self.axioms.push(antecedent);
            self.targets.push(consequent);
        }
    }

    fn seed(&mut self) -> ProverResult<()> {
        self.transition(SolverState::Seeding);
        for axiom in &mut self.axioms {
            axiom.normalize();
            self.log.record_axiom(axiom)?;
            self.produced.push(axiom.clone());
        }
        if self.config.seed_contraposition {
            let lemma = axioms::contraposition();
            self.log.record_axiom(&lemma)?;
            self.produced.push(lemma);
        }
        self.axioms.clear();
        self.known.clear();
        Ok(())
    }

    fn search(&mut self) -> ProverResult<()> {
        self.transition(SolverState::Searching);
        let deadline = Deadline::after_millis(self.config.effective_time_budget_ms());

        let mut generation = 0usize;
        let outcome = loop {
            if deadline.expired() {
                info!("deadline reached after {generation} generations");
                break SolverState::TimedOut;
            }
            if self.produced.is_empty() {
                info!("search exhausted after {generation} generations");
                break SolverState::Exhausted;
            }

            generation += 1;
            if self.produce(&deadline)? {
                info!("target reached in generation {generation}");
                break SolverState::Found;
            }
            debug!(
                "generation {generation}: {} axioms, {} new candidates, {} records",
                self.axioms.len(),
                self.produced.len(),
                self.log.record_count()
            );
        };
        self.transition(outcome);
        Ok(())
    }

    /// Promote the current generation one candidate at a time and combine each with every
    /// axiom. Returns `true` as soon as a target is reached.
    fn produce(&mut self, deadline: &Deadline) -> ProverResult<bool> {
        let max = self.config.max_formula_size;
        let candidates = std::mem::take(&mut self.produced);
        let mut next = Vec::with_capacity(candidates.len() * 2);

        for mut candidate in candidates {
            if deadline.expired() {
                break;
            }
            if candidate.size() > max {
                continue;
            }

            candidate.normalize();
            self.axioms.push(candidate);
            let newest = self.axioms.len() - 1;
            if self.proves_target(&self.axioms[newest]) {
                return Ok(true);
            }

            for j in 0..=newest {
                let forward = apply_modus_ponens(&self.axioms[j], &self.axioms[newest]);
                if self.accept(forward, j, newest, &mut next)? {
                    return Ok(true);
                }
                if j == newest {
                    break;
                }
                let reverse = apply_modus_ponens(&self.axioms[newest], &self.axioms[j]);
                if self.accept(reverse, newest, j, &mut next)? {
                    return Ok(true);
                }
            }
        }

        // Shortest first.
        next.sort_by_key(Expression::size);
        self.produced = next;
        Ok(false)
    }

    fn is_good(&self, derived: &Expression) -> bool {
        !derived.is_empty()
            && derived.size() <= self.config.max_formula_size
            && !derived.is_rooted_at(Operation::Conjunction)
            && derived.operations(Operation::Conjunction) <= 1
    }

    /// Keep a new derivation: dedup, log it and report whether it reaches a target.
    fn accept(
        &mut self,
        derived: Expression,
        minor: usize,
        major: usize,
        next: &mut Vec<Expression>,
    ) -> ProverResult<bool> {
        if !self.is_good(&derived) || self.known.contains(derived.string()) {
            return Ok(false);
        }
        self.known.insert(derived.string().to_owned());
        self.log
            .record_modus_ponens(&derived, &self.axioms[minor], &self.axioms[major])?;

        let proves = self.proves_target(&derived);
        if proves {
            self.axioms.push(derived.clone());
        }
        next.push(derived);
        Ok(proves)
    }

    fn proves_target(&self, candidate: &Expression) -> bool {
        self.targets
            .iter()
            .any(|target| is_proved_by(target, candidate))
    }

    fn reconstruct(&mut self) -> ProverResult<ProofStatus> {
        self.transition(SolverState::Reconstructing);

        let found = self.axioms.iter().find_map(|axiom| {
            self.targets
                .iter()
                .find(|target| is_proved_by(target, axiom))
                .map(|target| (axiom.clone(), target.clone()))
        });
        let Some((proof, proved_target)) = found else {
            self.say("No proof was found in the time allotted");
            self.transition(SolverState::Failed);
            return Ok(ProofStatus::NotFound);
        };

        let chain = match self.replay(&proof) {
            Ok(chain) => chain,
            Err(err) => {
                self.transition(SolverState::Failed);
                return Err(err);
            }
        };
        info!("proof of {proved_target} in {} steps", chain.len());
        self.narrative.push_str(&chain.to_string());

        self.explain_instantiation(&proof, &proved_target);
        let original = self.targets[0].to_string();
        self.say(format!("proved: {original}"));
        self.transition(SolverState::Rendered);
        Ok(ProofStatus::Proved)
    }

    fn replay(&mut self, proof: &Expression) -> ProverResult<ProofChain> {
        let derivations: HashMap<String, Derivation> = self.log.load()?;
        ProofChain::build(proof.string(), &derivations)
    }

    /// When the proof is a schema of the target, list how its variables are instantiated.
    fn explain_instantiation(&mut self, proof: &Expression, target: &Expression) {
        let mut shifted = proof.clone();
        shifted.change_variables(target.max_value() + 1);
        let Ok(substitution) = unify_disjoint(target, &shifted) else {
            return;
        };

        let variables: BTreeSet<_> = shifted.variables().into_iter().collect();
        let bindings: Vec<_> = variables
            .into_iter()
            .filter_map(|variable| substitution.get(&variable).map(|value| (variable, value)))
            .collect();
        if bindings.is_empty() {
            return;
        }

        let mut lines = vec![format!("change variables: {shifted}")];
        lines.extend(
            bindings
                .iter()
                .map(|(variable, value)| format!("{} \u{2192} {value}", letter(*variable, true))),
        );
        for line in lines {
            self.say(line);
        }
    }

    /// Release the derivation log. Temporary logs are deleted.
    pub fn close(self) -> ProverResult<()> {
        self.log.close().map_err(ProverError::LogIo)
    }
}
