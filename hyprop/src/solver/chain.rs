//! Numbered proof chains replayed from the derivation log.
//!
//! Starting from the proved formula, the chain is rebuilt in two passes:
//! 1. a breadth-first walk back through the premises numbers the axioms it reaches, in the order
//!    it reaches them;
//! 2. a depth-first post-order walk numbers every derived formula after both of its premises.
//!
//! Every `mp(i,j)` step therefore only refers to earlier lines.
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::error::{ProverError, ProverResult};
use crate::solver::log::{Derivation, Rule};

/// One numbered line of a proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofStep {
    /// 1-based line number.
    pub index: usize,
    pub formula: String,
    /// Line numbers of the minor and major premise, `None` for axioms.
    pub premises: Option<(usize, usize)>,
}

impl fmt::Display for ProofStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.premises {
            None => write!(f, "{}. axiom: {}", self.index, self.formula),
            Some((minor, major)) => {
                write!(f, "{}. mp({minor},{major}): {}", self.index, self.formula)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofChain {
    steps: Vec<ProofStep>,
}

impl ProofChain {
    /// Rebuild the chain ending in `proof` from the first-record-wins `derivations` map.
    pub fn build(proof: &str, derivations: &HashMap<String, Derivation>) -> ProverResult<Self> {
        let lookup = |formula: &str| {
            derivations
                .get(formula)
                .ok_or_else(|| ProverError::MissingDerivation {
                    formula: formula.to_owned(),
                })
        };

        let mut order: Vec<&Derivation> = Vec::new();
        let mut numbered: HashMap<&str, usize> = HashMap::new();

        // Axioms, breadth-first.
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([proof]);
        while let Some(formula) = queue.pop_front() {
            if !seen.insert(formula) {
                continue;
            }
            let derivation = lookup(formula)?;
            if derivation.is_axiom() {
                order.push(derivation);
                numbered.insert(derivation.formula.as_str(), order.len());
            } else {
                queue.extend(derivation.parents());
            }
        }

        // Derived formulas, premises first.
        let mut open: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&str, bool)> = vec![(proof, false)];
        while let Some((formula, expanded)) = stack.pop() {
            if numbered.contains_key(formula) {
                continue;
            }
            let derivation = lookup(formula)?;
            if expanded {
                order.push(derivation);
                numbered.insert(derivation.formula.as_str(), order.len());
                continue;
            }
            if !open.insert(formula) {
                // Only reachable through a cyclic log; the dangling premise is reported below.
                continue;
            }
            stack.push((formula, true));
            let parents: Vec<&str> = derivation.parents().collect();
            stack.extend(parents.into_iter().rev().map(|parent| (parent, false)));
        }

        let number = |formula: &str| {
            numbered
                .get(formula)
                .copied()
                .ok_or_else(|| ProverError::MissingDerivation {
                    formula: formula.to_owned(),
                })
        };
        let steps = order
            .iter()
            .enumerate()
            .map(|(position, derivation)| {
                let premises = match &derivation.rule {
                    Rule::Axiom => None,
                    Rule::ModusPonens { minor, major } => {
                        Some((number(minor.as_str())?, number(major.as_str())?))
                    }
                };
                Ok(ProofStep {
                    index: position + 1,
                    formula: derivation.formula.clone(),
                    premises,
                })
            })
            .collect::<ProverResult<Vec<_>>>()?;

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for ProofChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{step}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(records: &[&str]) -> HashMap<String, Derivation> {
        let mut map = HashMap::new();
        for record in records {
            let derivation = Derivation::parse_line(record).unwrap();
            map.entry(derivation.formula.clone()).or_insert(derivation);
        }
        map
    }

    #[test]
    fn axioms_first_then_premises_before_conclusions() {
        let derivations = log(&[
            "A>B axiom",
            "B>C axiom",
            "A axiom",
            "B mp A A>B",
            "C mp B B>C",
        ]);
        let chain = ProofChain::build("C", &derivations).unwrap();
        assert_eq!(
            chain.to_string(),
            "1. axiom: B>C\n2. axiom: A\n3. axiom: A>B\n4. mp(2,3): B\n5. mp(4,1): C\n"
        );
    }

    #[test]
    fn shared_premises_are_numbered_once() {
        let derivations = log(&["a axiom", "a>a axiom", "a mp a a>a"]);
        let chain = ProofChain::build("a", &derivations).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.steps()[0].premises, None);

        let derivations = log(&[
            "p axiom",
            "p>q axiom",
            "q>r axiom",
            "q mp p p>q",
            "r mp q q>r",
            "r>s axiom",
            "s mp r r>s",
        ]);
        let chain = ProofChain::build("s", &derivations).unwrap();
        assert_eq!(chain.len(), 7);
        for step in chain.steps() {
            if let Some((minor, major)) = step.premises {
                assert!(minor < step.index && major < step.index);
            }
        }
    }

    #[test]
    fn premises_reached_at_several_depths_come_first() {
        // q is a premise of t and of r, which sits two levels deeper. Numbering by depth alone
        // would emit r before q.
        let derivations = log(&[
            "p axiom",
            "p>q axiom",
            "q>r axiom",
            "r>(q>t) axiom",
            "q mp p p>q",
            "r mp q q>r",
            "q>t mp r r>(q>t)",
            "t mp q q>t",
        ]);
        let chain = ProofChain::build("t", &derivations).unwrap();
        assert_eq!(
            chain.to_string(),
            "1. axiom: p\n2. axiom: p>q\n3. axiom: r>(q>t)\n4. axiom: q>r\n\
             5. mp(1,2): q\n6. mp(5,4): r\n7. mp(6,3): q>t\n8. mp(5,7): t\n"
        );
    }

    #[test]
    fn missing_records_are_reported() {
        let derivations = log(&["b mp a a>b", "a axiom"]);
        assert!(matches!(
            ProofChain::build("b", &derivations),
            Err(ProverError::MissingDerivation { formula }) if formula == "a>b"
        ));
        assert!(matches!(
            ProofChain::build("z", &derivations),
            Err(ProverError::MissingDerivation { .. })
        ));
    }

    #[test]
    fn rules_are_kept() {
        let derivations = log(&["a axiom"]);
        let chain = ProofChain::build("a", &derivations).unwrap();
        assert_eq!(chain.steps()[0].formula, "a");
        assert!(matches!(derivations["a"].rule, Rule::Axiom));
    }
}
