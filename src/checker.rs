//! Proof-chain verification.
//!
//! A proof obligation is a chain of terms `T₀, …, Tₙ` where each step
//! `Tᵢ₋₁ → Tᵢ` is justified by a rule and a direction. The checker compiles
//! every term, enumerates matches of the (possibly reversed) rule in the
//! previous graph, rewrites, and accepts the step on the first rewrite that
//! is isomorphic to the claimed next graph.

use crate::graph::Graph;
use crate::matcher::{find_iso, match_rule};
use crate::rewrite::dpo;
use crate::rule::Rule;
use crate::term::{Term, TermError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which way a rule is applied in a proof step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Why a single step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepFailure {
    /// The rule's LHS does not embed in the graph at all.
    NoMatch,
    /// The rule applies, but no application equals the claimed next graph.
    NotEquivalent,
}

/// Checks a single proof step: does some application of `rule` to `g`
/// produce a graph isomorphic to `claimed`?
///
/// The rule is applied as given; callers wanting the reverse direction pass
/// [`Rule::converse`].
pub fn check_step(g: &Graph, rule: &Rule, claimed: &Graph) -> Result<(), StepFailure> {
    let mut matched = false;
    for m in match_rule(rule, g) {
        matched = true;
        for rw in dpo(rule, &m) {
            if find_iso(&rw.graph, claimed).is_some() {
                return Ok(());
            }
        }
    }
    Err(if matched { StepFailure::NotEquivalent } else { StepFailure::NoMatch })
}

/// Error raised by chain verification. Step indices are 1-based: step `i`
/// is the transition from term `i - 1` to term `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CheckError {
    /// The chain needs exactly one justification per transition.
    ChainShape { terms: usize, justifications: usize },
    /// A term failed to compile.
    Compile { index: usize, source: TermError },
    /// The rule did not apply at this step.
    NoMatch { step: usize, rule: String },
    /// The rule applied, but no rewrite equals the claimed next term.
    NotEquivalent { step: usize, rule: String },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::ChainShape { terms, justifications } => {
                write!(
                    f,
                    "a chain of {} term(s) needs {} justification(s), got {}",
                    terms,
                    terms.saturating_sub(1),
                    justifications
                )
            }
            CheckError::Compile { index, source } => {
                write!(f, "term {} does not compile: {}", index, source)
            }
            CheckError::NoMatch { step, rule } => {
                write!(f, "step {}: rule '{}' does not apply here", step, rule)
            }
            CheckError::NotEquivalent { step, rule } => {
                write!(
                    f,
                    "step {}: no application of rule '{}' equals the claimed term",
                    step, rule
                )
            }
        }
    }
}

impl std::error::Error for CheckError {}

/// Verifies a chain of terms against its justifications.
///
/// `justifications[i]` justifies the transition from `terms[i]` to
/// `terms[i + 1]`; the chain must carry exactly one justification per
/// transition.
pub fn check_chain(terms: &[Term], justifications: &[(Rule, Direction)]) -> Result<(), CheckError> {
    if terms.is_empty() || terms.len() != justifications.len() + 1 {
        return Err(CheckError::ChainShape {
            terms: terms.len(),
            justifications: justifications.len(),
        });
    }

    let mut graphs: Vec<Graph> = Vec::with_capacity(terms.len());
    for (index, t) in terms.iter().enumerate() {
        let g = t.compile().map_err(|source| CheckError::Compile { index, source })?;
        graphs.push(g);
    }

    for (i, (rule, direction)) in justifications.iter().enumerate() {
        let applied = match direction {
            Direction::Forward => rule.clone(),
            Direction::Reverse => rule.converse(),
        };
        let step = i + 1;
        match check_step(&graphs[i], &applied, &graphs[i + 1]) {
            Ok(()) => {
                debug!("checker: step {} verified by rule '{}'", step, applied.name());
            }
            Err(StepFailure::NoMatch) => {
                return Err(CheckError::NoMatch { step, rule: applied.name().to_string() });
            }
            Err(StepFailure::NotEquivalent) => {
                return Err(CheckError::NotEquivalent { step, rule: applied.name().to_string() });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    fn m() -> Term {
        Term::gen("m", 2, 1)
    }

    fn assoc() -> Rule {
        let lhs = m().par(Term::Id).seq(m()).compile().unwrap();
        let rhs = Term::Id.par(m()).seq(m()).compile().unwrap();
        Rule::new(lhs, rhs, "assoc").unwrap()
    }

    /// The left-comb of four inputs reassociates step by step into the
    /// right-comb.
    #[test]
    fn assoc_walk() {
        let terms = vec![
            m().par(Term::Id).par(Term::Id).seq(m().par(Term::Id)).seq(m()),
            Term::Id.par(m()).par(Term::Id).seq(m().par(Term::Id)).seq(m()),
            Term::Id.par(m()).par(Term::Id).seq(Term::Id.par(m())).seq(m()),
            Term::Id.par(Term::Id).par(m()).seq(Term::Id.par(m())).seq(m()),
        ];
        let justifications = vec![
            (assoc(), Direction::Forward),
            (assoc(), Direction::Forward),
            (assoc(), Direction::Forward),
        ];
        check_chain(&terms, &justifications).unwrap();
    }

    /// Reversing a verified step verifies with the reversed rule.
    #[test]
    fn reverse_step() {
        let t0 = m().par(Term::Id).par(Term::Id).seq(m().par(Term::Id)).seq(m());
        let t1 = Term::Id.par(m()).par(Term::Id).seq(m().par(Term::Id)).seq(m());
        check_chain(
            &[t1, t0],
            &[(assoc(), Direction::Reverse)],
        )
        .unwrap();
    }

    /// Skipping an intermediate step is rejected: the rule matches but no
    /// single application reaches the claimed term.
    #[test]
    fn skipped_step_rejected() {
        let t0 = m().par(Term::Id).par(Term::Id).seq(m().par(Term::Id)).seq(m());
        let t3 = Term::Id.par(Term::Id).par(m()).seq(Term::Id.par(m())).seq(m());
        let err = check_chain(&[t0, t3], &[(assoc(), Direction::Forward)]).unwrap_err();
        assert_eq!(
            err,
            CheckError::NotEquivalent { step: 1, rule: "assoc".into() }
        );
    }

    /// A rule whose LHS does not occur reports a missing match with the
    /// step index and rule name.
    #[test]
    fn inapplicable_rule_reported() {
        let k = Term::gen("k", 1, 1);
        let lhs = k.clone().compile().unwrap();
        let rhs = k.clone().compile().unwrap();
        let r = Rule::new(lhs, rhs, "krule").unwrap();
        let t0 = m();
        let t1 = m();
        let err = check_chain(&[t0, t1], &[(r, Direction::Forward)]).unwrap_err();
        assert_eq!(err, CheckError::NoMatch { step: 1, rule: "krule".into() });
    }

    /// A compile failure names the offending term.
    #[test]
    fn compile_failure_reported() {
        let bad = m().seq(m());
        let err = check_chain(&[bad, m()], &[(assoc(), Direction::Forward)]).unwrap_err();
        assert!(matches!(err, CheckError::Compile { index: 0, .. }));
    }

    /// A refl step accepts any reassociation of the same diagram.
    #[test]
    fn refl_step() {
        let t0 = m().par(Term::Id).seq(m());
        let t1 = m().par(Term::Id).seq(m());
        check_chain(&[t0, t1], &[(Rule::refl(), Direction::Forward)]).unwrap();
    }
}
