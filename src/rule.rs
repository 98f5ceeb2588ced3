//! Rewrite rules: validated pairs of hypergraphs with matching boundaries.

use crate::graph::{Graph, GraphError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a rule an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleSide {
    Lhs,
    Rhs,
}

impl fmt::Display for RuleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSide::Lhs => write!(f, "LHS"),
            RuleSide::Rhs => write!(f, "RHS"),
        }
    }
}

/// Error raised by rule construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleError {
    /// One side is not a monogamous acyclic hypergraph.
    InvalidSide { side: RuleSide, source: GraphError },
    /// The two sides disagree in boundary arity.
    ArityMismatch { lhs: (usize, usize), rhs: (usize, usize) },
    /// The i-th input vertices carry different value labels.
    InputMismatch { index: usize, lhs_value: String, rhs_value: String },
    /// The i-th output vertices carry different value labels.
    OutputMismatch { index: usize, lhs_value: String, rhs_value: String },
    /// A boundary vertex is repeated, so the rule is not left-linear.
    NotLeftLinear { side: RuleSide },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::InvalidSide { side, source } => {
                write!(f, "invalid {} of rule: {}", side, source)
            }
            RuleError::ArityMismatch { lhs, rhs } => {
                write!(
                    f,
                    "boundary arities must agree: LHS is {} -> {}, RHS is {} -> {}",
                    lhs.0, lhs.1, rhs.0, rhs.1
                )
            }
            RuleError::InputMismatch { index, lhs_value, rhs_value } => {
                write!(
                    f,
                    "input {} has label '{}' on the LHS but '{}' on the RHS",
                    index, lhs_value, rhs_value
                )
            }
            RuleError::OutputMismatch { index, lhs_value, rhs_value } => {
                write!(
                    f,
                    "output {} has label '{}' on the LHS but '{}' on the RHS",
                    index, lhs_value, rhs_value
                )
            }
            RuleError::NotLeftLinear { side } => {
                write!(
                    f,
                    "{} repeats a boundary vertex; only left-linear rules are supported",
                    side
                )
            }
        }
    }
}

impl std::error::Error for RuleError {}

/// A rewrite rule: a pair of hypergraphs sharing a boundary signature.
///
/// Construction validates that both sides are monogamous acyclic graphs,
/// that their boundary arities agree, that corresponding boundary vertices
/// carry equal value labels, and that neither side repeats a boundary
/// vertex. The last condition (left-linearity, required on both sides)
/// guarantees that double-pushout rewriting has a unique result per match
/// and that every rule can be applied in reverse.
#[derive(Debug, Clone)]
pub struct Rule {
    lhs: Graph,
    rhs: Graph,
    name: String,
    arity: (usize, usize),
}

impl Rule {
    /// Creates a validated rule.
    pub fn new(lhs: Graph, rhs: Graph, name: impl Into<String>) -> Result<Rule, RuleError> {
        lhs.validate()
            .map_err(|source| RuleError::InvalidSide { side: RuleSide::Lhs, source })?;
        rhs.validate()
            .map_err(|source| RuleError::InvalidSide { side: RuleSide::Rhs, source })?;
        if lhs.arity() != rhs.arity() {
            return Err(RuleError::ArityMismatch { lhs: lhs.arity(), rhs: rhs.arity() });
        }
        for (index, (&vl, &vr)) in lhs.inputs().iter().zip(rhs.inputs().iter()).enumerate() {
            let (a, b) = (&lhs.vertex_data(vl).value, &rhs.vertex_data(vr).value);
            if a != b {
                return Err(RuleError::InputMismatch {
                    index,
                    lhs_value: a.clone(),
                    rhs_value: b.clone(),
                });
            }
        }
        for (index, (&vl, &vr)) in lhs.outputs().iter().zip(rhs.outputs().iter()).enumerate() {
            let (a, b) = (&lhs.vertex_data(vl).value, &rhs.vertex_data(vr).value);
            if a != b {
                return Err(RuleError::OutputMismatch {
                    index,
                    lhs_value: a.clone(),
                    rhs_value: b.clone(),
                });
            }
        }
        if !boundary_injective(&lhs) {
            return Err(RuleError::NotLeftLinear { side: RuleSide::Lhs });
        }
        if !boundary_injective(&rhs) {
            return Err(RuleError::NotLeftLinear { side: RuleSide::Rhs });
        }
        let arity = lhs.arity();
        Ok(Rule { lhs, rhs, name: name.into(), arity })
    }

    /// The distinguished rule with empty LHS and RHS.
    ///
    /// It matches everywhere (via the empty embedding) and rewriting along
    /// it leaves the graph unchanged up to isomorphism.
    pub fn refl() -> Rule {
        Rule { lhs: Graph::new(), rhs: Graph::new(), name: "refl".into(), arity: (0, 0) }
    }

    /// Left-hand side.
    #[inline]
    pub fn lhs(&self) -> &Graph {
        &self.lhs
    }

    /// Right-hand side.
    #[inline]
    pub fn rhs(&self) -> &Graph {
        &self.rhs
    }

    /// Rule name as given at construction (with a `-` prefix after
    /// [`Rule::converse`]).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Boundary arity shared by both sides.
    #[inline]
    pub fn arity(&self) -> (usize, usize) {
        self.arity
    }

    /// The rule applied in reverse: LHS and RHS swapped, with a `-` toggled
    /// on the name.
    ///
    /// The construction-time checks are symmetric in the two sides, so the
    /// converse of a valid rule is valid.
    pub fn converse(&self) -> Rule {
        let name = match self.name.strip_prefix('-') {
            Some(base) => base.to_string(),
            None => format!("-{}", self.name),
        };
        Rule { lhs: self.rhs.clone(), rhs: self.lhs.clone(), name, arity: self.arity }
    }
}

/// True if no vertex occurs twice across the graph's inputs and outputs.
fn boundary_injective(g: &Graph) -> bool {
    let mut seen = std::collections::HashSet::new();
    g.inputs().iter().chain(g.outputs().iter()).all(|&v| seen.insert(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{self, gen_typed};
    use crate::term::Term;

    fn m() -> Term {
        Term::gen("m", 2, 1)
    }

    #[test]
    fn valid_rule() {
        let lhs = m().par(Term::Id).seq(m()).compile().unwrap();
        let rhs = Term::Id.par(m()).seq(m()).compile().unwrap();
        let r = Rule::new(lhs, rhs, "assoc").unwrap();
        assert_eq!(r.arity(), (3, 1));
        assert_eq!(r.name(), "assoc");
    }

    #[test]
    fn arity_mismatch_rejected() {
        let lhs = m().compile().unwrap();
        let rhs = Term::Id.compile().unwrap();
        assert!(matches!(
            Rule::new(lhs, rhs, "bad"),
            Err(RuleError::ArityMismatch { .. })
        ));
    }

    /// Boundary label disagreement is reported with the index and both
    /// labels.
    #[test]
    fn boundary_label_mismatch_reported() {
        let lhs = gen_typed("f", &["A".into()], &["A".into()]);
        let rhs = gen_typed("g", &["A".into()], &["B".into()]);
        match Rule::new(lhs, rhs, "bad") {
            Err(RuleError::OutputMismatch { index, lhs_value, rhs_value }) => {
                assert_eq!(index, 0);
                assert_eq!(lhs_value, "A");
                assert_eq!(rhs_value, "B");
            }
            other => panic!("expected output mismatch, got {:?}", other),
        }
    }

    /// A repeated boundary vertex (here: an input that is also an output
    /// twice over) is rejected as non-left-linear before anything else can
    /// go wrong downstream.
    #[test]
    fn non_left_linear_rejected() {
        let mut lhs = graph::Graph::new();
        let v = lhs.add_vertex(0.0, 0.0, "");
        lhs.set_inputs(vec![v]);
        lhs.set_outputs(vec![v, v]);
        let mut rhs = graph::Graph::new();
        let w = rhs.add_vertex(0.0, 0.0, "");
        rhs.set_inputs(vec![w]);
        rhs.set_outputs(vec![w, w]);
        let err = Rule::new(lhs, rhs, "frob").unwrap_err();
        // strict monogamy already refuses the repeated boundary
        assert!(matches!(err, RuleError::InvalidSide { side: RuleSide::Lhs, .. }));
    }

    /// A bare wire on the boundary is monogamous but repeats a boundary
    /// vertex (it is both an input and an output), so it is rejected with
    /// the dedicated left-linearity error.
    #[test]
    fn identity_wire_lhs_not_left_linear() {
        let lhs = graph::identity();
        let rhs = graph::identity();
        assert!(matches!(
            Rule::new(lhs, rhs, "idrule"),
            Err(RuleError::NotLeftLinear { side: RuleSide::Lhs })
        ));
    }

    #[test]
    fn converse_swaps_and_renames() {
        let lhs = m().par(Term::Id).seq(m()).compile().unwrap();
        let rhs = Term::Id.par(m()).seq(m()).compile().unwrap();
        let r = Rule::new(lhs, rhs, "assoc").unwrap();
        let c = r.converse();
        assert_eq!(c.name(), "-assoc");
        assert_eq!(c.converse().name(), "assoc");
        assert_eq!(c.lhs().num_edges(), r.rhs().num_edges());
    }

    #[test]
    fn refl_is_empty() {
        let r = Rule::refl();
        assert_eq!(r.arity(), (0, 0));
        assert_eq!(r.lhs().num_vertices(), 0);
        assert_eq!(r.rhs().num_vertices(), 0);
    }
}
