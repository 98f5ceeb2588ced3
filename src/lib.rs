//! Monograph: a hypergraph rewriting core for interactive string-diagram
//! proving.
//!
//! Morphisms of a symmetric monoidal category are represented as monogamous
//! acyclic hypergraphs with ordered boundaries (cospans of hypergraphs).
//! This crate provides:
//! - the hypergraph data model with sequential (`;`) and parallel (`*`)
//!   composition, permutations, and generators;
//! - a term compiler from the SMC term algebra to hypergraphs;
//! - convex subgraph matching as a lazy, deterministic enumeration;
//! - double-pushout rewriting along left-linear rules;
//! - a proof checker verifying chains of rewrite steps up to isomorphism;
//! - `.chyp` / `.chyprule` JSON file formats.
//!
//! # Example
//!
//! ```
//! use monograph::prelude::*;
//!
//! // the associativity rule for a binary operation m : 2 → 1
//! let m = Term::gen("m", 2, 1);
//! let lhs = m.clone().par(Term::Id).seq(m.clone()).compile()?;
//! let rhs = Term::Id.par(m.clone()).seq(m.clone()).compile()?;
//! let assoc = Rule::new(lhs, rhs, "assoc")?;
//!
//! // rewrite the left comb of three applications at the first match
//! let g = m.clone().par(Term::Id).par(Term::Id)
//!     .seq(m.clone().par(Term::Id))
//!     .seq(m.clone())
//!     .compile()?;
//! let mt = match_rule(&assoc, &g).next().expect("assoc applies");
//! let h = rewrite(&assoc, &mt);
//! assert_eq!(h.arity(), g.arity());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Citations
//! - Bonchi, Gadducci, Kissinger, Sobociński, Zanasi, "String diagram
//!   rewrite theory" (2020), arXiv:2012.01847.

pub mod checker;
pub mod fingerprint;
pub mod graph;
pub mod io;
pub mod matcher;
pub mod rewrite;
pub mod rule;
pub mod term;

pub use checker::{check_chain, check_step, CheckError, Direction};
pub use fingerprint::{graph_fingerprint, HashValue};
pub use graph::{EdgeId, Graph, GraphError, VertexId};
pub use matcher::{find_iso, iso, match_graph, match_rule, Match, Matches};
pub use rewrite::{dpo, rewrite, Rewrite};
pub use rule::{Rule, RuleError};
pub use term::{compile_term, Term, TermError};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::checker::{check_chain, check_step, CheckError, Direction, StepFailure};
    pub use crate::fingerprint::{graph_fingerprint, wl_refinement, HashValue};
    pub use crate::graph::{
        gen, gen_typed, identity, identity_n, perm, EdgeId, Graph, GraphError, VertexId,
    };
    pub use crate::io::{
        graph_from_json, graph_to_json, load_graph, load_rule, rule_from_json, rule_to_json,
        save_graph, save_rule, IoError,
    };
    pub use crate::matcher::{find_iso, iso, match_graph, match_rule, Match, Matches};
    pub use crate::rewrite::{dpo, rewrite, Rewrite};
    pub use crate::rule::{Rule, RuleError, RuleSide};
    pub use crate::term::{compile_term, Term, TermError};
}
