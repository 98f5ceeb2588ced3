//! Terms of a symmetric monoidal signature and their compilation to
//! hypergraphs.
//!
//! A [`Term`] is the tree form of the surface syntax: generators, `id`,
//! `sw[π]`, parallel composition `*`, and sequential composition `;`.
//! [`Term::compile`] folds the tree over the graph primitives; the result is
//! a monogamous acyclic hypergraph whose boundary arity is the type of the
//! term.

use crate::graph::{self, Graph, GraphError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tree representation of a symmetric monoidal term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    /// A single identity wire.
    Id,
    /// A generator box with fixed arities.
    Gen {
        name: String,
        arity_in: usize,
        arity_out: usize,
    },
    /// A permutation of wires; `sw` is `Perm([1, 0])`.
    Perm(Vec<usize>),
    /// Sequential composition, diagram order.
    Seq(Box<Term>, Box<Term>),
    /// Parallel (monoidal) composition.
    Par(Box<Term>, Box<Term>),
}

impl Term {
    /// Creates a generator term.
    pub fn gen(name: impl Into<String>, arity_in: usize, arity_out: usize) -> Self {
        Term::Gen { name: name.into(), arity_in, arity_out }
    }

    /// Creates the binary swap `sw`.
    pub fn sw() -> Self {
        Term::Perm(vec![1, 0])
    }

    /// Creates a general permutation term `sw[π]`.
    pub fn perm(p: Vec<usize>) -> Self {
        Term::Perm(p)
    }

    /// Sequential composition `self ; next`.
    pub fn seq(self, next: Term) -> Self {
        Term::Seq(Box::new(self), Box::new(next))
    }

    /// Parallel composition `self * right`.
    pub fn par(self, right: Term) -> Self {
        Term::Par(Box::new(self), Box::new(right))
    }

    /// Compiles the term to a hypergraph with boundary.
    ///
    /// Sequential composition type-checks at each site; a failure names the
    /// offending subterm.
    pub fn compile(&self) -> Result<Graph, TermError> {
        match self {
            Term::Id => Ok(graph::identity()),
            Term::Gen { name, arity_in, arity_out } => Ok(graph::gen(name, *arity_in, *arity_out)),
            Term::Perm(p) => {
                graph::perm(p).map_err(|_| TermError::BadPermutation { site: self.to_string() })
            }
            Term::Par(a, b) => Ok(a.compile()?.tensor(&b.compile()?)),
            Term::Seq(a, b) => {
                let ga = a.compile()?;
                let gb = b.compile()?;
                ga.compose(&gb)
                    .map_err(|source| TermError::TypeMismatch { site: self.to_string(), source })
            }
        }
    }
}

/// Writes a factor of a parallel composition, parenthesising sequential
/// subterms (`;` binds looser than `*`).
fn fmt_factor(t: &Term, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if matches!(t, Term::Seq(_, _)) {
        write!(f, "({})", t)
    } else {
        write!(f, "{}", t)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Id => write!(f, "id"),
            Term::Gen { name, .. } => write!(f, "{}", name),
            Term::Perm(p) if p[..] == [1, 0] => write!(f, "sw"),
            Term::Perm(p) => {
                let entries: Vec<String> = p.iter().map(|x| x.to_string()).collect();
                write!(f, "sw[{}]", entries.join(", "))
            }
            Term::Seq(a, b) => write!(f, "{} ; {}", a, b),
            Term::Par(a, b) => {
                fmt_factor(a, f)?;
                write!(f, " * ")?;
                fmt_factor(b, f)
            }
        }
    }
}

/// Error raised by term compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TermError {
    /// Sequential composition between incompatible boundaries; `site` is
    /// the rendered offending subterm.
    TypeMismatch { site: String, source: GraphError },
    /// A `sw[π]` whose entries are not a bijection on `0..n`.
    BadPermutation { site: String },
}

impl fmt::Display for TermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermError::TypeMismatch { site, source } => {
                write!(f, "type mismatch in '{}': {}", site, source)
            }
            TermError::BadPermutation { site } => {
                write!(f, "'{}' is not a valid permutation", site)
            }
        }
    }
}

impl std::error::Error for TermError {}

/// Compiles a term to a graph. Free-function form of [`Term::compile`].
pub fn compile_term(term: &Term) -> Result<Graph, TermError> {
    term.compile()
}
