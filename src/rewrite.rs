//! Double-pushout rewriting.
//!
//! Given a rule and a convex match of its LHS, deletes the matched
//! interior, glues the RHS in along the preserved boundary, and returns the
//! rewritten graph together with the embedding of the RHS into it. The
//! convexity and gluing conditions enforced by the matcher guarantee the
//! pushout complement exists, so for the left-linear rules admitted by
//! [`Rule::new`](crate::rule::Rule::new) this transformation cannot fail.
//!
//! # Citations
//! - Bonchi, Gadducci, Kissinger, Sobociński, Zanasi, arXiv:2012.01847,
//!   Section 3 — DPO rewriting for monogamous acyclic hypergraphs.

use crate::graph::{EdgeId, Graph, VertexId};
use crate::matcher::Match;
use crate::rule::Rule;
use std::collections::HashMap;
use tracing::debug;

/// The result of one pushout step: the rewritten graph together with the
/// embedding of the rule's RHS into it.
///
/// Unlike a [`Match`], a `Rewrite` owns its graph; the embedding maps are
/// plain handle maps from the RHS of the rule that produced it.
#[derive(Debug, Clone)]
pub struct Rewrite {
    /// The rewritten graph.
    pub graph: Graph,
    /// Vertex map from the rule's RHS into `graph`.
    pub rhs_vmap: HashMap<VertexId, VertexId>,
    /// Edge map from the rule's RHS into `graph`.
    pub rhs_emap: HashMap<EdgeId, EdgeId>,
}

/// Performs double-pushout rewriting of `m.cod()` along `rule` at `m`.
///
/// Returns every pushout complement; for the left-linear rules admitted at
/// construction there is exactly one, so the returned vector has a single
/// element.
///
/// # Panics
/// If `m` is not a total match of `rule.lhs()`, which is a programmer
/// error: matches produced by
/// [`match_rule`](crate::matcher::match_rule) are always total.
pub fn dpo(rule: &Rule, m: &Match) -> Vec<Rewrite> {
    let lhs = rule.lhs();
    let rhs = rule.rhs();

    // pushout complement: drop the image of the LHS, keeping the images of
    // its boundary vertices (the gluing vertices)
    let mut h = m.cod().clone();
    for e in lhs.edges_sorted() {
        let img = match m.edge_image(e) {
            Some(img) => img,
            None => panic!("match is not total on edges"),
        };
        h.remove_edge(img);
    }
    for v in lhs.vertices_sorted() {
        if !lhs.is_boundary(v) {
            let img = match m.vertex_image(v) {
                Some(img) => img,
                None => panic!("match is not total on vertices"),
            };
            h.remove_vertex(img);
        }
    }

    // glue the RHS boundary onto the images of the LHS boundary
    let mut rhs_vmap: HashMap<VertexId, VertexId> = HashMap::new();
    for (&vl, &vr) in lhs.inputs().iter().zip(rhs.inputs().iter()) {
        rhs_vmap.insert(vr, m.vertex_image(vl).expect("match is total on vertices"));
    }
    for (&vl, &vr) in lhs.outputs().iter().zip(rhs.outputs().iter()) {
        rhs_vmap.insert(vr, m.vertex_image(vl).expect("match is total on vertices"));
    }

    // fresh copies of the RHS interior
    for v in rhs.vertices_sorted() {
        if !rhs.is_boundary(v) {
            let vd = rhs.vertex_data(v);
            rhs_vmap.insert(v, h.add_vertex(vd.x, vd.y, vd.value.clone()));
        }
    }

    // connect the RHS edges through the combined vertex map
    let mut rhs_emap: HashMap<EdgeId, EdgeId> = HashMap::new();
    for e in rhs.edges_sorted() {
        let ed = rhs.edge_data(e);
        let e1 = h.add_edge(
            ed.source().iter().map(|v| rhs_vmap[v]).collect(),
            ed.target().iter().map(|v| rhs_vmap[v]).collect(),
            ed.x,
            ed.y,
            ed.value.clone(),
            ed.hyper,
        );
        rhs_emap.insert(e, e1);
    }

    debug!("rewriter: applied rule '{}' at {}", rule.name(), m);
    vec![Rewrite { graph: h, rhs_vmap, rhs_emap }]
}

/// Applies the rewrite and returns the first result's graph. Convenience
/// wrapper for [`dpo`] when the RHS embedding is not needed.
///
/// # Panics
/// As [`dpo`].
pub fn rewrite(rule: &Rule, m: &Match) -> Graph {
    match dpo(rule, m).into_iter().next() {
        Some(rw) => rw.graph,
        None => panic!("rewrite has no valid pushout complement"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{find_iso, match_rule};
    use crate::rule::Rule;
    use crate::term::Term;

    fn m2() -> Term {
        Term::gen("m", 2, 1)
    }

    fn assoc() -> Rule {
        let lhs = m2().par(Term::Id).seq(m2()).compile().unwrap();
        let rhs = Term::Id.par(m2()).seq(m2()).compile().unwrap();
        Rule::new(lhs, rhs, "assoc").unwrap()
    }

    /// Rewriting preserves the boundary arity of the host graph.
    #[test]
    fn preserves_arity() {
        let r = assoc();
        let target = m2()
            .par(Term::Id)
            .par(Term::Id)
            .seq(m2().par(Term::Id))
            .seq(m2())
            .compile()
            .unwrap();
        for mt in match_rule(&r, &target) {
            let h = rewrite(&r, &mt);
            assert_eq!(h.arity(), target.arity());
        }
    }

    /// Rewriting preserves monogamy and acyclicity.
    #[test]
    fn preserves_invariants() {
        let r = assoc();
        let target = m2()
            .par(Term::Id)
            .par(Term::Id)
            .seq(m2().par(Term::Id))
            .seq(m2())
            .compile()
            .unwrap();
        for mt in match_rule(&r, &target) {
            let h = rewrite(&r, &mt);
            assert!(h.validate().is_ok());
        }
    }

    /// The returned RHS embedding is a valid match of the RHS into the
    /// rewritten graph.
    #[test]
    fn rhs_embedding_is_consistent() {
        let r = assoc();
        let target = m2()
            .par(Term::Id)
            .par(Term::Id)
            .seq(m2().par(Term::Id))
            .seq(m2())
            .compile()
            .unwrap();
        let mt = match_rule(&r, &target).next().unwrap();
        let rw = dpo(&r, &mt).into_iter().next().unwrap();
        let rhs = r.rhs();
        for e in rhs.edges() {
            let img = rw.rhs_emap[&e];
            assert_eq!(rhs.edge_data(e).value, rw.graph.edge_data(img).value);
            for (&v, &w) in rhs.source(e).iter().zip(rw.graph.source(img).iter()) {
                assert_eq!(rw.rhs_vmap[&v], w);
            }
            for (&v, &w) in rhs.target(e).iter().zip(rw.graph.target(img).iter()) {
                assert_eq!(rw.rhs_vmap[&v], w);
            }
        }
    }

    /// Rewriting along refl leaves the graph isomorphic to itself.
    #[test]
    fn refl_rewrite_is_identity() {
        let refl = Rule::refl();
        let target = m2().par(Term::Id).seq(m2()).compile().unwrap();
        let mt = match_rule(&refl, &target).next().unwrap();
        let h = rewrite(&refl, &mt);
        assert!(find_iso(&h, &target).is_some());
    }

    /// A forward step followed by the converse rule can always rewrite
    /// back to a graph isomorphic to the original.
    #[test]
    fn reverse_rewrite_round_trip() {
        let r = assoc();
        let target = m2()
            .par(Term::Id)
            .par(Term::Id)
            .seq(m2().par(Term::Id))
            .seq(m2())
            .compile()
            .unwrap();
        let mt = match_rule(&r, &target).next().unwrap();
        let h = rewrite(&r, &mt);

        let back = r.converse();
        let recovered = match_rule(&back, &h).any(|m1| {
            let g1 = rewrite(&back, &m1);
            find_iso(&g1, &target).is_some()
        });
        assert!(recovered);
    }
}
