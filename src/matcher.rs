//! Convex subgraph matching.
//!
//! Enumerates embeddings of one hypergraph into another as a lazy,
//! deterministic sequence of [`Match`] objects. An embedding must preserve
//! labels and incidence, be injective away from the boundary of the domain,
//! preserve the degrees of interior vertices (the gluing condition for
//! monogamous graphs), and have a convex image: a directed path between two
//! image edges may never leave the image. Together these conditions make
//! double-pushout rewriting along the match well-defined.
//!
//! The enumeration is a backtracking search over partial matches held on an
//! explicit stack, so consumers can stop after the first acceptable match
//! and pay only for what they consume, or drop the iterator at any point.
//!
//! # Citations
//! - Bonchi, Gadducci, Kissinger, Sobociński, Zanasi, arXiv:2012.01847,
//!   Section 4 — convex matches and the gluing conditions.

use crate::fingerprint::graph_fingerprint;
use crate::graph::{EdgeId, Graph, VertexId};
use crate::rule::Rule;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, trace};

/// An embedding (possibly partial, during search) of `dom` into `cod`.
///
/// Holds borrowing references to both graphs; the graphs must outlive the
/// match and must not be mutated while it is alive.
#[derive(Debug, Clone)]
pub struct Match<'a> {
    dom: &'a Graph,
    cod: &'a Graph,
    vmap: HashMap<VertexId, VertexId>,
    vimg: HashSet<VertexId>,
    emap: HashMap<EdgeId, EdgeId>,
    eimg: HashSet<EdgeId>,
}

impl<'a> Match<'a> {
    /// Creates the empty partial match from `dom` into `cod`.
    pub fn new(dom: &'a Graph, cod: &'a Graph) -> Self {
        Match {
            dom,
            cod,
            vmap: HashMap::new(),
            vimg: HashSet::new(),
            emap: HashMap::new(),
            eimg: HashSet::new(),
        }
    }

    /// The domain graph.
    #[inline]
    pub fn dom(&self) -> &'a Graph {
        self.dom
    }

    /// The codomain graph.
    #[inline]
    pub fn cod(&self) -> &'a Graph {
        self.cod
    }

    /// The vertex map.
    #[inline]
    pub fn vmap(&self) -> &HashMap<VertexId, VertexId> {
        &self.vmap
    }

    /// The edge map.
    #[inline]
    pub fn emap(&self) -> &HashMap<EdgeId, EdgeId> {
        &self.emap
    }

    /// Image of a domain vertex, if mapped.
    #[inline]
    pub fn vertex_image(&self, v: VertexId) -> Option<VertexId> {
        self.vmap.get(&v).copied()
    }

    /// Image of a domain edge, if mapped.
    #[inline]
    pub fn edge_image(&self, e: EdgeId) -> Option<EdgeId> {
        self.emap.get(&e).copied()
    }

    /// Tries to extend the match with `v ↦ cod_v`. Returns `false` (leaving
    /// the match in a dead state the caller discards) if the extension
    /// cannot be part of a well-formed embedding.
    fn try_add_vertex(&mut self, v: VertexId, cod_v: VertexId) -> bool {
        trace!("trying to add vertex {} -> {}", v, cod_v);
        let (dom, cod) = (self.dom, self.cod);

        if dom.vertex_data(v).value != cod.vertex_data(cod_v).value {
            trace!("vertex failed: value mismatch");
            return false;
        }
        if cod.is_boundary(cod_v) && !dom.is_boundary(v) {
            trace!("vertex failed: cod vertex is a boundary but dom vertex is not");
            return false;
        }

        // matches may be non-injective only on the boundary of the domain
        if self.vimg.contains(&cod_v) {
            if !dom.is_boundary(v) {
                trace!("vertex failed: non-injective on interior vertex");
                return false;
            }
            for (&dv, &cv) in &self.vmap {
                if cv == cod_v && !dom.is_boundary(dv) {
                    trace!("vertex failed: non-injective on interior vertex");
                    return false;
                }
            }
        }
        self.vmap.insert(v, cod_v);
        self.vimg.insert(cod_v);

        // unless v is a boundary vertex, equal degrees on both sides ensure
        // the gluing condition: no edge outside the image may touch the
        // image of an interior vertex
        if !dom.is_boundary(v) {
            if dom.in_edges(v).len() != cod.in_edges(cod_v).len() {
                trace!("vertex failed: in-degree prevents gluing");
                return false;
            }
            if dom.out_edges(v).len() != cod.out_edges(cod_v).len() {
                trace!("vertex failed: out-degree prevents gluing");
                return false;
            }
        }
        true
    }

    /// Tries to extend the match with `e ↦ cod_e`, forcing the vertex
    /// mappings the edge's source/target lists imply.
    fn try_add_edge(&mut self, e: EdgeId, cod_e: EdgeId) -> bool {
        trace!("trying to add edge {} -> {}", e, cod_e);
        let (dom, cod) = (self.dom, self.cod);

        if dom.edge_data(e).value != cod.edge_data(cod_e).value {
            trace!("edge failed: value mismatch");
            return false;
        }
        // edge maps are always injective
        if self.eimg.contains(&cod_e) {
            trace!("edge failed: non-injective");
            return false;
        }
        self.emap.insert(e, cod_e);
        self.eimg.insert(cod_e);

        let s = dom.source(e);
        let cod_s = cod.source(cod_e);
        let t = dom.target(e);
        let cod_t = cod.target(cod_e);
        if s.len() != cod_s.len() || t.len() != cod_t.len() {
            trace!("edge failed: arity mismatch");
            return false;
        }

        // each endpoint either agrees with the map so far or extends it
        for (&v, &cod_v) in s.iter().chain(t.iter()).zip(cod_s.iter().chain(cod_t.iter())) {
            if let Some(&mapped) = self.vmap.get(&v) {
                if mapped != cod_v {
                    trace!("edge failed: inconsistent with previously mapped vertex");
                    return false;
                }
            } else if !self.try_add_vertex(v, cod_v) {
                return false;
            }
        }
        true
    }

    /// True if every edge incident to `v` is in the domain of the edge map.
    fn dom_nhd_mapped(&self, v: VertexId) -> bool {
        self.dom.in_edges(v).iter().all(|e| self.emap.contains_key(e))
            && self.dom.out_edges(v).iter().all(|e| self.emap.contains_key(e))
    }

    /// Returns the one-step extensions of this partial match.
    ///
    /// Completes the edge neighbourhood of an already-mapped vertex first;
    /// once every mapped vertex has a fully mapped neighbourhood, seeds the
    /// next unmapped vertex. All candidate loops run in ascending handle
    /// order, which fixes the enumeration order of [`Matches`].
    fn more(&self) -> Vec<Match<'a>> {
        let (dom, cod) = (self.dom, self.cod);

        let mut mapped: Vec<VertexId> = self.vmap.keys().copied().collect();
        mapped.sort();
        for v in mapped {
            if self.dom_nhd_mapped(v) {
                continue;
            }
            let cod_v = self.vmap[&v];

            let mut in_edges: Vec<EdgeId> = dom.in_edges(v).iter().copied().collect();
            in_edges.sort();
            for e in in_edges {
                if self.emap.contains_key(&e) {
                    continue;
                }
                let mut candidates: Vec<EdgeId> = cod.in_edges(cod_v).iter().copied().collect();
                candidates.sort();
                let mut ms = Vec::new();
                for cod_e in candidates {
                    let mut m1 = self.clone();
                    if m1.try_add_edge(e, cod_e) {
                        ms.push(m1);
                    }
                }
                return ms;
            }

            let mut out_edges: Vec<EdgeId> = dom.out_edges(v).iter().copied().collect();
            out_edges.sort();
            for e in out_edges {
                if self.emap.contains_key(&e) {
                    continue;
                }
                let mut candidates: Vec<EdgeId> = cod.out_edges(cod_v).iter().copied().collect();
                candidates.sort();
                let mut ms = Vec::new();
                for cod_e in candidates {
                    let mut m1 = self.clone();
                    if m1.try_add_edge(e, cod_e) {
                        ms.push(m1);
                    }
                }
                return ms;
            }
        }

        for v in dom.vertices_sorted() {
            if self.vmap.contains_key(&v) {
                continue;
            }
            let mut ms = Vec::new();
            for cod_v in cod.vertices_sorted() {
                let mut m1 = self.clone();
                if m1.try_add_vertex(v, cod_v) {
                    ms.push(m1);
                }
            }
            return ms;
        }

        Vec::new()
    }

    /// True if every vertex and edge of the domain is mapped.
    pub fn is_total(&self) -> bool {
        self.vmap.len() == self.dom.num_vertices() && self.emap.len() == self.dom.num_edges()
    }

    /// True if every vertex and edge of the codomain is hit.
    pub fn is_surjective(&self) -> bool {
        self.vimg.len() == self.cod.num_vertices() && self.eimg.len() == self.cod.num_edges()
    }

    /// True if the vertex map is injective (edge maps always are).
    pub fn is_injective(&self) -> bool {
        self.vmap.len() == self.vimg.len()
    }

    /// Convexity of the image of a total match.
    ///
    /// Interior image vertices have all their edges inside the image (by
    /// the degree checks), so a directed path can only leave the image
    /// through the image of a domain output. Walking forward from those
    /// vertices along edges *outside* the image must never reach a source
    /// vertex of an image edge; otherwise some path leaves the image and
    /// re-enters it.
    pub fn is_convex(&self) -> bool {
        let (dom, cod) = (self.dom, self.cod);

        let mut entry: HashSet<VertexId> = HashSet::new();
        for &cod_e in self.emap.values() {
            entry.extend(cod.source(cod_e).iter().copied());
        }

        let mut stack: Vec<VertexId> = dom.outputs().iter().map(|v| self.vmap[v]).collect();
        let mut seen: HashSet<VertexId> = HashSet::new();
        while let Some(v) = stack.pop() {
            for &e in cod.out_edges(v) {
                if self.eimg.contains(&e) {
                    continue;
                }
                for &w in cod.target(e) {
                    if entry.contains(&w) {
                        trace!("match is not convex: path re-enters the image at {}", w);
                        return false;
                    }
                    if seen.insert(w) {
                        stack.push(w);
                    }
                }
            }
        }
        true
    }

    /// True if the ordered boundaries map index-wise onto each other.
    pub fn respects_boundary_order(&self) -> bool {
        self.dom.inputs().len() == self.cod.inputs().len()
            && self.dom.outputs().len() == self.cod.outputs().len()
            && self
                .dom
                .inputs()
                .iter()
                .zip(self.cod.inputs().iter())
                .all(|(&v, &w)| self.vmap.get(&v) == Some(&w))
            && self
                .dom
                .outputs()
                .iter()
                .zip(self.cod.outputs().iter())
                .all(|(&v, &w)| self.vmap.get(&v) == Some(&w))
    }
}

impl fmt::Display for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut vs: Vec<(VertexId, VertexId)> = self.vmap.iter().map(|(&a, &b)| (a, b)).collect();
        vs.sort();
        let mut es: Vec<(EdgeId, EdgeId)> = self.emap.iter().map(|(&a, &b)| (a, b)).collect();
        es.sort();
        write!(f, "vmap: {{")?;
        for (i, (a, b)) in vs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} -> {}", a, b)?;
        }
        write!(f, "}}, emap: {{")?;
        for (i, (a, b)) in es.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} -> {}", a, b)?;
        }
        write!(f, "}}")
    }
}

/// Lazy enumeration of all total convex matches of one graph into another.
///
/// Matches are produced in a deterministic order (ascending candidate
/// handles explored first). The iterator owns only its stack of partial
/// matches; dropping it at any point discards the search state.
#[derive(Debug, Clone)]
pub struct Matches<'a> {
    stack: Vec<Match<'a>>,
}

impl<'a> Matches<'a> {
    /// Starts a fresh enumeration.
    pub fn new(dom: &'a Graph, cod: &'a Graph) -> Self {
        Matches { stack: vec![Match::new(dom, cod)] }
    }
}

impl<'a> Iterator for Matches<'a> {
    type Item = Match<'a>;

    fn next(&mut self) -> Option<Match<'a>> {
        while let Some(m) = self.stack.pop() {
            if m.is_total() {
                if m.is_convex() {
                    debug!("matcher: found match {}", m);
                    return Some(m);
                }
                trace!("matcher: dropped non-convex total match");
                continue;
            }
            // reversed so the lowest-handle candidate is popped first
            self.stack.extend(m.more().into_iter().rev());
        }
        None
    }
}

/// Enumerates matches of `dom` into `cod`.
pub fn match_graph<'a>(dom: &'a Graph, cod: &'a Graph) -> Matches<'a> {
    Matches::new(dom, cod)
}

/// Enumerates matches of the rule's LHS into `g`.
pub fn match_rule<'a>(rule: &'a Rule, g: &'a Graph) -> Matches<'a> {
    Matches::new(rule.lhs(), g)
}

/// Finds an isomorphism of hypergraphs with ordered boundary, if one
/// exists.
///
/// An isomorphism is a total match that is injective, surjective, and maps
/// the i-th input (resp. output) of `g` to the i-th input (resp. output)
/// of `h`. Count, arity, and fingerprint pre-checks reject most
/// non-isomorphic pairs before any search runs.
pub fn find_iso<'a>(g: &'a Graph, h: &'a Graph) -> Option<Match<'a>> {
    if g.num_vertices() != h.num_vertices()
        || g.num_edges() != h.num_edges()
        || g.arity() != h.arity()
    {
        return None;
    }
    if graph_fingerprint(g) != graph_fingerprint(h) {
        return None;
    }
    match_graph(g, h)
        .find(|m| m.is_injective() && m.is_surjective() && m.respects_boundary_order())
}

/// True if the two graphs are isomorphic as hypergraphs with ordered
/// boundary.
pub fn iso(g: &Graph, h: &Graph) -> bool {
    find_iso(g, h).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{gen, identity_n};
    use crate::rule::Rule;
    use crate::term::Term;

    fn m() -> Term {
        Term::gen("m", 2, 1)
    }

    /// A generator matches itself exactly once.
    #[test]
    fn generator_matches_itself() {
        let g = gen("f", 2, 1);
        let ms: Vec<Match> = match_graph(&g, &g).collect();
        assert_eq!(ms.len(), 1);
        assert!(ms[0].is_injective() && ms[0].is_surjective());
    }

    /// Matches preserve labels: a differently-labelled edge never matches.
    #[test]
    fn label_mismatch_no_match() {
        let f = gen("f", 1, 1);
        let g = gen("g", 1, 1);
        assert_eq!(match_graph(&f, &g).count(), 0);
    }

    /// The associativity LHS embeds twice into the three-fold composite.
    #[test]
    fn assoc_lhs_two_matches() {
        let lhs = m().par(Term::Id).seq(m()).compile().unwrap();
        let target = m()
            .par(Term::Id)
            .par(Term::Id)
            .seq(m().par(Term::Id))
            .seq(m())
            .compile()
            .unwrap();
        let ms: Vec<Match> = match_graph(&lhs, &target).collect();
        assert_eq!(ms.len(), 2);
        for m in &ms {
            assert!(m.is_total());
            assert!(m.is_convex());
        }
    }

    /// Matcher soundness on a produced match: labels, incidence, interior
    /// injectivity, and degree preservation.
    #[test]
    fn match_soundness() {
        let lhs = m().par(Term::Id).seq(m()).compile().unwrap();
        let target = m()
            .par(Term::Id)
            .par(Term::Id)
            .seq(m().par(Term::Id))
            .seq(m())
            .compile()
            .unwrap();
        for mt in match_graph(&lhs, &target) {
            for e in lhs.edges() {
                let img = mt.edge_image(e).unwrap();
                assert_eq!(lhs.edge_data(e).value, target.edge_data(img).value);
                for (&v, &w) in lhs.source(e).iter().zip(target.source(img).iter()) {
                    assert_eq!(mt.vertex_image(v), Some(w));
                }
                for (&v, &w) in lhs.target(e).iter().zip(target.target(img).iter()) {
                    assert_eq!(mt.vertex_image(v), Some(w));
                }
            }
            for v in lhs.vertices() {
                if !lhs.is_boundary(v) {
                    let img = mt.vertex_image(v).unwrap();
                    assert_eq!(lhs.in_edges(v).len(), target.in_edges(img).len());
                    assert_eq!(lhs.out_edges(v).len(), target.out_edges(img).len());
                }
            }
        }
    }

    /// Two parallel wires admit the straight and crossed embeddings into
    /// themselves, plus the two boundary-gluing maps that send both wires
    /// onto one (non-injectivity is permitted on the boundary).
    #[test]
    fn parallel_wires_embeddings() {
        let g = identity_n(2);
        let ms: Vec<Match> = match_graph(&g, &g).collect();
        assert_eq!(ms.len(), 4);
        assert_eq!(ms.iter().filter(|m| m.is_injective()).count(), 2);
    }

    /// Non-convex candidates are skipped: matching two parallel boxes onto
    /// the two ends of a chain would capture a path through the middle
    /// edge, so only matches avoiding that configuration survive. Here
    /// every candidate is non-convex and the enumeration is empty.
    #[test]
    fn convexity_rejection() {
        let lhs = Term::gen("f", 1, 1).par(Term::gen("f", 1, 1)).compile().unwrap();
        let target = Term::gen("f", 1, 1)
            .seq(Term::gen("h", 1, 1))
            .seq(Term::gen("f", 1, 1))
            .compile()
            .unwrap();
        assert_eq!(match_graph(&lhs, &target).count(), 0);
    }

    /// The empty LHS of refl matches exactly once in any graph.
    #[test]
    fn refl_matches_once() {
        let refl = Rule::refl();
        let target = m().compile().unwrap();
        let ms: Vec<Match> = match_rule(&refl, &target).collect();
        assert_eq!(ms.len(), 1);
        assert!(ms[0].vmap().is_empty() && ms[0].emap().is_empty());
    }

    /// Enumeration is deterministic: two runs yield the same sequence.
    #[test]
    fn deterministic_enumeration() {
        let lhs = m().par(Term::Id).seq(m()).compile().unwrap();
        let target = m()
            .par(Term::Id)
            .par(Term::Id)
            .seq(m().par(Term::Id))
            .seq(m())
            .compile()
            .unwrap();
        let first: Vec<Vec<(EdgeId, EdgeId)>> = match_graph(&lhs, &target)
            .map(|m| {
                let mut v: Vec<(EdgeId, EdgeId)> = m.emap().iter().map(|(&a, &b)| (a, b)).collect();
                v.sort();
                v
            })
            .collect();
        let second: Vec<Vec<(EdgeId, EdgeId)>> = match_graph(&lhs, &target)
            .map(|m| {
                let mut v: Vec<(EdgeId, EdgeId)> = m.emap().iter().map(|(&a, &b)| (a, b)).collect();
                v.sort();
                v
            })
            .collect();
        assert_eq!(first, second);
    }

    /// `sw ; sw` and `id * id` compile to isomorphic graphs.
    #[test]
    fn swap_involution_iso() {
        let a = Term::sw().seq(Term::sw()).compile().unwrap();
        let b = Term::Id.par(Term::Id).compile().unwrap();
        assert!(find_iso(&a, &b).is_some());
    }

    /// Iso respects the boundary order: f * g is not isomorphic to g * f
    /// as a morphism, although the underlying graphs are.
    #[test]
    fn iso_respects_boundary_order() {
        let fg = gen("f", 1, 1).tensor(&gen("g", 1, 1));
        let gf = gen("g", 1, 1).tensor(&gen("f", 1, 1));
        assert!(find_iso(&fg, &gf).is_none());
        assert!(find_iso(&fg, &fg).is_some());
    }

    /// Compiling the same term twice gives isomorphic graphs.
    #[test]
    fn compile_iso_stable() {
        let t = m().par(Term::Id).seq(m());
        let a = t.compile().unwrap();
        let b = t.compile().unwrap();
        let iso = find_iso(&a, &b).unwrap();
        assert!(iso.respects_boundary_order());
    }
}
