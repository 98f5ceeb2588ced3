//! Hypergraphs with ordered boundaries.
//!
//! The central data structure of the crate: a directed hypergraph whose
//! hyperedges carry an *ordered* list of source vertices and an ordered list
//! of target vertices, together with two ordered boundary lists (inputs and
//! outputs). Such a graph presents a morphism in a symmetric monoidal
//! category as a cospan of hypergraphs.
//!
//! Vertices and edges live in tables keyed by stable integer handles;
//! cross-references are handles rather than pointers, so deletion is local
//! and handles of survivors never move.
//!
//! # Citations
//! - Bonchi, Gadducci, Kissinger, Sobociński, Zanasi, "String diagram
//!   rewrite theory I: rewriting with Frobenius structure" (2020),
//!   arXiv:2012.01847 — the cospan-of-hypergraphs presentation used here.
//! - Berge, "Graphs and Hypergraphs" (1973).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Unique identifier for a vertex within a [`Graph`].
///
/// A transparent `u64` wrapper for cheap comparison and hashing.
///
/// # Invariant
/// - `VertexId`s are unique within a given `Graph` and never reused, even
///   after deletion.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(u64);

impl VertexId {
    /// Creates a new `VertexId` from a raw `u64`.
    ///
    /// Prefer the graph's vertex creation methods; the caller is responsible
    /// for uniqueness when constructing handles directly (e.g. in the graph
    /// loader).
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw `u64` representation.
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Unique identifier for a hyperedge within a [`Graph`].
///
/// Same conventions as [`VertexId`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(u64);

impl EdgeId {
    /// Creates a new `EdgeId` from a raw `u64`.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw `u64` representation.
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Data associated with a single vertex.
///
/// The `value` string acts as a type (or colour) label: composition may only
/// unify vertices carrying equal values, and the matcher only maps a vertex
/// onto one with the same value. Coordinates are purely cosmetic.
///
/// The incidence registries (`in_edges`, `out_edges`, `in_indices`,
/// `out_indices`) are maintained by the owning [`Graph`] and are derived
/// data: they record, respectively, the edges targeting / sourced at this
/// vertex and the positions at which it occurs in the graph inputs /
/// outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexData {
    /// x-coordinate at which to draw the vertex.
    pub x: f64,
    /// y-coordinate at which to draw the vertex.
    pub y: f64,
    /// Type/colour label.
    pub value: String,
    in_edges: HashSet<EdgeId>,
    out_edges: HashSet<EdgeId>,
    in_indices: HashSet<usize>,
    out_indices: HashSet<usize>,
}

impl VertexData {
    fn new(x: f64, y: f64, value: String) -> Self {
        Self {
            x,
            y,
            value,
            in_edges: HashSet::new(),
            out_edges: HashSet::new(),
            in_indices: HashSet::new(),
            out_indices: HashSet::new(),
        }
    }

    /// Edges for which this vertex occurs as a target.
    #[inline]
    pub fn in_edges(&self) -> &HashSet<EdgeId> {
        &self.in_edges
    }

    /// Edges for which this vertex occurs as a source.
    #[inline]
    pub fn out_edges(&self) -> &HashSet<EdgeId> {
        &self.out_edges
    }

    /// Positions at which this vertex occurs in the graph inputs.
    #[inline]
    pub fn in_indices(&self) -> &HashSet<usize> {
        &self.in_indices
    }

    /// Positions at which this vertex occurs in the graph outputs.
    #[inline]
    pub fn out_indices(&self) -> &HashSet<usize> {
        &self.out_indices
    }
}

/// Data associated with a single hyperedge.
///
/// An edge acts from its ordered source list to its ordered target list;
/// arity is determined by the list lengths. A vertex may occur several times
/// in either list. The `hyper` flag only affects drawing (box vs. plain
/// wire) and is ignored by matching and rewriting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    source: Vec<VertexId>,
    target: Vec<VertexId>,
    /// x-coordinate at which to draw the edge.
    pub x: f64,
    /// y-coordinate at which to draw the edge.
    pub y: f64,
    /// Generator label.
    pub value: String,
    /// Draw as a box rather than a wire.
    pub hyper: bool,
}

impl EdgeData {
    fn new(source: Vec<VertexId>, target: Vec<VertexId>, x: f64, y: f64, value: String, hyper: bool) -> Self {
        Self { source, target, x, y, value, hyper }
    }

    /// Ordered source vertex list.
    #[inline]
    pub fn source(&self) -> &[VertexId] {
        &self.source
    }

    /// Ordered target vertex list.
    #[inline]
    pub fn target(&self) -> &[VertexId] {
        &self.target
    }
}

/// Error raised by graph construction and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphError {
    /// Sequential composition was attempted between a codomain and domain
    /// that disagree in length or in vertex labels.
    CompositionMismatch {
        /// Output labels of the first graph.
        codomain: Vec<String>,
        /// Input labels of the second graph.
        domain: Vec<String>,
    },
    /// The given list is not a permutation of `0..n`.
    InvalidPermutation(Vec<usize>),
    /// An edge or boundary list refers to a vertex that is not in the graph.
    DanglingVertex(VertexId),
    /// A vertex does not have exactly one producer and one consumer.
    ///
    /// A producer is an occurrence as an edge target or in the inputs; a
    /// consumer is an occurrence as an edge source or in the outputs.
    MonogamyViolation {
        vertex: VertexId,
        producers: usize,
        consumers: usize,
    },
    /// The edge-precedence relation contains a directed cycle.
    CycleDetected,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::CompositionMismatch { codomain, domain } => {
                write!(
                    f,
                    "codomain [{}] does not match domain [{}]",
                    codomain.join(", "),
                    domain.join(", ")
                )
            }
            GraphError::InvalidPermutation(p) => {
                write!(f, "{:?} is not a permutation", p)
            }
            GraphError::DanglingVertex(v) => {
                write!(f, "reference to vertex {} which is not in the graph", v)
            }
            GraphError::MonogamyViolation { vertex, producers, consumers } => {
                write!(
                    f,
                    "vertex {} has {} producer(s) and {} consumer(s); monogamy requires exactly one of each",
                    vertex, producers, consumers
                )
            }
            GraphError::CycleDetected => write!(f, "graph contains a directed cycle"),
        }
    }
}

impl std::error::Error for GraphError {}

/// A directed hypergraph with ordered boundary lists.
///
/// Vertices and edges are stored in tables keyed by [`VertexId`] and
/// [`EdgeId`]. The `inputs` and `outputs` lists are sequences of vertex
/// handles; repetition is permitted and semantically meaningful. The pair
/// `(|inputs|, |outputs|)` is the arity of the morphism the graph presents.
///
/// # Invariants
/// - Every handle occurring in an edge's source/target list or in the
///   boundary refers to a vertex in the table.
/// - Handles are allocated monotonically and never reused, so surviving
///   handles are stable across deletions.
/// - The monogamous acyclic shape required by the matcher and rewriter is
///   *not* enforced on every mutation (construction passes through
///   intermediate shapes); it is checked on demand by [`Graph::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    vdata: HashMap<VertexId, VertexData>,
    edata: HashMap<EdgeId, EdgeData>,
    inputs: Vec<VertexId>,
    outputs: Vec<VertexId>,
    vindex: u64,
    eindex: u64,
}

impl Graph {
    /// Creates a new, empty graph.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over all vertex handles (unspecified order).
    #[inline]
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vdata.keys().copied()
    }

    /// Returns an iterator over all edge handles (unspecified order).
    #[inline]
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edata.keys().copied()
    }

    /// Returns all vertex handles in ascending order.
    ///
    /// Deterministic traversal order for the matcher and rewriter; the same
    /// graph yields the same sequence across runs.
    pub fn vertices_sorted(&self) -> Vec<VertexId> {
        let mut vs: Vec<VertexId> = self.vdata.keys().copied().collect();
        vs.sort();
        vs
    }

    /// Returns all edge handles in ascending order.
    pub fn edges_sorted(&self) -> Vec<EdgeId> {
        let mut es: Vec<EdgeId> = self.edata.keys().copied().collect();
        es.sort();
        es
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vdata.len()
    }

    /// Returns the number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edata.len()
    }

    /// Checks whether the given vertex handle is present.
    #[inline]
    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.vdata.contains_key(&v)
    }

    /// Checks whether the given edge handle is present.
    #[inline]
    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.edata.contains_key(&e)
    }

    /// Looks up a vertex, returning `None` if the handle is absent.
    #[inline]
    pub fn get_vertex(&self, v: VertexId) -> Option<&VertexData> {
        self.vdata.get(&v)
    }

    /// Looks up an edge, returning `None` if the handle is absent.
    #[inline]
    pub fn get_edge(&self, e: EdgeId) -> Option<&EdgeData> {
        self.edata.get(&e)
    }

    /// Returns the data of vertex `v`.
    ///
    /// # Panics
    /// If `v` is not in the graph. Handles held by callers are expected to
    /// be valid; a stale handle is a programmer error.
    pub fn vertex_data(&self, v: VertexId) -> &VertexData {
        match self.vdata.get(&v) {
            Some(d) => d,
            None => panic!("vertex {} not in graph", v),
        }
    }

    /// Returns the data of edge `e`.
    ///
    /// # Panics
    /// If `e` is not in the graph.
    pub fn edge_data(&self, e: EdgeId) -> &EdgeData {
        match self.edata.get(&e) {
            Some(d) => d,
            None => panic!("edge {} not in graph", e),
        }
    }

    /// Ordered source list of edge `e`.
    ///
    /// # Panics
    /// If `e` is not in the graph.
    #[inline]
    pub fn source(&self, e: EdgeId) -> &[VertexId] {
        self.edge_data(e).source()
    }

    /// Ordered target list of edge `e`.
    ///
    /// # Panics
    /// If `e` is not in the graph.
    #[inline]
    pub fn target(&self, e: EdgeId) -> &[VertexId] {
        self.edge_data(e).target()
    }

    /// Edges for which vertex `v` occurs as a target.
    #[inline]
    pub fn in_edges(&self, v: VertexId) -> &HashSet<EdgeId> {
        self.vertex_data(v).in_edges()
    }

    /// Edges for which vertex `v` occurs as a source.
    #[inline]
    pub fn out_edges(&self, v: VertexId) -> &HashSet<EdgeId> {
        self.vertex_data(v).out_edges()
    }

    /// Adds a new vertex with a fresh handle.
    pub fn add_vertex(&mut self, x: f64, y: f64, value: impl Into<String>) -> VertexId {
        let v = VertexId::new(self.vindex);
        self.vindex += 1;
        self.vdata.insert(v, VertexData::new(x, y, value.into()));
        v
    }

    /// Adds a new vertex under an explicit handle.
    ///
    /// Used by the graph loader, which must preserve the names in the file.
    /// The allocation counter advances past `name` so later fresh handles
    /// do not collide. No check is made that `name` is unused.
    pub fn add_vertex_with_name(&mut self, name: VertexId, x: f64, y: f64, value: impl Into<String>) -> VertexId {
        self.vindex = self.vindex.max(name.as_u64() + 1);
        self.vdata.insert(name, VertexData::new(x, y, value.into()));
        name
    }

    /// Adds a new hyperedge with a fresh handle and records both-sided
    /// incidence with its endpoint vertices.
    ///
    /// # Panics
    /// If a vertex in `source` or `target` is not in the graph.
    pub fn add_edge(
        &mut self,
        source: Vec<VertexId>,
        target: Vec<VertexId>,
        x: f64,
        y: f64,
        value: impl Into<String>,
        hyper: bool,
    ) -> EdgeId {
        let e = EdgeId::new(self.eindex);
        self.eindex += 1;
        self.insert_edge(e, source, target, x, y, value.into(), hyper);
        e
    }

    /// Adds a new hyperedge under an explicit handle (see
    /// [`Graph::add_vertex_with_name`]).
    ///
    /// # Panics
    /// If a vertex in `source` or `target` is not in the graph.
    pub fn add_edge_with_name(
        &mut self,
        name: EdgeId,
        source: Vec<VertexId>,
        target: Vec<VertexId>,
        x: f64,
        y: f64,
        value: impl Into<String>,
        hyper: bool,
    ) -> EdgeId {
        self.eindex = self.eindex.max(name.as_u64() + 1);
        self.insert_edge(name, source, target, x, y, value.into(), hyper);
        name
    }

    fn insert_edge(
        &mut self,
        e: EdgeId,
        source: Vec<VertexId>,
        target: Vec<VertexId>,
        x: f64,
        y: f64,
        value: String,
        hyper: bool,
    ) {
        for &v in &source {
            match self.vdata.get_mut(&v) {
                Some(d) => {
                    d.out_edges.insert(e);
                }
                None => panic!("edge source {} not in graph", v),
            }
        }
        for &v in &target {
            match self.vdata.get_mut(&v) {
                Some(d) => {
                    d.in_edges.insert(e);
                }
                None => panic!("edge target {} not in graph", v),
            }
        }
        self.edata.insert(e, EdgeData::new(source, target, x, y, value, hyper));
    }

    /// Removes a vertex.
    ///
    /// Occurrences of the vertex in the source/target lists of adjacent
    /// edges and in the boundary are removed as well.
    ///
    /// # Panics
    /// If `v` is not in the graph.
    pub fn remove_vertex(&mut self, v: VertexId) {
        let vd = match self.vdata.get(&v) {
            Some(d) => d,
            None => panic!("vertex {} not in graph", v),
        };
        let in_edges: Vec<EdgeId> = vd.in_edges.iter().copied().collect();
        let out_edges: Vec<EdgeId> = vd.out_edges.iter().copied().collect();
        for e in in_edges {
            if let Some(ed) = self.edata.get_mut(&e) {
                ed.target.retain(|&w| w != v);
            }
        }
        for e in out_edges {
            if let Some(ed) = self.edata.get_mut(&e) {
                ed.source.retain(|&w| w != v);
            }
        }
        let inputs: Vec<VertexId> = self.inputs.iter().copied().filter(|&w| w != v).collect();
        self.set_inputs(inputs);
        let outputs: Vec<VertexId> = self.outputs.iter().copied().filter(|&w| w != v).collect();
        self.set_outputs(outputs);
        self.vdata.remove(&v);
    }

    /// Removes an edge and cleans the incidence registries of its endpoint
    /// vertices.
    ///
    /// # Panics
    /// If `e` is not in the graph.
    pub fn remove_edge(&mut self, e: EdgeId) {
        let ed = match self.edata.remove(&e) {
            Some(d) => d,
            None => panic!("edge {} not in graph", e),
        };
        for v in ed.source {
            if let Some(d) = self.vdata.get_mut(&v) {
                d.out_edges.remove(&e);
            }
        }
        for v in ed.target {
            if let Some(d) = self.vdata.get_mut(&v) {
                d.in_edges.remove(&e);
            }
        }
    }

    /// The ordered input list.
    #[inline]
    pub fn inputs(&self) -> &[VertexId] {
        &self.inputs
    }

    /// The ordered output list.
    #[inline]
    pub fn outputs(&self) -> &[VertexId] {
        &self.outputs
    }

    /// The arity of the morphism this graph presents.
    #[inline]
    pub fn arity(&self) -> (usize, usize) {
        (self.inputs.len(), self.outputs.len())
    }

    /// Replaces the input list and re-registers input positions with the
    /// vertex data.
    ///
    /// # Panics
    /// If a vertex in `inputs` is not in the graph.
    pub fn set_inputs(&mut self, inputs: Vec<VertexId>) {
        for d in self.vdata.values_mut() {
            d.in_indices.clear();
        }
        for (i, &v) in inputs.iter().enumerate() {
            match self.vdata.get_mut(&v) {
                Some(d) => {
                    d.in_indices.insert(i);
                }
                None => panic!("input vertex {} not in graph", v),
            }
        }
        self.inputs = inputs;
    }

    /// Replaces the output list (see [`Graph::set_inputs`]).
    ///
    /// # Panics
    /// If a vertex in `outputs` is not in the graph.
    pub fn set_outputs(&mut self, outputs: Vec<VertexId>) {
        for d in self.vdata.values_mut() {
            d.out_indices.clear();
        }
        for (i, &v) in outputs.iter().enumerate() {
            match self.vdata.get_mut(&v) {
                Some(d) => {
                    d.out_indices.insert(i);
                }
                None => panic!("output vertex {} not in graph", v),
            }
        }
        self.outputs = outputs;
    }

    /// Appends to the input list.
    pub fn add_inputs(&mut self, inputs: Vec<VertexId>) {
        let start = self.inputs.len();
        for (i, &v) in inputs.iter().enumerate() {
            match self.vdata.get_mut(&v) {
                Some(d) => {
                    d.in_indices.insert(start + i);
                }
                None => panic!("input vertex {} not in graph", v),
            }
        }
        self.inputs.extend(inputs);
    }

    /// Appends to the output list.
    pub fn add_outputs(&mut self, outputs: Vec<VertexId>) {
        let start = self.outputs.len();
        for (i, &v) in outputs.iter().enumerate() {
            match self.vdata.get_mut(&v) {
                Some(d) => {
                    d.out_indices.insert(start + i);
                }
                None => panic!("output vertex {} not in graph", v),
            }
        }
        self.outputs.extend(outputs);
    }

    /// Whether vertex `v` occurs in the inputs.
    #[inline]
    pub fn is_input(&self, v: VertexId) -> bool {
        !self.vertex_data(v).in_indices.is_empty()
    }

    /// Whether vertex `v` occurs in the outputs.
    #[inline]
    pub fn is_output(&self, v: VertexId) -> bool {
        !self.vertex_data(v).out_indices.is_empty()
    }

    /// Whether vertex `v` lies on the boundary.
    #[inline]
    pub fn is_boundary(&self, v: VertexId) -> bool {
        self.is_input(v) || self.is_output(v)
    }

    /// Value labels of the inputs, in order.
    pub fn domain(&self) -> Vec<String> {
        self.inputs.iter().map(|&v| self.vertex_data(v).value.clone()).collect()
    }

    /// Value labels of the outputs, in order.
    pub fn codomain(&self) -> Vec<String> {
        self.outputs.iter().map(|&v| self.vertex_data(v).value.clone()).collect()
    }

    /// Vertices reachable from `vs` by a non-empty directed path.
    pub fn successors<I: IntoIterator<Item = VertexId>>(&self, vs: I) -> HashSet<VertexId> {
        let mut succ: HashSet<VertexId> = HashSet::new();
        let mut current: Vec<VertexId> = vs.into_iter().collect();
        while let Some(v) = current.pop() {
            for &e in self.vertex_data(v).out_edges.iter() {
                for &w in self.edge_data(e).target.iter() {
                    if succ.insert(w) {
                        current.push(w);
                    }
                }
            }
        }
        succ
    }

    /// Vertices from which `vs` is reachable by a non-empty directed path.
    pub fn predecessors<I: IntoIterator<Item = VertexId>>(&self, vs: I) -> HashSet<VertexId> {
        let mut pred: HashSet<VertexId> = HashSet::new();
        let mut current: Vec<VertexId> = vs.into_iter().collect();
        while let Some(v) = current.pop() {
            for &e in self.vertex_data(v).in_edges.iter() {
                for &w in self.edge_data(e).source.iter() {
                    if pred.insert(w) {
                        current.push(w);
                    }
                }
            }
        }
        pred
    }

    /// Merges vertex `w` into vertex `v`, forming the quotient of the graph
    /// that identifies the two. The surviving vertex is `v`.
    ///
    /// # Panics
    /// If `v` or `w` is not in the graph.
    pub fn merge_vertices(&mut self, v: VertexId, w: VertexId) {
        if v == w {
            return;
        }
        let in_w: Vec<EdgeId> = self.vertex_data(w).in_edges.iter().copied().collect();
        for e in in_w {
            if let Some(ed) = self.edata.get_mut(&e) {
                for t in ed.target.iter_mut() {
                    if *t == w {
                        *t = v;
                    }
                }
            }
            if let Some(d) = self.vdata.get_mut(&v) {
                d.in_edges.insert(e);
            }
        }
        let out_w: Vec<EdgeId> = self.vertex_data(w).out_edges.iter().copied().collect();
        for e in out_w {
            if let Some(ed) = self.edata.get_mut(&e) {
                for s in ed.source.iter_mut() {
                    if *s == w {
                        *s = v;
                    }
                }
            }
            if let Some(d) = self.vdata.get_mut(&v) {
                d.out_edges.insert(e);
            }
        }
        let inputs: Vec<VertexId> = self.inputs.iter().map(|&x| if x == w { v } else { x }).collect();
        self.set_inputs(inputs);
        let outputs: Vec<VertexId> = self.outputs.iter().map(|&x| if x == w { v } else { x }).collect();
        self.set_outputs(outputs);
        // all occurrences of w have been redirected, so this only drops the
        // table entry
        self.remove_vertex(w);
    }

    /// Returns the monoidal product of this graph with `other`.
    ///
    /// The result is the disjoint union, with boundaries concatenated
    /// (`self` first). Copied elements of `other` receive fresh handles.
    /// Coordinates are shifted so the two halves stack in the y-direction.
    pub fn tensor(&self, other: &Graph) -> Graph {
        let mut g = self.clone();

        let max_self = g
            .vdata
            .values()
            .map(|d| d.y)
            .chain(g.edata.values().map(|d| d.y))
            .fold(0.0_f64, f64::max);
        let min_other = other
            .vdata
            .values()
            .map(|d| d.y)
            .chain(other.edata.values().map(|d| d.y))
            .fold(0.0_f64, f64::min);
        for d in g.vdata.values_mut() {
            d.y -= max_self;
        }
        for d in g.edata.values_mut() {
            d.y -= max_self;
        }

        let mut vmap: HashMap<VertexId, VertexId> = HashMap::new();
        for v in other.vertices_sorted() {
            let vd = other.vertex_data(v);
            vmap.insert(v, g.add_vertex(vd.x, vd.y - min_other + 1.0, vd.value.clone()));
        }
        for e in other.edges_sorted() {
            let ed = other.edge_data(e);
            g.add_edge(
                ed.source.iter().map(|v| vmap[v]).collect(),
                ed.target.iter().map(|v| vmap[v]).collect(),
                ed.x,
                ed.y - min_other + 1.0,
                ed.value.clone(),
                ed.hyper,
            );
        }

        g.add_inputs(other.inputs.iter().map(|v| vmap[v]).collect());
        g.add_outputs(other.outputs.iter().map(|v| vmap[v]).collect());
        g
    }

    /// Returns the sequential composition of this graph with `other`
    /// (diagram order: `other` comes after `self`).
    ///
    /// The i-th output of `self` is unified with the i-th input of `other`;
    /// the boundary of the result is `inputs(self)` and `outputs(other)`.
    /// Fails if the two boundaries disagree in length or in vertex labels.
    pub fn compose(&self, other: &Graph) -> Result<Graph, GraphError> {
        let mismatch = || GraphError::CompositionMismatch {
            codomain: self.codomain(),
            domain: other.domain(),
        };
        if self.outputs.len() != other.inputs.len() {
            return Err(mismatch());
        }
        for (&o, &i) in self.outputs.iter().zip(other.inputs.iter()) {
            if self.vertex_data(o).value != other.vertex_data(i).value {
                return Err(mismatch());
            }
        }

        let mut g = self.clone();

        let max_self = g
            .vdata
            .values()
            .map(|d| d.x)
            .chain(g.edata.values().map(|d| d.x))
            .fold(0.0_f64, f64::max);
        let min_other = other
            .vdata
            .values()
            .map(|d| d.x)
            .chain(other.edata.values().map(|d| d.x))
            .fold(0.0_f64, f64::min);
        for d in g.vdata.values_mut() {
            d.x -= max_self;
        }
        for d in g.edata.values_mut() {
            d.x -= max_self;
        }

        let mut vmap: HashMap<VertexId, VertexId> = HashMap::new();
        for v in other.vertices_sorted() {
            let vd = other.vertex_data(v);
            vmap.insert(v, g.add_vertex(vd.x - min_other, vd.y, vd.value.clone()));
        }
        for e in other.edges_sorted() {
            let ed = other.edge_data(e);
            g.add_edge(
                ed.source.iter().map(|v| vmap[v]).collect(),
                ed.target.iter().map(|v| vmap[v]).collect(),
                ed.x - min_other,
                ed.y,
                ed.value.clone(),
                ed.hyper,
            );
        }

        // plug the two graphs together: merge the copied inputs of `other`
        // into the outputs of `self`
        let plug1: Vec<VertexId> = g.outputs.clone();
        let plug2: Vec<VertexId> = other.inputs.iter().map(|v| vmap[v]).collect();
        g.set_outputs(other.outputs.iter().map(|v| vmap[v]).collect());

        // `quotient` tracks which vertices have already been merged away,
        // so that repeated boundary vertices chase to their survivor
        let mut quotient: HashMap<VertexId, VertexId> = HashMap::new();
        for (mut p1, mut p2) in plug1.into_iter().zip(plug2.into_iter()) {
            while let Some(&q) = quotient.get(&p1) {
                p1 = q;
            }
            while let Some(&q) = quotient.get(&p2) {
                p2 = q;
            }
            if p1 != p2 {
                g.merge_vertices(p1, p2);
                quotient.insert(p2, p1);
            }
        }
        Ok(g)
    }

    /// Checks referential integrity, monogamy, and acyclicity.
    ///
    /// Monogamy: every vertex has exactly one producer (an occurrence as an
    /// edge target, or an occurrence in the inputs) and exactly one consumer
    /// (an occurrence as an edge source, or an occurrence in the outputs).
    /// Acyclicity: the relation "some target of e₁ is a source of e₂" has
    /// no directed cycle.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut produced: HashMap<VertexId, usize> = HashMap::new();
        let mut consumed: HashMap<VertexId, usize> = HashMap::new();
        for ed in self.edata.values() {
            for &v in &ed.source {
                if !self.contains_vertex(v) {
                    return Err(GraphError::DanglingVertex(v));
                }
                *consumed.entry(v).or_insert(0) += 1;
            }
            for &v in &ed.target {
                if !self.contains_vertex(v) {
                    return Err(GraphError::DanglingVertex(v));
                }
                *produced.entry(v).or_insert(0) += 1;
            }
        }
        for &v in &self.inputs {
            if !self.contains_vertex(v) {
                return Err(GraphError::DanglingVertex(v));
            }
            *produced.entry(v).or_insert(0) += 1;
        }
        for &v in &self.outputs {
            if !self.contains_vertex(v) {
                return Err(GraphError::DanglingVertex(v));
            }
            *consumed.entry(v).or_insert(0) += 1;
        }
        for v in self.vertices_sorted() {
            let p = produced.get(&v).copied().unwrap_or(0);
            let c = consumed.get(&v).copied().unwrap_or(0);
            if p != 1 || c != 1 {
                return Err(GraphError::MonogamyViolation { vertex: v, producers: p, consumers: c });
            }
        }
        self.check_acyclic()
    }

    /// Kahn's algorithm over the edge-precedence relation.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut indegree: HashMap<EdgeId, usize> = HashMap::new();
        for (&e, ed) in &self.edata {
            let preds: HashSet<EdgeId> = ed
                .source
                .iter()
                .flat_map(|&v| self.vertex_data(v).in_edges.iter().copied())
                .collect();
            indegree.insert(e, preds.len());
        }
        let mut ready: Vec<EdgeId> = indegree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&e, _)| e)
            .collect();
        let mut placed = 0usize;
        while let Some(e) = ready.pop() {
            placed += 1;
            let succs: HashSet<EdgeId> = self
                .edge_data(e)
                .target
                .iter()
                .flat_map(|&v| self.vertex_data(v).out_edges.iter().copied())
                .collect();
            for s in succs {
                if let Some(d) = indegree.get_mut(&s) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push(s);
                    }
                }
            }
        }
        if placed == self.edata.len() {
            Ok(())
        } else {
            Err(GraphError::CycleDetected)
        }
    }
}

/// Returns a graph with a single hyperedge labelled `value`, whose domain
/// and codomain carry the given vertex labels.
pub fn gen_typed(value: &str, domain: &[String], codomain: &[String]) -> Graph {
    let mut g = Graph::new();
    let m = domain.len();
    let n = codomain.len();
    let inputs: Vec<VertexId> = domain
        .iter()
        .enumerate()
        .map(|(i, t)| g.add_vertex(-1.5, i as f64 - (m as f64 - 1.0) / 2.0, t.clone()))
        .collect();
    let outputs: Vec<VertexId> = codomain
        .iter()
        .enumerate()
        .map(|(i, t)| g.add_vertex(1.5, i as f64 - (n as f64 - 1.0) / 2.0, t.clone()))
        .collect();
    g.add_edge(inputs.clone(), outputs.clone(), 0.0, 0.0, value, true);
    g.set_inputs(inputs);
    g.set_outputs(outputs);
    g
}

/// Returns the graph of a generator `value : arity_in → arity_out` with
/// untyped (empty-label) boundary vertices.
pub fn gen(value: &str, arity_in: usize, arity_out: usize) -> Graph {
    gen_typed(value, &vec![String::new(); arity_in], &vec![String::new(); arity_out])
}

/// Returns the permutation graph of `p`.
///
/// `p` is interpreted as the map sending input `p[j]` to output `j`: the
/// graph consists only of vertices, with output `j` the same vertex as
/// input `p[j]`. For generators `a0, a1, a2 : 0 → 1`,
/// `(a0 * a1 * a2) ; perm([2, 0, 1])` equals `a2 * a0 * a1`.
pub fn perm(p: &[usize]) -> Result<Graph, GraphError> {
    let n = p.len();
    let mut seen = vec![false; n];
    for &x in p {
        if x >= n || seen[x] {
            return Err(GraphError::InvalidPermutation(p.to_vec()));
        }
        seen[x] = true;
    }
    let mut g = Graph::new();
    let inputs: Vec<VertexId> = (0..n)
        .map(|i| g.add_vertex(0.0, i as f64 - (n as f64 - 1.0) / 2.0, ""))
        .collect();
    let outputs: Vec<VertexId> = (0..n).map(|j| inputs[p[j]]).collect();
    g.set_inputs(inputs);
    g.set_outputs(outputs);
    Ok(g)
}

/// Returns the identity graph: a single vertex that is both the input and
/// the output.
pub fn identity() -> Graph {
    let mut g = Graph::new();
    let v = g.add_vertex(0.0, 0.0, "");
    g.set_inputs(vec![v]);
    g.set_outputs(vec![v]);
    g
}

/// Returns `n` parallel identity wires.
pub fn identity_n(n: usize) -> Graph {
    let mut g = Graph::new();
    let vs: Vec<VertexId> = (0..n)
        .map(|i| g.add_vertex(0.0, i as f64 - (n as f64 - 1.0) / 2.0, ""))
        .collect();
    g.set_inputs(vs.clone());
    g.set_outputs(vs);
    g
}
