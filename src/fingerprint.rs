//! Structural fingerprinting via colour (WL) refinement.
//!
//! Computes hashes of a graph that are invariant under renaming of vertex
//! and edge handles, for use as a cheap isomorphism pre-filter and for
//! host-side state dedup. All hashing is SHA-256 with domain separation and
//! length prefixing, so fingerprints are stable across runs and builds.
//!
//! # Citations
//! - Weisfeiler & Lehman, "A reduction of a graph to a canonical form"
//!   (1968) — the refinement scheme.
//! - NIST FIPS 180-4 (2015) — SHA-256.

use crate::graph::{EdgeId, Graph, VertexId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// A 256-bit hash value.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// The all-zero hash.
    #[inline]
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Creates a hash from a raw byte array.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// SHA-256 of `data` under a domain tag, with a 64-bit little-endian
    /// length prefix.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"MGR:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
        Self(hasher.finalize().into())
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HashValue({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Appends `data` to `buf` with a 64-bit little-endian length prefix.
fn push_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(&(data.len() as u64).to_le_bytes());
    buf.extend_from_slice(data);
}

/// Initial vertex colour: value label plus the ordered boundary positions
/// the vertex occupies. Handle-independent by construction.
fn initial_colour(g: &Graph, v: VertexId) -> HashValue {
    let vd = g.vertex_data(v);
    let mut buf = Vec::new();
    push_bytes(&mut buf, vd.value.as_bytes());
    let mut ins: Vec<usize> = vd.in_indices().iter().copied().collect();
    ins.sort_unstable();
    buf.extend_from_slice(&(ins.len() as u64).to_le_bytes());
    for i in ins {
        buf.extend_from_slice(&(i as u64).to_le_bytes());
    }
    let mut outs: Vec<usize> = vd.out_indices().iter().copied().collect();
    outs.sort_unstable();
    buf.extend_from_slice(&(outs.len() as u64).to_le_bytes());
    for i in outs {
        buf.extend_from_slice(&(i as u64).to_le_bytes());
    }
    HashValue::hash_with_domain(b"vertex-init", &buf)
}

/// Edge colour from the label, arities, and the current endpoint colours in
/// source/target order.
fn edge_colour(g: &Graph, e: EdgeId, colours: &HashMap<VertexId, HashValue>) -> HashValue {
    let ed = g.edge_data(e);
    let mut buf = Vec::new();
    push_bytes(&mut buf, ed.value.as_bytes());
    buf.extend_from_slice(&(ed.source().len() as u64).to_le_bytes());
    for v in ed.source() {
        buf.extend_from_slice(colours[v].as_bytes());
    }
    buf.extend_from_slice(&(ed.target().len() as u64).to_le_bytes());
    for v in ed.target() {
        buf.extend_from_slice(colours[v].as_bytes());
    }
    HashValue::hash_with_domain(b"edge", &buf)
}

/// Iterated colour refinement over the vertices of `g`.
///
/// Each round folds the colours of incident edges (with the role and the
/// position at which the vertex occurs in the edge's lists) into every
/// vertex colour. Isomorphic graphs produce equal colour multisets; equal
/// multisets do not imply isomorphism, so this is a pre-filter only.
pub fn wl_refinement(g: &Graph, rounds: usize) -> HashMap<VertexId, HashValue> {
    let mut colours: HashMap<VertexId, HashValue> =
        g.vertices().map(|v| (v, initial_colour(g, v))).collect();

    for _ in 0..rounds {
        let ecol: HashMap<EdgeId, HashValue> =
            g.edges().map(|e| (e, edge_colour(g, e, &colours))).collect();

        let mut next = HashMap::with_capacity(colours.len());
        for v in g.vertices() {
            let vd = g.vertex_data(v);
            let mut sigs: Vec<Vec<u8>> = Vec::new();
            for &e in vd.in_edges() {
                for (pos, &t) in g.target(e).iter().enumerate() {
                    if t == v {
                        let mut sig = ecol[&e].as_bytes().to_vec();
                        sig.push(b'T');
                        sig.extend_from_slice(&(pos as u64).to_le_bytes());
                        sigs.push(sig);
                    }
                }
            }
            for &e in vd.out_edges() {
                for (pos, &s) in g.source(e).iter().enumerate() {
                    if s == v {
                        let mut sig = ecol[&e].as_bytes().to_vec();
                        sig.push(b'S');
                        sig.extend_from_slice(&(pos as u64).to_le_bytes());
                        sigs.push(sig);
                    }
                }
            }
            sigs.sort();
            let mut buf = colours[&v].as_bytes().to_vec();
            buf.extend_from_slice(&(sigs.len() as u64).to_le_bytes());
            for sig in sigs {
                buf.extend_from_slice(&sig);
            }
            next.insert(v, HashValue::hash_with_domain(b"vertex-round", &buf));
        }
        colours = next;
    }
    colours
}

/// Handle-invariant fingerprint of a graph with ordered boundary.
///
/// Folds the refined vertex-colour multiset, the edge-colour multiset, and
/// the ordered boundary colour sequences into a single hash. Isomorphic
/// graphs (ordered-boundary isomorphism) always hash equal.
pub fn graph_fingerprint(g: &Graph) -> HashValue {
    // vertex count rounds suffice for the partition to stabilise
    let colours = wl_refinement(g, g.num_vertices());

    let mut vmultiset: Vec<&HashValue> = colours.values().collect();
    vmultiset.sort();
    let mut emultiset: Vec<HashValue> = g.edges().map(|e| edge_colour(g, e, &colours)).collect();
    emultiset.sort();

    let mut buf = Vec::new();
    buf.extend_from_slice(&(vmultiset.len() as u64).to_le_bytes());
    for c in vmultiset {
        buf.extend_from_slice(c.as_bytes());
    }
    buf.extend_from_slice(&(emultiset.len() as u64).to_le_bytes());
    for c in &emultiset {
        buf.extend_from_slice(c.as_bytes());
    }
    buf.extend_from_slice(&(g.inputs().len() as u64).to_le_bytes());
    for v in g.inputs() {
        buf.extend_from_slice(colours[v].as_bytes());
    }
    buf.extend_from_slice(&(g.outputs().len() as u64).to_le_bytes());
    for v in g.outputs() {
        buf.extend_from_slice(colours[v].as_bytes());
    }
    HashValue::hash_with_domain(b"graph", &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{gen, Graph, VertexId};

    /// Builds `f : 1 → 1 ; g : 1 → 1` with an explicit handle layout.
    fn chain(names: [u64; 3]) -> Graph {
        let mut g = Graph::new();
        let a = g.add_vertex_with_name(VertexId::new(names[0]), 0.0, 0.0, "");
        let b = g.add_vertex_with_name(VertexId::new(names[1]), 1.0, 0.0, "");
        let c = g.add_vertex_with_name(VertexId::new(names[2]), 2.0, 0.0, "");
        g.add_edge(vec![a], vec![b], 0.0, 0.0, "f", true);
        g.add_edge(vec![b], vec![c], 1.0, 0.0, "g", true);
        g.set_inputs(vec![a]);
        g.set_outputs(vec![c]);
        g
    }

    /// Renaming handles does not change the fingerprint.
    #[test]
    fn invariant_under_renaming() {
        assert_eq!(
            graph_fingerprint(&chain([0, 1, 2])),
            graph_fingerprint(&chain([7, 3, 11]))
        );
    }

    #[test]
    fn deterministic_across_calls() {
        let g = gen("f", 2, 1);
        assert_eq!(graph_fingerprint(&g), graph_fingerprint(&g));
    }

    /// Different edge labels produce different fingerprints.
    #[test]
    fn sensitive_to_labels() {
        assert_ne!(graph_fingerprint(&gen("f", 2, 1)), graph_fingerprint(&gen("g", 2, 1)));
    }

    /// The boundary order is part of the fingerprint: f * g and g * f hash
    /// differently even though the graphs are isomorphic when the boundary
    /// order is forgotten.
    #[test]
    fn sensitive_to_boundary_order() {
        let fg = gen("f", 1, 1).tensor(&gen("g", 1, 1));
        let gf = gen("g", 1, 1).tensor(&gen("f", 1, 1));
        assert_ne!(graph_fingerprint(&fg), graph_fingerprint(&gf));
    }

    /// Refinement separates vertices with distinct neighbourhoods.
    #[test]
    fn refinement_separates() {
        let g = chain([0, 1, 2]);
        let colours = wl_refinement(&g, 3);
        assert_ne!(colours[&VertexId::new(0)], colours[&VertexId::new(1)]);
        assert_ne!(colours[&VertexId::new(1)], colours[&VertexId::new(2)]);
    }
}
