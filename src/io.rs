//! Graph and rule file I/O.
//!
//! `.chyp` files hold a single graph; `.chyprule` files hold an `lhs`/`rhs`
//! pair. Both are JSON documents with a fixed schema: vertex and edge names
//! are string-encoded non-negative integers, every field is required, and
//! unknown fields are rejected. Loading validates the hypergraph invariants
//! (referential integrity, monogamy, acyclicity) and, for rules, the
//! boundary agreement between the two sides; cosmetic positions round-trip
//! exactly.

use crate::graph::{EdgeId, Graph, GraphError, VertexId};
use crate::rule::{Rule, RuleError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct VertexJson {
    x: f64,
    y: f64,
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct EdgeJson {
    s: Vec<String>,
    t: Vec<String>,
    x: f64,
    y: f64,
    hyper: bool,
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphJson {
    vertices: BTreeMap<String, VertexJson>,
    edges: BTreeMap<String, EdgeJson>,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleJson {
    lhs: GraphJson,
    rhs: GraphJson,
}

/// Error raised while loading or saving graph and rule files.
#[derive(Debug)]
pub enum IoError {
    /// Malformed JSON, a missing field, or an unknown field.
    Json(serde_json::Error),
    /// Underlying file I/O failure.
    Io(std::io::Error),
    /// A vertex or edge name is not a string-encoded non-negative integer.
    InvalidName(String),
    /// An edge or boundary list refers to an undeclared vertex name.
    UndefinedVertex(String),
    /// The loaded graph violates the hypergraph invariants.
    Invariant(GraphError),
    /// The loaded rule violates the boundary agreement conditions.
    Rule(RuleError),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::Json(e) => write!(f, "malformed file: {}", e),
            IoError::Io(e) => write!(f, "io error: {}", e),
            IoError::InvalidName(name) => {
                write!(f, "'{}' is not a valid vertex or edge name", name)
            }
            IoError::UndefinedVertex(name) => {
                write!(f, "reference to undeclared vertex '{}'", name)
            }
            IoError::Invariant(e) => write!(f, "invalid graph: {}", e),
            IoError::Rule(e) => write!(f, "invalid rule: {}", e),
        }
    }
}

impl std::error::Error for IoError {}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        IoError::Json(e)
    }
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Io(e)
    }
}

/// Parses a string-encoded non-negative integer name.
fn parse_name(name: &str) -> Result<u64, IoError> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IoError::InvalidName(name.to_string()));
    }
    name.parse::<u64>().map_err(|_| IoError::InvalidName(name.to_string()))
}

/// Resolves a list of vertex names against the vertices declared so far.
fn resolve_names(names: &[String], g: &Graph) -> Result<Vec<VertexId>, IoError> {
    names
        .iter()
        .map(|name| {
            let v = VertexId::new(parse_name(name)?);
            if !g.contains_vertex(v) {
                return Err(IoError::UndefinedVertex(name.clone()));
            }
            Ok(v)
        })
        .collect()
}

fn graph_from_model(j: &GraphJson) -> Result<Graph, IoError> {
    let mut g = Graph::new();
    for (name, vd) in &j.vertices {
        let v = VertexId::new(parse_name(name)?);
        g.add_vertex_with_name(v, vd.x, vd.y, vd.value.clone());
    }

    for (name, ed) in &j.edges {
        let e = EdgeId::new(parse_name(name)?);
        let s = resolve_names(&ed.s, &g)?;
        let t = resolve_names(&ed.t, &g)?;
        g.add_edge_with_name(e, s, t, ed.x, ed.y, ed.value.clone(), ed.hyper);
    }

    let inputs = resolve_names(&j.inputs, &g)?;
    let outputs = resolve_names(&j.outputs, &g)?;
    g.set_inputs(inputs);
    g.set_outputs(outputs);

    g.validate().map_err(IoError::Invariant)?;
    Ok(g)
}

fn graph_to_model(g: &Graph) -> GraphJson {
    let mut vertices = BTreeMap::new();
    for v in g.vertices_sorted() {
        let vd = g.vertex_data(v);
        vertices.insert(
            v.as_u64().to_string(),
            VertexJson { x: vd.x, y: vd.y, value: vd.value.clone() },
        );
    }
    let mut edges = BTreeMap::new();
    for e in g.edges_sorted() {
        let ed = g.edge_data(e);
        edges.insert(
            e.as_u64().to_string(),
            EdgeJson {
                s: ed.source().iter().map(|v| v.as_u64().to_string()).collect(),
                t: ed.target().iter().map(|v| v.as_u64().to_string()).collect(),
                x: ed.x,
                y: ed.y,
                hyper: ed.hyper,
                value: ed.value.clone(),
            },
        );
    }
    GraphJson {
        vertices,
        edges,
        inputs: g.inputs().iter().map(|v| v.as_u64().to_string()).collect(),
        outputs: g.outputs().iter().map(|v| v.as_u64().to_string()).collect(),
    }
}

/// Parses a graph from a `.chyp` JSON string.
pub fn graph_from_json(s: &str) -> Result<Graph, IoError> {
    let j: GraphJson = serde_json::from_str(s)?;
    graph_from_model(&j)
}

/// Serializes a graph to a `.chyp` JSON string.
pub fn graph_to_json(g: &Graph) -> String {
    serde_json::to_string_pretty(&graph_to_model(g)).expect("graph model serializes")
}

/// Parses a rule from a `.chyprule` JSON string. The rule name is supplied
/// by the caller (it is not part of the format).
pub fn rule_from_json(s: &str, name: &str) -> Result<Rule, IoError> {
    let j: RuleJson = serde_json::from_str(s)?;
    let lhs = graph_from_model(&j.lhs)?;
    let rhs = graph_from_model(&j.rhs)?;
    Rule::new(lhs, rhs, name).map_err(IoError::Rule)
}

/// Serializes a rule to a `.chyprule` JSON string.
pub fn rule_to_json(rule: &Rule) -> String {
    let j = RuleJson { lhs: graph_to_model(rule.lhs()), rhs: graph_to_model(rule.rhs()) };
    serde_json::to_string_pretty(&j).expect("rule model serializes")
}

/// Loads a `.chyp` graph file.
pub fn load_graph(path: impl AsRef<Path>) -> Result<Graph, IoError> {
    let s = fs::read_to_string(path)?;
    graph_from_json(&s)
}

/// Saves a graph as a `.chyp` file.
pub fn save_graph(path: impl AsRef<Path>, g: &Graph) -> Result<(), IoError> {
    fs::write(path, graph_to_json(g))?;
    Ok(())
}

/// Loads a `.chyprule` rule file. The rule is named after the file stem.
pub fn load_rule(path: impl AsRef<Path>) -> Result<Rule, IoError> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let s = fs::read_to_string(path)?;
    rule_from_json(&s, &name)
}

/// Saves a rule as a `.chyprule` file.
pub fn save_rule(path: impl AsRef<Path>, rule: &Rule) -> Result<(), IoError> {
    fs::write(path, rule_to_json(rule))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::VertexId;
    use crate::matcher::find_iso;
    use crate::term::Term;

    const WIRE: &str = r#"{
        "vertices": {
            "0": {"x": 0.0, "y": 0.0, "value": ""},
            "1": {"x": 2.0, "y": 0.5, "value": ""}
        },
        "edges": {
            "0": {"s": ["0"], "t": ["1"], "x": 1.0, "y": 0.0, "hyper": true, "value": "f"}
        },
        "inputs": ["0"],
        "outputs": ["1"]
    }"#;

    #[test]
    fn load_simple_graph() {
        let g = graph_from_json(WIRE).unwrap();
        assert_eq!(g.num_vertices(), 2);
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.arity(), (1, 1));
        assert_eq!(g.vertex_data(VertexId::new(1)).x, 2.0);
        assert_eq!(g.vertex_data(VertexId::new(1)).y, 0.5);
    }

    /// Names and positions survive a round trip exactly.
    #[test]
    fn round_trip() {
        let g = graph_from_json(WIRE).unwrap();
        let g2 = graph_from_json(&graph_to_json(&g)).unwrap();
        assert_eq!(g.vertices_sorted(), g2.vertices_sorted());
        assert_eq!(g.edges_sorted(), g2.edges_sorted());
        assert_eq!(g.inputs(), g2.inputs());
        assert_eq!(g.outputs(), g2.outputs());
        for v in g.vertices_sorted() {
            assert_eq!(g.vertex_data(v).x, g2.vertex_data(v).x);
            assert_eq!(g.vertex_data(v).y, g2.vertex_data(v).y);
        }
        assert!(find_iso(&g, &g2).is_some());
    }

    /// A compiled graph survives serialization up to isomorphism.
    #[test]
    fn compiled_graph_round_trip() {
        let m = Term::gen("m", 2, 1);
        let g = m.clone().par(Term::Id).seq(m).compile().unwrap();
        let g2 = graph_from_json(&graph_to_json(&g)).unwrap();
        assert!(find_iso(&g, &g2).is_some());
    }

    #[test]
    fn unknown_field_rejected() {
        let s = WIRE.replace(r#""inputs""#, r#""colour": "red", "inputs""#);
        assert!(matches!(graph_from_json(&s), Err(IoError::Json(_))));
    }

    #[test]
    fn missing_field_rejected() {
        let s = r#"{"vertices": {}, "edges": {}, "inputs": []}"#;
        assert!(matches!(graph_from_json(s), Err(IoError::Json(_))));
    }

    #[test]
    fn bad_name_rejected() {
        let s = WIRE.replace(r#""0": {"x": 0.0"#, r#""-1": {"x": 0.0"#);
        assert!(matches!(graph_from_json(&s), Err(IoError::InvalidName(_))));
    }

    #[test]
    fn dangling_reference_rejected() {
        let s = WIRE.replace(r#""t": ["1"]"#, r#""t": ["9"]"#);
        assert!(matches!(graph_from_json(&s), Err(IoError::UndefinedVertex(_))));
    }

    /// A file describing a non-monogamous graph is rejected outright.
    #[test]
    fn invariant_violation_rejected() {
        let s = r#"{
            "vertices": {
                "0": {"x": 0.0, "y": 0.0, "value": ""},
                "1": {"x": 1.0, "y": 0.0, "value": ""},
                "2": {"x": 1.0, "y": 1.0, "value": ""}
            },
            "edges": {
                "0": {"s": ["0"], "t": ["1"], "x": 0.0, "y": 0.0, "hyper": true, "value": "f"},
                "1": {"s": ["0"], "t": ["2"], "x": 0.0, "y": 1.0, "hyper": true, "value": "g"}
            },
            "inputs": ["0"],
            "outputs": ["1", "2"]
        }"#;
        assert!(matches!(graph_from_json(s), Err(IoError::Invariant(_))));
    }

    #[test]
    fn rule_round_trip() {
        let m = Term::gen("m", 2, 1);
        let lhs = m.clone().par(Term::Id).seq(m.clone()).compile().unwrap();
        let rhs = Term::Id.par(m.clone()).seq(m).compile().unwrap();
        let r = Rule::new(lhs, rhs, "assoc").unwrap();
        let r2 = rule_from_json(&rule_to_json(&r), "assoc").unwrap();
        assert_eq!(r2.arity(), r.arity());
        assert!(find_iso(r.lhs(), r2.lhs()).is_some());
        assert!(find_iso(r.rhs(), r2.rhs()).is_some());
    }

    /// The rule loader enforces boundary agreement between the sides.
    #[test]
    fn rule_boundary_mismatch_rejected() {
        let lhs: GraphJson = serde_json::from_str(WIRE).unwrap();
        let rhs: GraphJson = serde_json::from_str(
            &WIRE.replace(r#""value": """#, r#""value": "A""#),
        )
        .unwrap();
        let j = serde_json::to_string(&RuleJson { lhs, rhs }).unwrap();
        assert!(matches!(rule_from_json(&j, "bad"), Err(IoError::Rule(_))));
    }
}
