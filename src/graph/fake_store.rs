//! In-memory [`GraphStore`] used by tests in place of a live Memgraph connection
//! (SPEC_FULL.md §8, "fake graph store"). Mirrors the `MERGE`-by-key and
//! detach-delete-by-project semantics of [`super::memgraph_store::MemgraphStore`] over plain
//! `HashMap`s, and answers the small set of graph-traversal shapes the query tools issue by
//! interpreting a `__tool` dispatch tag carried alongside each query's real parameters rather
//! than by parsing Cypher text.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::Result;

use super::model::{EdgeType, NodeLabel, PropValue, Props, Row};
use super::{EdgeBatchRow, GraphStore};

#[derive(Debug, Clone)]
struct EdgeRecord {
    project: String,
    from_label: NodeLabel,
    from_qn: String,
    edge_type: EdgeType,
    to_label: NodeLabel,
    to_qn: String,
    properties: Props,
}

#[derive(Default)]
struct Inner {
    nodes: HashMap<(NodeLabel, String), Props>,
    edges: Vec<EdgeRecord>,
}

#[derive(Default)]
pub struct FakeGraphStore {
    inner: Mutex<Inner>,
}

impl FakeGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_field(label: NodeLabel) -> &'static str {
        if label == NodeLabel::Project { "name" } else { "qualified_name" }
    }

    pub fn node_count(&self) -> usize {
        self.inner.lock().unwrap().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.lock().unwrap().edges.len()
    }

    /// Look up a single node's properties by label and qualified name (test helper).
    pub fn get_node(&self, label: NodeLabel, qualified_name: &str) -> Option<Props> {
        self.inner.lock().unwrap().nodes.get(&(label, qualified_name.to_string())).cloned()
    }
}

#[async_trait]
impl GraphStore for FakeGraphStore {
    async fn ensure_constraints(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_nodes(&self, label: NodeLabel, rows: Vec<Props>) -> Result<()> {
        let key_field = Self::key_field(label);
        let mut inner = self.inner.lock().unwrap();
        for row in rows {
            let Some(PropValue::Str(key)) = row.get(key_field).cloned() else {
                continue;
            };
            let entry = inner.nodes.entry((label, key)).or_default();
            for (k, v) in row {
                entry.insert(k, v);
            }
        }
        Ok(())
    }

    async fn upsert_edges(&self, edge_type: EdgeType, rows: Vec<EdgeBatchRow>) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let mut missing = 0;
        for row in rows {
            let from_present = inner.nodes.contains_key(&(row.from_label, row.from_qn.clone()));
            let to_present = inner.nodes.contains_key(&(row.to_label, row.to_qn.clone()));
            if !from_present || !to_present {
                missing += 1;
                continue;
            }
            if let Some(existing) = inner.edges.iter_mut().find(|e| {
                e.from_label == row.from_label
                    && e.from_qn == row.from_qn
                    && e.edge_type == edge_type
                    && e.to_label == row.to_label
                    && e.to_qn == row.to_qn
            }) {
                for (k, v) in row.properties {
                    existing.properties.insert(k, v);
                }
            } else {
                inner.edges.push(EdgeRecord {
                    project: row.project,
                    from_label: row.from_label,
                    from_qn: row.from_qn,
                    edge_type,
                    to_label: row.to_label,
                    to_qn: row.to_qn,
                    properties: row.properties,
                });
            }
        }
        Ok(missing)
    }

    async fn clean(&self, project: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.nodes.retain(|(label, key), props| {
            let belongs = if *label == NodeLabel::Project {
                key == project
            } else {
                props.get("project").and_then(PropValue::as_str) == Some(project)
            };
            !belongs
        });
        inner.edges.retain(|e| e.project != project);
        Ok(())
    }

    async fn read(&self, _query: &str, params: Props) -> Result<Vec<Row>> {
        let tool = params.get("__tool").and_then(PropValue::as_str).unwrap_or("");
        let inner = self.inner.lock().unwrap();
        Ok(match tool {
            "callers" => traverse_incoming(&inner, &params, EdgeType::Calls),
            "dependencies" => traverse_outgoing(&inner, &params, EdgeType::Imports),
            "call_graph" => traverse_outgoing(&inner, &params, EdgeType::Calls),
            "hierarchy_up" => traverse_outgoing(&inner, &params, EdgeType::Inherits),
            "hierarchy_down" => traverse_incoming(&inner, &params, EdgeType::Inherits),
            "implementations" => traverse_incoming(&inner, &params, EdgeType::Implements),
            "module_exports" => module_exports(&inner, &params),
            "ad_hoc_scan" => ad_hoc_scan(&inner, &params),
            "node_exists" => node_exists(&inner, &params),
            _ => Vec::new(),
        })
    }
}

fn str_param(params: &Props, key: &str) -> String {
    params.get(key).and_then(PropValue::as_str).unwrap_or_default().to_string()
}

fn int_param(params: &Props, key: &str, default: i64) -> i64 {
    match params.get(key) {
        Some(PropValue::Int(n)) => *n,
        _ => default,
    }
}

/// Bounded-depth traversal following outgoing edges of `edge_type` from `qualified_name`,
/// matching the "no global visited dedup" behavior of a real `*1..depth` Cypher pattern —
/// duplicate paths may revisit a node at a different depth; the query layer dedups. Each row
/// also carries the full `path` walked to reach it, mirroring `[n in nodes(p) | n.qualified_name]`
/// in the real Cypher, so callers (namely `hierarchy`) can detect cycles client-side.
fn traverse_outgoing(inner: &Inner, params: &Props, edge_type: EdgeType) -> Vec<Row> {
    let start = str_param(params, "start");
    let max_depth = int_param(params, "max_depth", 5).max(1) as usize;
    let project = str_param(params, "project");

    let mut out = Vec::new();
    let mut frontier: Vec<Vec<String>> = vec![vec![start]];
    for depth in 1..=max_depth {
        let mut next = Vec::new();
        for path in &frontier {
            let qn = path.last().unwrap();
            for edge in &inner.edges {
                if edge.edge_type == edge_type && edge.from_qn == *qn && edge.project == project {
                    let mut next_path = path.clone();
                    next_path.push(edge.to_qn.clone());
                    out.push(row_for_path(inner, edge.to_label, &edge.to_qn, depth as i64, &next_path));
                    next.push(next_path);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    out
}

fn traverse_incoming(inner: &Inner, params: &Props, edge_type: EdgeType) -> Vec<Row> {
    let start = str_param(params, "start");
    let max_depth = int_param(params, "max_depth", 5).max(1) as usize;
    let project = str_param(params, "project");

    let mut out = Vec::new();
    let mut frontier: Vec<Vec<String>> = vec![vec![start]];
    for depth in 1..=max_depth {
        let mut next = Vec::new();
        for path in &frontier {
            let qn = path.last().unwrap();
            for edge in &inner.edges {
                if edge.edge_type == edge_type && edge.to_qn == *qn && edge.project == project {
                    let mut next_path = path.clone();
                    next_path.push(edge.from_qn.clone());
                    out.push(row_for_path(inner, edge.from_label, &edge.from_qn, depth as i64, &next_path));
                    next.push(next_path);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    out
}

fn module_exports(inner: &Inner, params: &Props) -> Vec<Row> {
    let module_qn = str_param(params, "start");
    let project = str_param(params, "project");
    inner
        .edges
        .iter()
        .filter(|e| e.edge_type == EdgeType::Exports && e.from_qn == module_qn && e.project == project)
        .map(|e| row_for(inner, e.to_label, &e.to_qn, 1))
        .collect()
}

/// Any-label lookup by `(project, qualified_name)`, used only to answer "does this node exist"
/// ahead of a traversal — mirrors a plain `MATCH (n {project:.., qualified_name:..}) RETURN n`.
fn node_exists(inner: &Inner, params: &Props) -> Vec<Row> {
    let qn = str_param(params, "start");
    let project = str_param(params, "project");
    inner
        .nodes
        .iter()
        .find(|((_, key), props)| {
            *key == qn && props.get("project").and_then(PropValue::as_str) == Some(project.as_str())
        })
        .map(|((label, key), _)| vec![row_for(inner, *label, key, 0)])
        .unwrap_or_default()
}

fn row_for(inner: &Inner, label: NodeLabel, qualified_name: &str, depth: i64) -> Row {
    let mut row = IndexMap::new();
    row.insert("qualified_name".to_string(), serde_json::Value::String(qualified_name.to_string()));
    row.insert("label".to_string(), serde_json::Value::String(label.as_cypher().to_string()));
    row.insert("depth".to_string(), serde_json::json!(depth));
    if let Some(props) = inner.nodes.get(&(label, qualified_name.to_string())) {
        if let Some(PropValue::Str(name)) = props.get("name") {
            row.insert("name".to_string(), serde_json::Value::String(name.clone()));
        }
    }
    row
}

/// Like [`row_for`] but also carries the full path walked to reach this node, matching
/// `[n in nodes(p) | n.qualified_name]` on the real Cypher side.
fn row_for_path(inner: &Inner, label: NodeLabel, qualified_name: &str, depth: i64, path: &[String]) -> Row {
    let mut row = row_for(inner, label, qualified_name, depth);
    row.insert(
        "path".to_string(),
        serde_json::Value::Array(path.iter().map(|s| serde_json::Value::String(s.clone())).collect()),
    );
    row
}

/// A deliberately small ad-hoc evaluator: single-label node scan, optional `project` filter,
/// honoring `LIMIT`. Sufficient for tests of the guarded ad-hoc tool without a Cypher engine.
fn ad_hoc_scan(inner: &Inner, params: &Props) -> Vec<Row> {
    let label_name = str_param(params, "label");
    let project = params.get("project").and_then(PropValue::as_str);
    let limit = int_param(params, "limit", 100).max(0) as usize;

    inner
        .nodes
        .iter()
        .filter(|((label, _), props)| {
            label.as_cypher() == label_name
                && project.map(|p| props.get("project").and_then(PropValue::as_str) == Some(p)).unwrap_or(true)
        })
        .take(limit)
        .map(|((label, qn), _)| row_for(inner, *label, qn, 0))
        .collect()
}
