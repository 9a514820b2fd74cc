//! The closed set of graph query tools (spec.md §4.5): `callers`, `hierarchy`, `dependencies`,
//! `implementations`, `module_exports`, `call_graph`, and the guarded `ad_hoc` escape hatch.
//!
//! Every tool issues one or more parameterized Cypher statements through
//! [`crate::graph::writer::GraphWriter::read`] and applies dedup/ordering/truncation itself
//! (`truncate_rows`) rather than trusting `LIMIT` alone — the single enforcement point chosen
//! in SPEC_FULL.md's Design Notes over DESIGN.md's open question 1. Each Cypher statement also
//! carries a `__tool` parameter that has no meaning to a real Cypher engine (it is simply an
//! unused bound parameter there) but lets `FakeGraphStore` dispatch to the matching in-memory
//! traversal in tests without parsing Cypher text.

pub mod ad_hoc;
pub mod call_graph;
pub mod callers;
pub mod dependencies;
pub mod hierarchy;
pub mod implementations;
pub mod module_exports;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::graph::model::{PropValue, Props, Row};
use crate::graph::writer::GraphWriter;

/// Prebuilt tools default to showing at most 100 rows; the ad-hoc tool to 50 (spec.md §4.5).
pub const DEFAULT_TRUNCATION: usize = 100;
pub const AD_HOC_TRUNCATION: usize = 50;

/// One traversal hit: the shape every prebuilt tool but `module_exports`/`ad_hoc` returns.
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    pub qualified_name: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub depth: i64,
    /// The full chain of qualified names from the query's `qn` to this hit. Only populated by
    /// tools that project a `path` column and asked for it (`callers`'s `include_paths`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

impl Hit {
    fn from_row(row: &Row) -> Option<Self> {
        let qualified_name = row.get("qualified_name")?.as_str()?.to_string();
        let label = row.get("label")?.as_str()?.to_string();
        let name = row.get("name").and_then(|v| v.as_str()).map(str::to_string);
        let depth = row.get("depth").and_then(|v| v.as_i64()).unwrap_or(0);
        let path = path_of(row);
        Some(Self { qualified_name, label, name, depth, path })
    }
}

/// The envelope-adjacent shape every tool wraps its rows in: what's shown, how much there was,
/// and whether it was cut off (spec.md §4.5 "Truncation").
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult<T: Serialize> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub shown_count: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Dedup rows by `qualified_name` keeping the smallest depth, order by `(depth asc,
/// qualified_name asc)`, then truncate to `limit` (spec.md §4.5 "Tie-breaks and ordering" /
/// "Truncation"). This is the one place every graph-shaped tool enforces both rules.
pub fn truncate_rows(rows: Vec<Row>, limit: usize) -> QueryResult<Hit> {
    let mut best: IndexMap<String, Hit> = IndexMap::new();
    for row in &rows {
        let Some(hit) = Hit::from_row(row) else { continue };
        best.entry(hit.qualified_name.clone())
            .and_modify(|existing| {
                if hit.depth < existing.depth {
                    *existing = hit.clone();
                }
            })
            .or_insert(hit);
    }

    let mut items: Vec<Hit> = best.into_values().collect();
    items.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.qualified_name.cmp(&b.qualified_name)));

    let total_count = items.len();
    let truncated = total_count > limit;
    items.truncate(limit);
    let shown_count = items.len();

    let hint = truncated.then(|| {
        format!("showing {shown_count}/{total_count}; narrow the query or lower max_depth for a tighter result")
    });

    QueryResult { items, total_count, shown_count, truncated, hint, warnings: Vec::new() }
}

/// Find every distinct cycle traced by a batch of `nodes(p)`-style paths (spec.md §8 scenario 3,
/// "the `hierarchy` tool reports cycles explicitly"): a path that revisits a qualified name
/// before its end names a cycle running from the first occurrence to the revisit. Returns each
/// distinct cycle once, rendered `A→B→A`.
pub(crate) fn detect_cycles(paths: &[Vec<String>]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut warnings = Vec::new();
    for path in paths {
        for (i, node) in path.iter().enumerate() {
            if let Some(first) = path[..i].iter().position(|n| n == node) {
                let cycle = &path[first..=i];
                let key = cycle.join("\u{2192}");
                if seen.insert(key.clone()) {
                    warnings.push(format!("cycle: {key}"));
                }
                break;
            }
        }
    }
    warnings
}

/// Pull the `path` column (a list of qualified names along the traversed path) out of a raw row,
/// if the Cypher statement projected one.
pub(crate) fn path_of(row: &Row) -> Option<Vec<String>> {
    let arr = row.get("path")?.as_array()?;
    arr.iter().map(|v| v.as_str().map(str::to_string)).collect()
}

/// Fail fast with `NODE_NOT_FOUND` when a tool's target qualified name isn't in the graph at
/// all, rather than letting an empty traversal silently look like "found it, zero results"
/// (spec.md §8 scenario 5, "Unknown node").
pub(crate) async fn assert_node_exists(writer: &GraphWriter, project: &str, qn: &str) -> Result<()> {
    let cypher = "MATCH (n {project: $project, qualified_name: $start}) \
                  RETURN n.qualified_name AS qualified_name LIMIT 1";
    let mut params = Props::new();
    params.insert("__tool".to_string(), PropValue::Str("node_exists".to_string()));
    params.insert("project".to_string(), PropValue::Str(project.to_string()));
    params.insert("start".to_string(), PropValue::Str(qn.to_string()));
    let rows = writer.read(cypher, params).await?;
    if rows.is_empty() {
        return Err(Error::node_not_found(qn));
    }
    Ok(())
}

pub(crate) fn base_params(tool: &str, project: &str, start: &str, max_depth: i64) -> Props {
    let mut params = Props::new();
    params.insert("__tool".to_string(), PropValue::Str(tool.to_string()));
    params.insert("project".to_string(), PropValue::Str(project.to_string()));
    params.insert("start".to_string(), PropValue::Str(start.to_string()));
    params.insert("max_depth".to_string(), PropValue::Int(max_depth));
    params
}
