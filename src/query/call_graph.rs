//! `call_graph` tool (spec.md §4.5): the `CALLS*` subgraph reachable from `entry_qn`, bounded
//! by both `max_depth` and `max_nodes` — the stricter of the two wins.

use crate::error::{Error, Result};
use crate::graph::model::EdgeType;
use crate::graph::writer::GraphWriter;

use super::{assert_node_exists, base_params, truncate_rows, Hit, QueryResult};

pub async fn call_graph(
    writer: &GraphWriter,
    project: &str,
    entry_qn: &str,
    max_depth: u32,
    max_nodes: usize,
) -> Result<QueryResult<Hit>> {
    if entry_qn.is_empty() {
        return Err(Error::invalid_arguments("entry_qn must not be empty"));
    }
    if !(1..=5).contains(&max_depth) {
        return Err(Error::invalid_arguments("max_depth must be between 1 and 5")
            .with_suggestion("pick a max_depth in 1..=5"));
    }
    if !(1..=100).contains(&max_nodes) {
        return Err(Error::invalid_arguments("max_nodes must be between 1 and 100")
            .with_suggestion("pick a max_nodes in 1..=100"));
    }

    assert_node_exists(writer, project, entry_qn).await?;

    let cypher = format!(
        "MATCH p = (entry {{project: $project, qualified_name: $start}})-[:{edge}*1..{depth}]->(callee) \
         RETURN DISTINCT callee.qualified_name AS qualified_name, labels(callee)[0] AS label, callee.name AS name, \
         length(p) AS depth LIMIT {limit}",
        edge = EdgeType::Calls.as_cypher(),
        depth = max_depth,
        limit = max_nodes + 1,
    );
    let params = base_params("call_graph", project, entry_qn, max_depth as i64);
    let rows = writer.read(&cypher, params).await?;
    Ok(truncate_rows(rows, max_nodes))
}
