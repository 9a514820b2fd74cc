//! `implementations` tool (spec.md §4.5): who implements or (optionally) inherits from `qn`,
//! deduped by smallest depth across the `IMPLEMENTS*` and `INHERITS*` traversals.

use crate::error::{Error, Result};
use crate::graph::model::EdgeType;
use crate::graph::writer::GraphWriter;

use super::{assert_node_exists, base_params, truncate_rows, Hit, QueryResult, DEFAULT_TRUNCATION};

const MAX_DEPTH: u32 = 10;

pub async fn implementations(
    writer: &GraphWriter,
    project: &str,
    qn: &str,
    include_indirect: bool,
) -> Result<QueryResult<Hit>> {
    if qn.is_empty() {
        return Err(Error::invalid_arguments("qn must not be empty"));
    }
    assert_node_exists(writer, project, qn).await?;

    let direct_cypher = format!(
        "MATCH p = (impl)-[:{edge}*1..{depth}]->(s {{project: $project, qualified_name: $start}}) \
         RETURN DISTINCT impl.qualified_name AS qualified_name, labels(impl)[0] AS label, impl.name AS name, \
         length(p) AS depth LIMIT {limit}",
        edge = EdgeType::Implements.as_cypher(),
        depth = MAX_DEPTH,
        limit = DEFAULT_TRUNCATION + 1,
    );
    let params = base_params("implementations", project, qn, MAX_DEPTH as i64);
    let mut rows = writer.read(&direct_cypher, params).await?;

    if include_indirect {
        let inherited_cypher = format!(
            "MATCH p = (sub)-[:{edge}*1..{depth}]->(s {{project: $project, qualified_name: $start}}) \
             RETURN DISTINCT sub.qualified_name AS qualified_name, labels(sub)[0] AS label, sub.name AS name, \
             length(p) AS depth LIMIT {limit}",
            edge = EdgeType::Inherits.as_cypher(),
            depth = MAX_DEPTH,
            limit = DEFAULT_TRUNCATION + 1,
        );
        let params = base_params("hierarchy_down", project, qn, MAX_DEPTH as i64);
        rows.extend(writer.read(&inherited_cypher, params).await?);
    }

    Ok(truncate_rows(rows, DEFAULT_TRUNCATION))
}
