//! `callers` tool (spec.md §4.5): who calls `qn`, within `max_depth` hops of `CALLS` edges.

use crate::error::{Error, Result};
use crate::graph::model::EdgeType;
use crate::graph::writer::GraphWriter;

use super::{assert_node_exists, base_params, truncate_rows, Hit, QueryResult, DEFAULT_TRUNCATION};

pub async fn callers(
    writer: &GraphWriter,
    project: &str,
    qn: &str,
    max_depth: u32,
    include_paths: bool,
) -> Result<QueryResult<Hit>> {
    if qn.is_empty() {
        return Err(Error::invalid_arguments("qn must not be empty"));
    }
    if !(1..=5).contains(&max_depth) {
        return Err(Error::invalid_arguments("max_depth must be between 1 and 5")
            .with_suggestion("pick a max_depth in 1..=5"));
    }

    assert_node_exists(writer, project, qn).await?;

    // `p` is always bound since `length(p)` drives the depth column regardless of
    // `include_paths`; the path itself is always projected too, and stripped back off below
    // when the caller didn't ask for it, rather than varying the query shape per flag.
    let cypher = format!(
        "MATCH p = (c)-[:{edge}*1..{depth}]->(t {{project: $project, qualified_name: $start}}) \
         RETURN DISTINCT c.qualified_name AS qualified_name, labels(c)[0] AS label, c.name AS name, \
         length(p) AS depth, [n in nodes(p) | n.qualified_name] AS path LIMIT {limit}",
        edge = EdgeType::Calls.as_cypher(),
        depth = max_depth,
        limit = DEFAULT_TRUNCATION + 1,
    );

    let params = base_params("callers", project, qn, max_depth as i64);
    let rows = writer.read(&cypher, params).await?;
    let mut result = truncate_rows(rows, DEFAULT_TRUNCATION);
    if !include_paths {
        for item in &mut result.items {
            item.path = None;
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fake_store::FakeGraphStore;
    use crate::graph::model::{NodeLabel, Props, PropValue};

    async fn seed() -> GraphWriter {
        let store = FakeGraphStore::new();
        let mut writer = GraphWriter::connect(Box::new(store), 10).await.unwrap();
        for name in ["demo.a", "demo.b", "demo.c"] {
            let mut props = Props::new();
            props.insert("project".into(), PropValue::Str("demo".into()));
            props.insert("qualified_name".into(), PropValue::Str(name.into()));
            props.insert("name".into(), PropValue::Str(name.rsplit('.').next().unwrap().into()));
            writer.upsert_node(NodeLabel::Function, props).await.unwrap();
        }
        for (from, to) in [("demo.a", "demo.b"), ("demo.b", "demo.c")] {
            writer
                .upsert_edge(
                    EdgeType::Calls,
                    crate::graph::EdgeBatchRow {
                        project: "demo".into(),
                        from_label: NodeLabel::Function,
                        from_qn: from.into(),
                        to_label: NodeLabel::Function,
                        to_qn: to.into(),
                        properties: Props::new(),
                    },
                )
                .await
                .unwrap();
        }
        writer.flush().await.unwrap();
        writer
    }

    #[tokio::test]
    async fn finds_direct_and_transitive_callers() {
        let writer = seed().await;
        let result = callers(&writer, "demo", "demo.c", 5, false).await.unwrap();
        let names: Vec<&str> = result.items.iter().map(|h| h.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["demo.b", "demo.a"]);
    }

    #[tokio::test]
    async fn depth_bound_limits_transitive_reach() {
        let writer = seed().await;
        let result = callers(&writer, "demo", "demo.c", 1, false).await.unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].qualified_name, "demo.b");
    }

    #[tokio::test]
    async fn rejects_depth_out_of_range() {
        let writer = seed().await;
        let err = callers(&writer, "demo", "demo.c", 6, false).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidArguments);
    }

    #[tokio::test]
    async fn unknown_qn_is_node_not_found() {
        let writer = seed().await;
        let err = callers(&writer, "demo", "demo.nope", 5, false).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NodeNotFound);
    }

    #[tokio::test]
    async fn include_paths_renders_the_intermediate_hops() {
        let writer = seed().await;

        let without = callers(&writer, "demo", "demo.c", 5, false).await.unwrap();
        assert!(without.items.iter().all(|h| h.path.is_none()));

        let with = callers(&writer, "demo", "demo.c", 5, true).await.unwrap();
        let a = with.items.iter().find(|h| h.qualified_name == "demo.a").unwrap();
        assert_eq!(a.path.as_deref(), Some(["demo.c", "demo.b", "demo.a"].map(String::from).as_slice()));
    }
}
