//! `dependencies` tool (spec.md §4.5): what `qn` imports and/or calls, optionally transitively.

use crate::error::{Error, Result};
use crate::graph::model::EdgeType;
use crate::graph::writer::GraphWriter;

use super::{assert_node_exists, base_params, truncate_rows, Hit, QueryResult, DEFAULT_TRUNCATION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Imports,
    Calls,
    All,
}

impl DependencyKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "imports" => Ok(Self::Imports),
            "calls" => Ok(Self::Calls),
            "all" => Ok(Self::All),
            other => Err(Error::invalid_arguments(format!(
                "dependencies kind must be one of imports|calls|all, got '{other}'"
            ))),
        }
    }

    fn edge_types(self) -> &'static [EdgeType] {
        match self {
            DependencyKind::Imports => &[EdgeType::Imports],
            DependencyKind::Calls => &[EdgeType::Calls],
            DependencyKind::All => &[EdgeType::Imports, EdgeType::Calls],
        }
    }
}

pub async fn dependencies(
    writer: &GraphWriter,
    project: &str,
    qn: &str,
    kind: DependencyKind,
    transitive: bool,
) -> Result<QueryResult<Hit>> {
    if qn.is_empty() {
        return Err(Error::invalid_arguments("qn must not be empty"));
    }
    assert_node_exists(writer, project, qn).await?;
    let max_depth: i64 = if transitive { 3 } else { 1 };

    let mut rows = Vec::new();
    for edge_type in kind.edge_types() {
        let tool = match edge_type {
            EdgeType::Imports => "dependencies",
            EdgeType::Calls => "call_graph",
            _ => unreachable!("dependencies only follows IMPORTS/CALLS"),
        };
        let cypher = format!(
            "MATCH p = (s {{project: $project, qualified_name: $start}})-[:{edge}*1..{depth}]->(d) \
             RETURN DISTINCT d.qualified_name AS qualified_name, labels(d)[0] AS label, d.name AS name, \
             length(p) AS depth LIMIT {limit}",
            edge = edge_type.as_cypher(),
            depth = max_depth,
            limit = DEFAULT_TRUNCATION + 1,
        );
        let params = base_params(tool, project, qn, max_depth);
        rows.extend(writer.read(&cypher, params).await?);
    }

    Ok(truncate_rows(rows, DEFAULT_TRUNCATION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fake_store::FakeGraphStore;
    use crate::graph::model::{NodeLabel, Props, PropValue};

    #[tokio::test]
    async fn non_transitive_only_follows_one_hop() {
        let store = FakeGraphStore::new();
        let mut writer = GraphWriter::connect(Box::new(store), 10).await.unwrap();
        for name in ["demo.a", "demo.b", "demo.c"] {
            let mut props = Props::new();
            props.insert("project".into(), PropValue::Str("demo".into()));
            props.insert("qualified_name".into(), PropValue::Str(name.into()));
            writer.upsert_node(NodeLabel::Module, props).await.unwrap();
        }
        for (from, to) in [("demo.a", "demo.b"), ("demo.b", "demo.c")] {
            writer
                .upsert_edge(
                    EdgeType::Imports,
                    crate::graph::EdgeBatchRow {
                        project: "demo".into(),
                        from_label: NodeLabel::Module,
                        from_qn: from.into(),
                        to_label: NodeLabel::Module,
                        to_qn: to.into(),
                        properties: Props::new(),
                    },
                )
                .await
                .unwrap();
        }
        writer.flush().await.unwrap();

        let direct = dependencies(&writer, "demo", "demo.a", DependencyKind::Imports, false).await.unwrap();
        assert_eq!(direct.items.len(), 1);
        assert_eq!(direct.items[0].qualified_name, "demo.b");

        let transitive = dependencies(&writer, "demo", "demo.a", DependencyKind::Imports, true).await.unwrap();
        assert_eq!(transitive.items.len(), 2);
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(DependencyKind::parse("exports").is_err());
    }
}
