//! `hierarchy` tool (spec.md §4.5): supertypes (`up`), subtypes (`down`), or both, following
//! `INHERITS` edges up to `max_depth` hops. The hop bound keeps a cyclic `INHERITS` graph from
//! running away, but a cycle among the ancestors/descendants is still real graph shape the
//! caller should know about — each traversed path carries its full node list so cycles are
//! detected client-side and surfaced as `warnings` (spec.md §8 scenario 3, §9).

use crate::error::{Error, Result};
use crate::graph::model::EdgeType;
use crate::graph::writer::GraphWriter;

use super::{assert_node_exists, base_params, detect_cycles, path_of, truncate_rows, Hit, QueryResult, DEFAULT_TRUNCATION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Both,
}

impl Direction {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "both" => Ok(Self::Both),
            other => Err(Error::invalid_arguments(format!(
                "hierarchy direction must be one of up|down|both, got '{other}'"
            ))),
        }
    }
}

pub async fn hierarchy(
    writer: &GraphWriter,
    project: &str,
    qn: &str,
    direction: Direction,
    max_depth: u32,
) -> Result<QueryResult<Hit>> {
    if qn.is_empty() {
        return Err(Error::invalid_arguments("qn must not be empty"));
    }
    if !(1..=10).contains(&max_depth) {
        return Err(Error::invalid_arguments("max_depth must be between 1 and 10")
            .with_suggestion("pick a max_depth in 1..=10"));
    }

    assert_node_exists(writer, project, qn).await?;

    let mut rows = Vec::new();
    if matches!(direction, Direction::Up | Direction::Both) {
        rows.extend(run_direction(writer, project, qn, max_depth, true).await?);
    }
    if matches!(direction, Direction::Down | Direction::Both) {
        rows.extend(run_direction(writer, project, qn, max_depth, false).await?);
    }

    let paths: Vec<Vec<String>> = rows.iter().filter_map(path_of).collect();
    let warnings = detect_cycles(&paths);

    let mut result = truncate_rows(rows, DEFAULT_TRUNCATION);
    result.warnings = warnings;
    Ok(result)
}

async fn run_direction(
    writer: &GraphWriter,
    project: &str,
    qn: &str,
    max_depth: u32,
    upward: bool,
) -> Result<Vec<crate::graph::model::Row>> {
    let (tool, cypher) = if upward {
        (
            "hierarchy_up",
            format!(
                "MATCH p = (s {{project: $project, qualified_name: $start}})-[:{edge}*1..{depth}]->(sup) \
                 RETURN DISTINCT sup.qualified_name AS qualified_name, labels(sup)[0] AS label, sup.name AS name, \
                 length(p) AS depth, [n in nodes(p) | n.qualified_name] AS path LIMIT {limit}",
                edge = EdgeType::Inherits.as_cypher(),
                depth = max_depth,
                limit = DEFAULT_TRUNCATION + 1,
            ),
        )
    } else {
        (
            "hierarchy_down",
            format!(
                "MATCH p = (sub)-[:{edge}*1..{depth}]->(s {{project: $project, qualified_name: $start}}) \
                 RETURN DISTINCT sub.qualified_name AS qualified_name, labels(sub)[0] AS label, sub.name AS name, \
                 length(p) AS depth, [n in nodes(p) | n.qualified_name] AS path LIMIT {limit}",
                edge = EdgeType::Inherits.as_cypher(),
                depth = max_depth,
                limit = DEFAULT_TRUNCATION + 1,
            ),
        )
    };
    let params = base_params(tool, project, qn, max_depth as i64);
    writer.read(&cypher, params).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fake_store::FakeGraphStore;
    use crate::graph::model::{NodeLabel, Props, PropValue};

    async fn seed() -> GraphWriter {
        let store = FakeGraphStore::new();
        let mut writer = GraphWriter::connect(Box::new(store), 10).await.unwrap();
        for name in ["demo.Base", "demo.Mid", "demo.Leaf"] {
            let mut props = Props::new();
            props.insert("project".into(), PropValue::Str("demo".into()));
            props.insert("qualified_name".into(), PropValue::Str(name.into()));
            writer.upsert_node(NodeLabel::Class, props).await.unwrap();
        }
        for (sub, sup) in [("demo.Mid", "demo.Base"), ("demo.Leaf", "demo.Mid")] {
            writer
                .upsert_edge(
                    EdgeType::Inherits,
                    crate::graph::EdgeBatchRow {
                        project: "demo".into(),
                        from_label: NodeLabel::Class,
                        from_qn: sub.into(),
                        to_label: NodeLabel::Class,
                        to_qn: sup.into(),
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
    async fn up_returns_ancestors() {
        let writer = seed().await;
        let result = hierarchy(&writer, "demo", "demo.Leaf", Direction::Up, 10).await.unwrap();
        let names: Vec<&str> = result.items.iter().map(|h| h.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["demo.Mid", "demo.Base"]);
    }

    #[tokio::test]
    async fn down_returns_descendants() {
        let writer = seed().await;
        let result = hierarchy(&writer, "demo", "demo.Base", Direction::Down, 10).await.unwrap();
        let names: Vec<&str> = result.items.iter().map(|h| h.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["demo.Mid", "demo.Leaf"]);
    }

    #[tokio::test]
    async fn rejects_unknown_direction() {
        assert!(Direction::parse("sideways").is_err());
    }

    #[tokio::test]
    async fn reports_an_inherits_cycle_as_a_warning() {
        let store = FakeGraphStore::new();
        let mut writer = GraphWriter::connect(Box::new(store), 10).await.unwrap();
        for name in ["demo.A", "demo.B"] {
            let mut props = Props::new();
            props.insert("project".into(), PropValue::Str("demo".into()));
            props.insert("qualified_name".into(), PropValue::Str(name.into()));
            writer.upsert_node(NodeLabel::Class, props).await.unwrap();
        }
        for (sub, sup) in [("demo.A", "demo.B"), ("demo.B", "demo.A")] {
            writer
                .upsert_edge(
                    EdgeType::Inherits,
                    crate::graph::EdgeBatchRow {
                        project: "demo".into(),
                        from_label: NodeLabel::Class,
                        from_qn: sub.into(),
                        to_label: NodeLabel::Class,
                        to_qn: sup.into(),
                        properties: Props::new(),
                    },
                )
                .await
                .unwrap();
        }
        writer.flush().await.unwrap();

        let result = hierarchy(&writer, "demo", "demo.A", Direction::Up, 4).await.unwrap();
        assert_eq!(result.warnings, vec!["cycle: demo.A\u{2192}demo.B\u{2192}demo.A".to_string()]);
    }
}
