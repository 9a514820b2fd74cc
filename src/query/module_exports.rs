//! `module_exports` tool (spec.md §4.5): what a module `DEFINES` and exports, filtering
//! underscore-prefixed names unless `include_private` is set. Ordered `(kind, name)`, not
//! `(depth, qualified_name)` like the traversal tools — depth is always 1 here.

use crate::error::{Error, Result};
use crate::graph::writer::GraphWriter;

use super::{assert_node_exists, base_params, Hit, QueryResult, DEFAULT_TRUNCATION};

pub async fn module_exports(
    writer: &GraphWriter,
    project: &str,
    module_qn: &str,
    include_private: bool,
) -> Result<QueryResult<Hit>> {
    if module_qn.is_empty() {
        return Err(Error::invalid_arguments("module_qn must not be empty"));
    }

    assert_node_exists(writer, project, module_qn).await?;

    let cypher = "MATCH (m {project: $project, qualified_name: $start})-[:EXPORTS]->(x) \
                  RETURN x.qualified_name AS qualified_name, labels(x)[0] AS label, x.name AS name, 1 AS depth";
    let params = base_params("module_exports", project, module_qn, 1);
    let rows = writer.read(cypher, params).await?;

    let mut items: Vec<Hit> = rows.iter().filter_map(Hit::from_row).collect();
    if !include_private {
        items.retain(|hit| {
            hit.name.as_deref().map(|n| !n.starts_with('_')).unwrap_or(true)
        });
    }
    items.sort_by(|a, b| {
        a.label.cmp(&b.label).then_with(|| {
            a.name.as_deref().unwrap_or("").cmp(b.name.as_deref().unwrap_or(""))
        })
    });

    let total_count = items.len();
    let truncated = total_count > DEFAULT_TRUNCATION;
    items.truncate(DEFAULT_TRUNCATION);
    let shown_count = items.len();
    let hint = truncated
        .then(|| format!("showing {shown_count}/{total_count}; pass include_private=false or query a narrower module"));

    Ok(QueryResult { items, total_count, shown_count, truncated, hint, warnings: Vec::new() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fake_store::FakeGraphStore;
    use crate::graph::model::{EdgeType, NodeLabel, Props, PropValue};

    #[tokio::test]
    async fn filters_underscore_prefixed_names_by_default() {
        let store = FakeGraphStore::new();
        let mut writer = GraphWriter::connect(Box::new(store), 10).await.unwrap();
        for (label, name) in [(NodeLabel::Module, "demo.mod"), (NodeLabel::Function, "demo.mod.public"), (NodeLabel::Function, "demo.mod._private")] {
            let mut props = Props::new();
            props.insert("project".into(), PropValue::Str("demo".into()));
            props.insert("qualified_name".into(), PropValue::Str(name.into()));
            props.insert("name".into(), PropValue::Str(name.rsplit('.').next().unwrap().into()));
            writer.upsert_node(label, props).await.unwrap();
        }
        for to in ["demo.mod.public", "demo.mod._private"] {
            writer
                .upsert_edge(
                    EdgeType::Exports,
                    crate::graph::EdgeBatchRow {
                        project: "demo".into(),
                        from_label: NodeLabel::Module,
                        from_qn: "demo.mod".into(),
                        to_label: NodeLabel::Function,
                        to_qn: to.into(),
                        properties: Props::new(),
                    },
                )
                .await
                .unwrap();
        }
        writer.flush().await.unwrap();

        let default = module_exports(&writer, "demo", "demo.mod", false).await.unwrap();
        assert_eq!(default.items.len(), 1);
        assert_eq!(default.items[0].qualified_name, "demo.mod.public");

        let all = module_exports(&writer, "demo", "demo.mod", true).await.unwrap();
        assert_eq!(all.items.len(), 2);
    }
}
