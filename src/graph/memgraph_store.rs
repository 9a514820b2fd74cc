//! [`GraphStore`] implementation against a live Memgraph instance over the Bolt protocol,
//! via `neo4rs` (Memgraph speaks the same wire protocol as Neo4j, so the Neo4j-oriented
//! driver applies unmodified). Grounded in
//! `original_source/specs/000-fix-db-connection/contracts/memgraph_ingestor_api.py`'s
//! `MemgraphIngestor`: `connect`/`ensure_constraints`/`_execute_batch`/`clean_database` map
//! onto the methods below one-to-one.

use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use neo4rs::{BoltType, ConfigBuilder, Graph, Query};

use crate::error::{Error, ErrorCode, Result};

use super::model::{EdgeType, NodeLabel, PropValue, Props, Row};
use super::{EdgeBatchRow, GraphStore};

pub struct MemgraphStore {
    graph: Graph,
}

impl MemgraphStore {
    /// Open a Bolt connection to `host:port`, selecting `database` if given (Memgraph's
    /// Enterprise multi-tenancy; community builds ignore it and use the default database).
    pub async fn connect(
        host: &str,
        port: u16,
        database: Option<&str>,
        connect_timeout_ms: u64,
    ) -> Result<Self> {
        let uri = format!("bolt://{host}:{port}");
        let mut builder = ConfigBuilder::default()
            .uri(uri)
            .user("")
            .password("")
            .fetch_size(500)
            .max_connections(10);
        if let Some(db) = database {
            builder = builder.db(db);
        }
        let config = builder
            .build()
            .map_err(|e| Error::new(ErrorCode::InvalidArguments, e.to_string()))?;

        let connect = neo4rs::Graph::connect(config);
        let graph = tokio::time::timeout(
            std::time::Duration::from_millis(connect_timeout_ms),
            connect,
        )
        .await
        .map_err(|_| Error::new(ErrorCode::Timeout, "timed out connecting to Memgraph"))?
        .map_err(|e| Error::new(ErrorCode::ServiceUnavailable, e.to_string()))?;

        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphStore for MemgraphStore {
    async fn ensure_constraints(&self) -> Result<()> {
        self.graph
            .run(Query::new(
                "CREATE CONSTRAINT ON (n:Project) ASSERT n.name IS UNIQUE".to_string(),
            ))
            .await
            .ok();

        for label in NodeLabel::code_entity_labels() {
            let cypher = format!(
                "CREATE CONSTRAINT ON (n:{}) ASSERT (n.project, n.qualified_name) IS UNIQUE",
                label.as_cypher()
            );
            // Memgraph returns an error if the constraint already exists; that is not a
            // failure condition here (spec.md §4.4 "idempotent").
            self.graph.run(Query::new(cypher)).await.ok();
        }
        Ok(())
    }

    async fn upsert_nodes(&self, label: NodeLabel, rows: Vec<Props>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let key_field = if label == NodeLabel::Project { "name" } else { "qualified_name" };
        let cypher = format!(
            "UNWIND $rows AS row MERGE (n:{label} {{project: row.project, {key_field}: row.{key_field}}}) SET n += row",
            label = label.as_cypher(),
            key_field = key_field,
        );
        let query = Query::new(cypher).param("rows", props_vec_to_bolt(rows));
        self.graph.run(query).await.map_err(Error::from)
    }

    async fn upsert_edges(&self, edge_type: EdgeType, rows: Vec<EdgeBatchRow>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let bolt_rows: Vec<BoltType> = rows
            .iter()
            .map(|row| {
                let mut map = HashMap::new();
                map.insert("project".to_string(), PropValue::Str(row.project.clone()));
                map.insert("from_qn".to_string(), PropValue::Str(row.from_qn.clone()));
                map.insert("to_qn".to_string(), PropValue::Str(row.to_qn.clone()));
                for (k, v) in &row.properties {
                    map.insert(k.clone(), v.clone());
                }
                props_to_bolt(&map)
            })
            .collect();

        let cypher = format!(
            "UNWIND $rows AS row \
             MATCH (a:{from_label} {{project: row.project, qualified_name: row.from_qn}}) \
             MATCH (b:{to_label} {{project: row.project, qualified_name: row.to_qn}}) \
             MERGE (a)-[r:{edge_type}]->(b) \
             SET r += row \
             RETURN count(r) AS written",
            from_label = rows[0].from_label.as_cypher(),
            to_label = rows[0].to_label.as_cypher(),
            edge_type = edge_type.as_cypher(),
        );

        let query = Query::new(cypher).param("rows", BoltType::List(bolt_rows.into()));
        let mut stream = self.graph.execute(query).await.map_err(Error::from)?;
        let written: i64 = match stream.next().await.map_err(Error::from)? {
            Some(row) => row.get("written").unwrap_or(0),
            None => 0,
        };
        let missing = rows.len().saturating_sub(written.max(0) as usize);
        Ok(missing)
    }

    async fn clean(&self, project: &str) -> Result<()> {
        let query = Query::new(
            "MATCH (n {project: $project}) DETACH DELETE n".to_string(),
        )
        .param("project", project);
        self.graph.run(query).await.map_err(Error::from)
    }

    async fn read(&self, query: &str, params: Props) -> Result<Vec<Row>> {
        let mut q = Query::new(query.to_string());
        for (key, value) in params {
            q = q.param(&key, prop_value_to_bolt(value));
        }

        let mut stream = self.graph.execute(q).await.map_err(Error::from)?;
        let mut out = Vec::new();
        while let Some(row) = stream.next().await.map_err(Error::from)? {
            out.push(bolt_row_to_json(row));
        }
        Ok(out)
    }
}

fn prop_value_to_bolt(value: PropValue) -> BoltType {
    match value {
        PropValue::Str(s) => BoltType::String(s.into()),
        PropValue::Int(n) => BoltType::Integer(n.into()),
        PropValue::Bool(b) => BoltType::Boolean(b.into()),
        PropValue::StrList(items) => {
            BoltType::List(items.into_iter().map(|s| BoltType::String(s.into())).collect())
        }
        PropValue::Null => BoltType::Null(neo4rs::BoltNull),
    }
}

fn props_to_bolt(props: &Props) -> BoltType {
    let mut map = neo4rs::BoltMap::default();
    for (k, v) in props {
        map.put(k.clone().into(), prop_value_to_bolt(v.clone()));
    }
    BoltType::Map(map)
}

fn props_vec_to_bolt(rows: Vec<Props>) -> BoltType {
    BoltType::List(rows.iter().map(props_to_bolt).collect())
}

/// Convert a `neo4rs::Row` into the crate's ordered column→value map, converting Bolt values
/// to `serde_json::Value` via the scalar types the query layer actually produces (strings,
/// integers, booleans, lists of strings — never nested maps).
fn bolt_row_to_json(row: neo4rs::Row) -> Row {
    let mut out = IndexMap::new();
    for key in row.keys() {
        let value = row
            .get::<String>(key)
            .ok()
            .map(serde_json::Value::String)
            .or_else(|| row.get::<i64>(key).ok().map(|n| serde_json::json!(n)))
            .or_else(|| row.get::<bool>(key).ok().map(serde_json::Value::Bool))
            .or_else(|| {
                row.get::<Vec<String>>(key)
                    .ok()
                    .map(|items| serde_json::Value::Array(items.into_iter().map(serde_json::Value::String).collect()))
            })
            .unwrap_or(serde_json::Value::Null);
        out.insert(key.to_string(), value);
    }
    out
}
