//! The batched graph writer (spec.md §4.4) and its storage abstraction.
//!
//! `GraphStore` is the thin async trait a storage backend implements; [`memgraph_store`]
//! implements it against a live Memgraph instance over the Bolt protocol (`neo4rs`),
//! [`fake_store`] implements it in-memory for tests. [`writer::GraphWriter`] is the public
//! contract callers use — it owns the batch buffer, ordering, and retry policy described in
//! spec.md §4.4, independent of which store backs it.

pub mod fake_store;
pub mod memgraph_store;
pub mod model;
pub mod writer;

use async_trait::async_trait;

use crate::error::Result;
use model::{EdgeType, NodeLabel, Props, Row};

/// Storage abstraction the `GraphWriter` drives. A backend only needs to know how to run a
/// single parameterized batch upsert and a single parameterized read — everything about
/// batching, ordering, and idempotence lives in `GraphWriter`.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create (idempotently) the unique constraint `{project, qualified_name}` for every
    /// code-entity label, plus `{name}` for `Project`.
    async fn ensure_constraints(&self) -> Result<()>;

    /// `MERGE` a batch of nodes of the same label, keyed by `(project, qualified_name)`
    /// (or `name` alone for `Project`). Property sets on re-merge overwrite previous values
    /// (spec.md §4.4 "Idempotence").
    async fn upsert_nodes(&self, label: NodeLabel, rows: Vec<Props>) -> Result<()>;

    /// `MERGE` a batch of edges of the same type, keyed by `(from_key, type, to_key)`.
    /// Returns the number of rows whose endpoints were missing (a constraint violation
    /// the caller should treat as "retry after a node flush").
    async fn upsert_edges(&self, edge_type: EdgeType, rows: Vec<EdgeBatchRow>) -> Result<usize>;

    /// Detach-delete every node transitively contained by `project` (spec.md §3 lifecycle).
    async fn clean(&self, project: &str) -> Result<()>;

    /// Execute a parameterized read query, returning ordered column→value rows.
    async fn read(&self, query: &str, params: Props) -> Result<Vec<Row>>;
}

/// One row in an edge upsert batch: both endpoints identified by `(label, qualified_name)`
/// plus the project they're scoped to, and any edge properties.
#[derive(Debug, Clone)]
pub struct EdgeBatchRow {
    pub project: String,
    pub from_label: NodeLabel,
    pub from_qn: String,
    pub to_label: NodeLabel,
    pub to_qn: String,
    pub properties: Props,
}
