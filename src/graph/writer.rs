//! `GraphWriter`: the batched, idempotent front door onto a [`GraphStore`] (spec.md §4.4).
//!
//! Callers never talk to a `GraphStore` directly during ingestion — they call
//! `upsert_node`/`upsert_edge`, which buffer rows per `(label | edge_type)` and flush a batch
//! once it reaches `batch_size`. `flush` always flushes node batches before edge batches, since
//! an edge `MERGE` that references an unflushed node would otherwise hit a dangling reference.

use std::collections::HashMap;

use tokio::time::{sleep, Duration};

use crate::error::{Error, ErrorCode, Result};

use super::model::{EdgeType, NodeLabel, Props, Row};
use super::{EdgeBatchRow, GraphStore};

/// Maximum attempts for a transient (`ServiceUnavailable`/`Timeout`) store error before giving
/// up and surfacing it to the caller.
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 100;

pub struct GraphWriter {
    store: Box<dyn GraphStore>,
    batch_size: usize,
    node_buffers: HashMap<NodeLabel, Vec<Props>>,
    edge_buffers: HashMap<EdgeType, Vec<EdgeBatchRow>>,
    nodes_written: u64,
    edges_written: u64,
    /// Edge rows whose endpoints were missing on a previous flush attempt — retried once
    /// after the next node flush, per spec.md §4.4 "retry after node flush".
    pending_retry: HashMap<EdgeType, Vec<EdgeBatchRow>>,
}

impl GraphWriter {
    pub fn new(store: Box<dyn GraphStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            node_buffers: HashMap::new(),
            edge_buffers: HashMap::new(),
            nodes_written: 0,
            edges_written: 0,
            pending_retry: HashMap::new(),
        }
    }

    /// Connect (construct over an already-open store) and ensure constraints exist.
    pub async fn connect(store: Box<dyn GraphStore>, batch_size: usize) -> Result<Self> {
        let writer = Self::new(store, batch_size);
        writer.store.ensure_constraints().await?;
        Ok(writer)
    }

    pub fn nodes_written(&self) -> u64 {
        self.nodes_written
    }

    pub fn edges_written(&self) -> u64 {
        self.edges_written
    }

    /// Buffer a node upsert, flushing its label's batch immediately if this fills it.
    pub async fn upsert_node(&mut self, label: NodeLabel, properties: Props) -> Result<()> {
        let buf = self.node_buffers.entry(label).or_default();
        buf.push(properties);
        if buf.len() >= self.batch_size {
            self.flush_node_label(label).await?;
        }
        Ok(())
    }

    /// Buffer an edge upsert, flushing its type's batch immediately if this fills it.
    pub async fn upsert_edge(&mut self, edge_type: EdgeType, row: EdgeBatchRow) -> Result<()> {
        let buf = self.edge_buffers.entry(edge_type).or_default();
        buf.push(row);
        if buf.len() >= self.batch_size {
            self.flush_edge_type(edge_type).await?;
        }
        Ok(())
    }

    /// Flush every buffered batch: all node labels first, then all edge types, then retry any
    /// edges that were deferred for missing endpoints on a previous flush.
    pub async fn flush(&mut self) -> Result<()> {
        let labels: Vec<NodeLabel> = self.node_buffers.keys().copied().collect();
        for label in labels {
            self.flush_node_label(label).await?;
        }

        let types: Vec<EdgeType> = self.edge_buffers.keys().copied().collect();
        for edge_type in types {
            self.flush_edge_type(edge_type).await?;
        }

        self.retry_pending_edges().await?;
        Ok(())
    }

    async fn flush_node_label(&mut self, label: NodeLabel) -> Result<()> {
        let Some(rows) = self.node_buffers.remove(&label) else {
            return Ok(());
        };
        if rows.is_empty() {
            return Ok(());
        }
        let count = rows.len() as u64;
        self.with_retry(|store| {
            let rows = rows.clone();
            Box::pin(async move { store.upsert_nodes(label, rows).await })
        })
        .await?;
        self.nodes_written += count;
        Ok(())
    }

    async fn flush_edge_type(&mut self, edge_type: EdgeType) -> Result<()> {
        let Some(rows) = self.edge_buffers.remove(&edge_type) else {
            return Ok(());
        };
        if rows.is_empty() {
            return Ok(());
        }
        self.flush_edge_rows(edge_type, rows).await
    }

    async fn flush_edge_rows(&mut self, edge_type: EdgeType, rows: Vec<EdgeBatchRow>) -> Result<()> {
        let total = rows.len();
        let missing = self
            .with_retry(|store| {
                let rows = rows.clone();
                Box::pin(async move { store.upsert_edges(edge_type, rows).await })
            })
            .await?;

        let written = (total - missing.min(total)) as u64;
        self.edges_written += written;

        if missing > 0 {
            // Endpoints were missing — likely because the referencing node batch hasn't been
            // flushed yet (e.g. a forward reference in source order). Defer the whole batch
            // for one retry after the next node flush rather than guessing which rows failed.
            self.pending_retry.entry(edge_type).or_default().extend(rows);
        }
        Ok(())
    }

    /// Retry any edge batches deferred by a previous flush, once. Endpoints still missing after
    /// this retry are a genuine dangling reference, not a flush-ordering artifact, and are
    /// surfaced by leaving `edges_written` short of the total enqueued.
    async fn retry_pending_edges(&mut self) -> Result<()> {
        let pending: Vec<(EdgeType, Vec<EdgeBatchRow>)> = self.pending_retry.drain().collect();
        for (edge_type, rows) in pending {
            if rows.is_empty() {
                continue;
            }
            let _missing = self
                .with_retry(|store| {
                    let rows = rows.clone();
                    Box::pin(async move { store.upsert_edges(edge_type, rows).await })
                })
                .await?;
            let written = (rows.len() as u64).saturating_sub(_missing as u64);
            self.edges_written += written;
        }
        Ok(())
    }

    /// Run `f` against the store, retrying transient errors (`ServiceUnavailable`, `Timeout`)
    /// with exponential backoff, up to `MAX_RETRIES` attempts.
    async fn with_retry<T, F>(&self, mut f: F) -> Result<T>
    where
        F: FnMut(
            &dyn GraphStore,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<T>> + Send + '_>>,
    {
        let mut attempt = 0;
        loop {
            match f(self.store.as_ref()).await {
                Ok(value) => return Ok(value),
                Err(err) if is_transient(&err) && attempt + 1 < MAX_RETRIES => {
                    let backoff = BASE_BACKOFF_MS * 2u64.pow(attempt);
                    tracing::warn!(attempt, backoff, error = %err.message, "transient graph store error, retrying");
                    sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Detach-delete a project's entire subgraph. Flushes any pending writes first so the
    /// clean observes a consistent state.
    pub async fn clean(&mut self, project: &str) -> Result<()> {
        self.flush().await?;
        self.store.clean(project).await
    }

    /// Execute a parameterized read query against the underlying store.
    pub async fn read(&self, query: &str, params: Props) -> Result<Vec<Row>> {
        self.store.read(query, params).await
    }

    /// Flush remaining buffers. There is no persistent connection handle to release beyond
    /// what the store itself owns (its `Drop` closes the Bolt connection).
    pub async fn close(mut self) -> Result<()> {
        self.flush().await
    }
}

fn is_transient(err: &Error) -> bool {
    matches!(err.code, ErrorCode::ServiceUnavailable | ErrorCode::Timeout)
}
