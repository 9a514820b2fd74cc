use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use super::params::{
    AdHocParams, CallGraphParams, CallersParams, DependenciesParams, HierarchyParams,
    ImplementationsParams, ModuleExportsParams,
};
use crate::config::Config;
use crate::envelope::{Envelope, new_request_id, timing_meta};
use crate::error::{Error, ErrorCode};
use crate::graph::writer::GraphWriter;
use crate::query;

// ---------------------------------------------------------------------------
// CodeGraphServer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct CodeGraphServer {
    writer: Arc<GraphWriter>,
    config: Arc<Config>,
    #[allow(dead_code)]
    project_root: Arc<PathBuf>,
    tool_router: ToolRouter<Self>,
}

impl CodeGraphServer {
    pub fn new(writer: GraphWriter, config: Config, project_root: PathBuf) -> Self {
        Self {
            writer: Arc::new(writer),
            config: Arc::new(config),
            project_root: Arc::new(project_root),
            tool_router: Self::tool_router(),
        }
    }

    /// Run `fut` under the given cooperative timeout (spec.md §5), converting a deadline miss
    /// into `ErrorCode::QueryTimeout` rather than leaving the tool call hanging.
    async fn with_timeout<T>(
        &self,
        timeout_ms: u64,
        fut: impl std::future::Future<Output = Result<T, Error>>,
    ) -> Result<T, Error> {
        tokio::time::timeout(Duration::from_millis(timeout_ms), fut)
            .await
            .unwrap_or_else(|_| Err(Error::new(ErrorCode::QueryTimeout, "query exceeded its time budget")))
    }

    /// Wrap a tool's result in the envelope, always returning `Ok` at the MCP transport layer —
    /// business-logic failures live inside the envelope (spec.md §6 "XOR invariant"), not in
    /// the transport's own error channel.
    fn envelope_json<T: Serialize>(started: Instant, result: Result<T, Error>, request_id: String) -> String {
        match result {
            Ok(data) => {
                let meta = timing_meta(started.elapsed().as_millis());
                serde_json::to_string(&Envelope::ok(data, request_id, meta)).unwrap()
            }
            Err(err) => serde_json::to_string(&Envelope::<()>::err(&err, request_id)).unwrap(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool implementations
// ---------------------------------------------------------------------------

#[tool_router]
impl CodeGraphServer {
    #[tool(description = "Who calls a symbol, within max_depth CALLS hops (1..=5).")]
    async fn callers(&self, Parameters(p): Parameters<CallersParams>) -> Result<String, String> {
        let request_id = new_request_id();
        let started = Instant::now();
        let result = self
            .with_timeout(
                self.config.query.default_timeout_ms,
                query::callers::callers(&self.writer, &p.project, &p.qn, p.max_depth, p.include_paths),
            )
            .await;
        Ok(Self::envelope_json(started, result, request_id))
    }

    #[tool(description = "Supertypes/subtypes of a class or interface along INHERITS edges.")]
    async fn hierarchy(&self, Parameters(p): Parameters<HierarchyParams>) -> Result<String, String> {
        let request_id = new_request_id();
        let started = Instant::now();
        let result = match query::hierarchy::Direction::parse(&p.direction) {
            Ok(direction) => {
                self.with_timeout(
                    self.config.query.default_timeout_ms,
                    query::hierarchy::hierarchy(&self.writer, &p.project, &p.qn, direction, p.max_depth),
                )
                .await
            }
            Err(err) => Err(err),
        };
        Ok(Self::envelope_json(started, result, request_id))
    }

    #[tool(description = "What a symbol imports and/or calls, optionally transitively.")]
    async fn dependencies(&self, Parameters(p): Parameters<DependenciesParams>) -> Result<String, String> {
        let request_id = new_request_id();
        let started = Instant::now();
        let result = match query::dependencies::DependencyKind::parse(&p.kind) {
            Ok(kind) => {
                self.with_timeout(
                    self.config.query.default_timeout_ms,
                    query::dependencies::dependencies(&self.writer, &p.project, &p.qn, kind, p.transitive),
                )
                .await
            }
            Err(err) => Err(err),
        };
        Ok(Self::envelope_json(started, result, request_id))
    }

    #[tool(description = "Who implements (and optionally inherits from) an interface or base class.")]
    async fn implementations(&self, Parameters(p): Parameters<ImplementationsParams>) -> Result<String, String> {
        let request_id = new_request_id();
        let started = Instant::now();
        let result = self
            .with_timeout(
                self.config.query.default_timeout_ms,
                query::implementations::implementations(&self.writer, &p.project, &p.qn, p.include_indirect),
            )
            .await;
        Ok(Self::envelope_json(started, result, request_id))
    }

    #[tool(description = "What a module DEFINES and exports, optionally including private names.")]
    async fn module_exports(&self, Parameters(p): Parameters<ModuleExportsParams>) -> Result<String, String> {
        let request_id = new_request_id();
        let started = Instant::now();
        let result = self
            .with_timeout(
                self.config.query.default_timeout_ms,
                query::module_exports::module_exports(
                    &self.writer,
                    &p.project,
                    &p.module_qn,
                    p.include_private,
                ),
            )
            .await;
        Ok(Self::envelope_json(started, result, request_id))
    }

    #[tool(description = "The CALLS subgraph reachable from an entry-point function or method.")]
    async fn call_graph(&self, Parameters(p): Parameters<CallGraphParams>) -> Result<String, String> {
        let request_id = new_request_id();
        let started = Instant::now();
        let result = self
            .with_timeout(
                self.config.query.default_timeout_ms,
                query::call_graph::call_graph(&self.writer, &p.project, &p.entry_qn, p.max_depth, p.max_nodes),
            )
            .await;
        Ok(Self::envelope_json(started, result, request_id))
    }

    #[tool(description = "Run a guarded read-only Cypher query against the graph. Mutation keywords are rejected.")]
    async fn ad_hoc(&self, Parameters(p): Parameters<AdHocParams>) -> Result<String, String> {
        let request_id = new_request_id();
        let started = Instant::now();
        let result = self
            .with_timeout(
                self.config.query.ad_hoc_timeout_ms,
                query::ad_hoc::ad_hoc(&self.writer, &p.project, &p.query, p.params, p.limit),
            )
            .await;
        Ok(Self::envelope_json(started, result, request_id))
    }
}

// ---------------------------------------------------------------------------
// ServerHandler
// ---------------------------------------------------------------------------

#[tool_handler]
impl ServerHandler for CodeGraphServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "codegraph-kg: query a code knowledge graph ingested into Memgraph. Run \
                 'codegraph-kg ingest <path>' first; every tool here takes the project name \
                 that ingestion was given."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
