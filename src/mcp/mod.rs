mod params;
mod server;

use std::path::PathBuf;

use rmcp::transport::stdio;

use crate::config::Config;
use crate::graph::memgraph_store::MemgraphStore;
use crate::graph::writer::GraphWriter;

pub async fn run(config: Config, project_root: PathBuf) -> anyhow::Result<()> {
    let store = MemgraphStore::connect(
        &config.graph.host,
        config.graph.port,
        config.graph.database.as_deref(),
        config.graph.connect_timeout_ms,
    )
    .await
    .map_err(|e| anyhow::anyhow!(e.message))?;
    let writer = GraphWriter::connect(Box::new(store), config.graph.batch_size)
        .await
        .map_err(|e| anyhow::anyhow!(e.message))?;

    let service = server::CodeGraphServer::new(writer, config, project_root);
    let server = rmcp::serve_server(service, stdio()).await?;
    server.waiting().await?;
    Ok(())
}
