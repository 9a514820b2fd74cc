mod cli;
mod config;
mod envelope;
mod error;
mod graph;
mod ingest;
mod language;
mod mcp;
mod parser;
mod query;
mod resolver;
mod walker;

use std::path::PathBuf;

use clap::Parser;

use cli::{Cli, Commands};
use config::Config;
use envelope::Envelope;
use error::Error;
use graph::memgraph_store::MemgraphStore;
use graph::writer::GraphWriter;
use language::LanguageKind;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let repo_path = cli.repo_path.clone().unwrap_or_else(|| PathBuf::from("."));

    if let Err(err) = run(cli, &repo_path).await {
        let envelope = Envelope::<()>::err(&err, envelope::new_request_id());
        eprintln!("{}", serde_json::to_string_pretty(&envelope).unwrap());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, repo_path: &std::path::Path) -> Result<(), Error> {
    let config = Config::load(repo_path)?;

    match cli.command {
        Commands::Ingest { project, verbose, lang } => {
            let project = resolve_project_name(&config, project, repo_path)?;
            let _allowed = parse_language_filter(&lang)?;
            if verbose {
                eprintln!("ingesting '{project}' from {}", repo_path.display());
            }

            let mut writer = connect_writer(&config).await?;
            let report = ingest::run(&config, &project, repo_path, &mut writer).await?;
            writer.close().await?;

            print_ok(report_to_value(&report));
        }

        Commands::Clean { project } => {
            config::validate_project_name(&project)?;
            let mut writer = connect_writer(&config).await?;
            writer.clean(&project).await?;
            print_ok(serde_json::json!({ "project": project, "cleaned": true }));
        }

        Commands::Serve => {
            mcp::run(config, repo_path.to_path_buf()).await.map_err(Error::from)?;
        }

        Commands::Callers { project, qn, max_depth, include_paths } => {
            if qn.is_empty() {
                return Err(Error::invalid_arguments("qn must not be empty"));
            }
            if !(1..=5).contains(&max_depth) {
                return Err(Error::invalid_arguments("max_depth must be between 1 and 5"));
            }
            let writer = connect_writer(&config).await?;
            let result = query::callers::callers(&writer, &project, &qn, max_depth, include_paths).await?;
            print_ok(serde_json::to_value(result).unwrap());
        }

        Commands::Hierarchy { project, qn, direction, max_depth } => {
            if qn.is_empty() {
                return Err(Error::invalid_arguments("qn must not be empty"));
            }
            let direction = query::hierarchy::Direction::parse(&direction)?;
            let writer = connect_writer(&config).await?;
            let result = query::hierarchy::hierarchy(&writer, &project, &qn, direction, max_depth).await?;
            print_ok(serde_json::to_value(result).unwrap());
        }

        Commands::Dependencies { project, qn, kind, transitive } => {
            if qn.is_empty() {
                return Err(Error::invalid_arguments("qn must not be empty"));
            }
            let kind = query::dependencies::DependencyKind::parse(&kind)?;
            let writer = connect_writer(&config).await?;
            let result = query::dependencies::dependencies(&writer, &project, &qn, kind, transitive).await?;
            print_ok(serde_json::to_value(result).unwrap());
        }

        Commands::Implementations { project, qn, include_indirect } => {
            if qn.is_empty() {
                return Err(Error::invalid_arguments("qn must not be empty"));
            }
            let writer = connect_writer(&config).await?;
            let result = query::implementations::implementations(&writer, &project, &qn, include_indirect).await?;
            print_ok(serde_json::to_value(result).unwrap());
        }

        Commands::ModuleExports { project, module_qn, include_private } => {
            if module_qn.is_empty() {
                return Err(Error::invalid_arguments("module_qn must not be empty"));
            }
            let writer = connect_writer(&config).await?;
            let result =
                query::module_exports::module_exports(&writer, &project, &module_qn, include_private).await?;
            print_ok(serde_json::to_value(result).unwrap());
        }

        Commands::CallGraph { project, entry_qn, max_depth, max_nodes } => {
            if entry_qn.is_empty() {
                return Err(Error::invalid_arguments("entry_qn must not be empty"));
            }
            if !(1..=5).contains(&max_depth) || !(1..=100).contains(&max_nodes) {
                return Err(Error::invalid_arguments("max_depth must be 1..=5 and max_nodes 1..=100"));
            }
            let writer = connect_writer(&config).await?;
            let result = query::call_graph::call_graph(&writer, &project, &entry_qn, max_depth, max_nodes).await?;
            print_ok(serde_json::to_value(result).unwrap());
        }

        Commands::AdHoc { project, query: cypher, limit } => {
            query::ad_hoc::validate_args(&cypher, limit)?;
            let writer = connect_writer(&config).await?;
            let result = query::ad_hoc::ad_hoc(&writer, &project, &cypher, std::collections::HashMap::new(), limit)
                .await?;
            print_ok(serde_json::to_value(result).unwrap());
        }
    }

    Ok(())
}

async fn connect_writer(config: &Config) -> Result<GraphWriter, Error> {
    let store = MemgraphStore::connect(
        &config.graph.host,
        config.graph.port,
        config.graph.database.as_deref(),
        config.graph.connect_timeout_ms,
    )
    .await?;
    GraphWriter::connect(Box::new(store), config.graph.batch_size).await
}

fn resolve_project_name(
    config: &Config,
    cli_project: Option<String>,
    repo_path: &std::path::Path,
) -> Result<String, Error> {
    let name = cli_project
        .or_else(|| config.ingest.project_name.clone())
        .or_else(|| repo_path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .ok_or_else(|| Error::invalid_arguments("could not determine a project name"))?;
    config::validate_project_name(&name)?;
    Ok(name)
}

/// Parse `--lang` into the set tree-sitter parsing is restricted to, or `None` for "all
/// supported languages" when the flag is absent. Ingestion itself does not yet take a language
/// filter (it walks every supported extension); this is validated up front so a typo in
/// `--lang` fails fast rather than silently ingesting everything.
fn parse_language_filter(raw: &[String]) -> Result<Option<std::collections::HashSet<LanguageKind>>, Error> {
    if raw.is_empty() {
        return Ok(None);
    }
    let mut set = std::collections::HashSet::new();
    for entry in raw {
        let lang = LanguageKind::from_str_loose(entry)
            .ok_or_else(|| Error::invalid_arguments(format!("unknown language '{entry}'")))?;
        set.insert(lang);
    }
    Ok(Some(set))
}

fn report_to_value(report: &ingest::IngestReport) -> serde_json::Value {
    serde_json::json!({
        "project": report.project,
        "files_discovered": report.files_discovered,
        "files_parsed": report.files_parsed,
        "parse_errors": report.parse_errors.iter().map(|(p, msg)| {
            serde_json::json!({ "path": p.display().to_string(), "error": msg })
        }).collect::<Vec<_>>(),
        "nodes_written": report.nodes_written,
        "edges_written": report.edges_written,
        "warnings": report.warnings,
    })
}

fn print_ok(data: serde_json::Value) {
    let envelope = Envelope::ok(data, envelope::new_request_id(), std::collections::HashMap::new());
    println!("{}", serde_json::to_string_pretty(&envelope).unwrap());
}
