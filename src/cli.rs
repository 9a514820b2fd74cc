use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Builds and serves a queryable knowledge graph of a codebase.
///
/// codegraph-kg walks a project, parses TypeScript/JavaScript/Rust/Python source with
/// tree-sitter, resolves imports/inheritance/calls into a symbol table, and writes the result
/// into Memgraph as a property graph. Once ingested, the graph is queried either through the
/// MCP server (`serve`) or directly from the CLI with the convenience subcommands below.
#[derive(Parser, Debug)]
#[command(
    name = "codegraph-kg",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    /// Path to the project root (defaults to the current directory).
    #[arg(long, global = true)]
    pub repo_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk and parse the project, resolving symbols and writing the graph to Memgraph.
    Ingest {
        /// Project name; must match `[A-Za-z0-9_-]+` (spec.md §6). Defaults to the root
        /// directory's file name.
        #[arg(long)]
        project: Option<String>,

        /// Print each discovered file path during the walk.
        #[arg(short, long)]
        verbose: bool,

        /// Restrict ingestion to these languages (comma-separated: typescript,javascript,rust,python).
        #[arg(long, value_delimiter = ',')]
        lang: Vec<String>,
    },

    /// Detach-delete a project's entire subgraph from the store.
    Clean {
        /// Project name to remove.
        project: String,
    },

    /// Run the MCP server, exposing the query tools over stdio.
    Serve,

    /// Who calls `qn`, within `max_depth` hops of CALLS edges.
    Callers {
        project: String,
        qn: String,
        #[arg(long, default_value_t = 3)]
        max_depth: u32,
        #[arg(long)]
        include_paths: bool,
    },

    /// Supertypes/subtypes of `qn` along INHERITS edges.
    Hierarchy {
        project: String,
        qn: String,
        #[arg(long, default_value = "up")]
        direction: String,
        #[arg(long, default_value_t = 5)]
        max_depth: u32,
    },

    /// What `qn` imports and/or calls.
    Dependencies {
        project: String,
        qn: String,
        #[arg(long, default_value = "all")]
        kind: String,
        #[arg(long)]
        transitive: bool,
    },

    /// Who implements (and optionally inherits from) `qn`.
    Implementations {
        project: String,
        qn: String,
        #[arg(long)]
        include_indirect: bool,
    },

    /// What a module defines and exports.
    ModuleExports {
        project: String,
        module_qn: String,
        #[arg(long)]
        include_private: bool,
    },

    /// The CALLS subgraph reachable from an entry point.
    CallGraph {
        project: String,
        entry_qn: String,
        #[arg(long, default_value_t = 3)]
        max_depth: u32,
        #[arg(long, default_value_t = 50)]
        max_nodes: usize,
    },

    /// Run a guarded read-only Cypher query.
    AdHoc {
        project: String,
        query: String,
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
}
