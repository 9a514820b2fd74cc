//! Configuration surface enumerated in spec.md §6: `graph.*`, `ingest.*`, `query.*`.
//!
//! Loaded from `codegraph.toml` at the project root, the same way the teacher crate's
//! `CodeGraphConfig` loaded `code-graph.toml`, with environment overrides (`CODEGRAPH_*`)
//! applied on top — every field below can be set either way. Invalid values are rejected
//! at startup with `ErrorCode::InvalidArguments`, never silently clamped.

use std::path::Path;

use once_cell_compat::regex_project_name;
use serde::Deserialize;

use crate::error::{Error, Result};

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    7687
}
fn default_batch_size() -> usize {
    1000
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_query_timeout_ms() -> u64 {
    5000
}
fn default_ad_hoc_timeout_ms() -> u64 {
    10000
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: None,
            batch_size: default_batch_size(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestConfig {
    pub project_name: Option<String>,
    pub repo_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_query_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "default_ad_hoc_timeout_ms")]
    pub ad_hoc_timeout_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_query_timeout_ms(),
            ad_hoc_timeout_ms: default_ad_hoc_timeout_ms(),
        }
    }
}

/// Configuration loaded from `codegraph.toml` at the project root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub query: QueryConfig,
    /// Additional path patterns to exclude from indexing (beyond .gitignore and node_modules).
    pub exclude: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from `codegraph.toml` in the given root directory, then apply
    /// `CODEGRAPH_*` environment overrides, then validate.
    ///
    /// Returns a default configuration if the file does not exist or cannot be parsed
    /// (a warning is logged either way) — validation still runs against the result.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join("codegraph.toml");

        let mut config = if !config_path.exists() {
            Self::default()
        } else {
            match std::fs::read_to_string(&config_path) {
                Ok(contents) => match toml::from_str::<Self>(&contents) {
                    Ok(config) => config,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to parse codegraph.toml, using defaults");
                        Self::default()
                    }
                },
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read codegraph.toml, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CODEGRAPH_GRAPH_HOST") {
            self.graph.host = v;
        }
        if let Ok(v) = std::env::var("CODEGRAPH_GRAPH_PORT") {
            if let Ok(port) = v.parse() {
                self.graph.port = port;
            }
        }
        if let Ok(v) = std::env::var("CODEGRAPH_GRAPH_DATABASE") {
            self.graph.database = Some(v);
        }
        if let Ok(v) = std::env::var("CODEGRAPH_GRAPH_BATCH_SIZE") {
            if let Ok(n) = v.parse() {
                self.graph.batch_size = n;
            }
        }
        if let Ok(v) = std::env::var("CODEGRAPH_INGEST_PROJECT_NAME") {
            self.ingest.project_name = Some(v);
        }
        if let Ok(v) = std::env::var("CODEGRAPH_INGEST_REPO_PATH") {
            self.ingest.repo_path = Some(v);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.graph.batch_size < 1 {
            return Err(Error::invalid_arguments("graph.batch_size must be >= 1"));
        }
        if let Some(name) = &self.ingest.project_name {
            validate_project_name(name)?;
        }
        Ok(())
    }
}

/// Validate a project name against the `[A-Za-z0-9_-]+` pattern required by spec.md §6.
///
/// Also used to validate the Memgraph `database_name`, mirroring
/// `MemgraphIngestor.validate_database_name` in the original Python contract — both fields
/// share the same safe-character requirement.
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() || !regex_project_name().is_match(name) {
        return Err(Error::invalid_arguments(format!(
            "invalid project name '{name}': must match [A-Za-z0-9_-]+"
        )));
    }
    Ok(())
}

/// Tiny wrapper module so the compiled regex is built once per process without pulling in
/// a new top-level dependency — `regex` is already in the dependency graph.
mod once_cell_compat {
    use std::sync::OnceLock;

    use regex::Regex;

    pub fn regex_project_name() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_project_name() {
        assert!(validate_project_name("").is_err());
    }

    #[test]
    fn rejects_project_name_with_dots() {
        assert!(validate_project_name("my.project").is_err());
    }

    #[test]
    fn accepts_hyphenated_project_name() {
        assert!(validate_project_name("my-project_1").is_ok());
    }

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut config = Config::default();
        config.graph.batch_size = 0;
        assert!(config.validate().is_err());
    }
}
