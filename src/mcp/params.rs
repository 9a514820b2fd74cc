use std::collections::HashMap;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

fn default_max_depth_5() -> u32 {
    5
}
fn default_max_depth_10() -> u32 {
    10
}
fn default_max_depth_3() -> u32 {
    3
}
fn default_direction() -> String {
    "up".to_string()
}
fn default_kind() -> String {
    "all".to_string()
}
fn default_max_nodes() -> usize {
    50
}
fn default_limit() -> i64 {
    50
}

#[derive(Deserialize, JsonSchema)]
pub struct CallersParams {
    /// Project name the symbol belongs to.
    pub project: String,
    /// Fully-qualified name of the callee, e.g. `myapp.service.UserService.save`.
    pub qn: String,
    /// How many CALLS hops to follow (1..=5).
    #[serde(default = "default_max_depth_5")]
    pub max_depth: u32,
    /// Include the full call chain, not just the caller itself.
    #[serde(default)]
    pub include_paths: bool,
}

#[derive(Deserialize, JsonSchema)]
pub struct HierarchyParams {
    pub project: String,
    /// Fully-qualified name of the class or interface.
    pub qn: String,
    /// `up` (supertypes), `down` (subtypes), or `both`.
    #[serde(default = "default_direction")]
    pub direction: String,
    /// How many INHERITS hops to follow (1..=10).
    #[serde(default = "default_max_depth_10")]
    pub max_depth: u32,
}

#[derive(Deserialize, JsonSchema)]
pub struct DependenciesParams {
    pub project: String,
    pub qn: String,
    /// `imports`, `calls`, or `all`.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Follow transitively (depth 3) instead of just one hop.
    #[serde(default)]
    pub transitive: bool,
}

#[derive(Deserialize, JsonSchema)]
pub struct ImplementationsParams {
    pub project: String,
    /// Fully-qualified name of the interface or base class.
    pub qn: String,
    /// Also include subclasses reached through INHERITS, not just IMPLEMENTS.
    #[serde(default)]
    pub include_indirect: bool,
}

#[derive(Deserialize, JsonSchema)]
pub struct ModuleExportsParams {
    pub project: String,
    /// Fully-qualified name of the module/file.
    pub module_qn: String,
    /// Include underscore-prefixed (conventionally private) names.
    #[serde(default)]
    pub include_private: bool,
}

#[derive(Deserialize, JsonSchema)]
pub struct CallGraphParams {
    pub project: String,
    /// Fully-qualified name of the entry-point function/method.
    pub entry_qn: String,
    #[serde(default = "default_max_depth_3")]
    pub max_depth: u32,
    /// Cap on the number of distinct nodes returned (1..=100).
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

#[derive(Deserialize, JsonSchema)]
pub struct AdHocParams {
    pub project: String,
    /// A read-only Cypher query. CREATE/MERGE/DELETE/SET/REMOVE/DROP are rejected.
    pub query: String,
    /// Bind parameters referenced in `query` as `$name`. Values must be primitives.
    #[serde(default)]
    pub params: HashMap<String, Value>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}
