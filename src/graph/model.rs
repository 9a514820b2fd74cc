//! The property-graph data model (spec.md §3): node labels, edge types, and the property
//! value shape the writer and the query layer exchange with the store.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Every node label the ingester emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    Project,
    Package,
    Folder,
    File,
    Module,
    Class,
    Function,
    Method,
    Interface,
    ModuleInterface,
    ModuleImplementation,
    ExternalPackage,
}

impl NodeLabel {
    /// The label string as it appears in Cypher (`CREATE CONSTRAINT ... ON (n:Label)`).
    pub fn as_cypher(&self) -> &'static str {
        match self {
            NodeLabel::Project => "Project",
            NodeLabel::Package => "Package",
            NodeLabel::Folder => "Folder",
            NodeLabel::File => "File",
            NodeLabel::Module => "Module",
            NodeLabel::Class => "Class",
            NodeLabel::Function => "Function",
            NodeLabel::Method => "Method",
            NodeLabel::Interface => "Interface",
            NodeLabel::ModuleInterface => "ModuleInterface",
            NodeLabel::ModuleImplementation => "ModuleImplementation",
            NodeLabel::ExternalPackage => "ExternalPackage",
        }
    }

    /// Every label that carries a `{project, qualified_name}` unique constraint
    /// (spec.md §3 invariant 1). `Project` itself is keyed on `name` alone.
    pub fn code_entity_labels() -> &'static [NodeLabel] {
        &[
            NodeLabel::Package,
            NodeLabel::Folder,
            NodeLabel::File,
            NodeLabel::Module,
            NodeLabel::Class,
            NodeLabel::Function,
            NodeLabel::Method,
            NodeLabel::Interface,
            NodeLabel::ModuleInterface,
            NodeLabel::ModuleImplementation,
            NodeLabel::ExternalPackage,
        ]
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cypher())
    }
}

/// Every relationship type the ingester emits (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    Contains,
    Defines,
    DefinesMethod,
    Imports,
    Inherits,
    Implements,
    Calls,
    Overrides,
    Exports,
}

impl EdgeType {
    pub fn as_cypher(&self) -> &'static str {
        match self {
            EdgeType::Contains => "CONTAINS",
            EdgeType::Defines => "DEFINES",
            EdgeType::DefinesMethod => "DEFINES_METHOD",
            EdgeType::Imports => "IMPORTS",
            EdgeType::Inherits => "INHERITS",
            EdgeType::Implements => "IMPLEMENTS",
            EdgeType::Calls => "CALLS",
            EdgeType::Overrides => "OVERRIDES",
            EdgeType::Exports => "EXPORTS",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cypher())
    }
}

/// A primitive property value. Kept deliberately small (no nested maps) so every
/// value round-trips cleanly through both `neo4rs::BoltType` and `serde_json::Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Bool(bool),
    StrList(Vec<String>),
    Null,
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Str(s.to_string())
    }
}
impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Str(s)
    }
}
impl From<i64> for PropValue {
    fn from(n: i64) -> Self {
        PropValue::Int(n)
    }
}
impl From<usize> for PropValue {
    fn from(n: usize) -> Self {
        PropValue::Int(n as i64)
    }
}
impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}
impl From<Vec<String>> for PropValue {
    fn from(v: Vec<String>) -> Self {
        PropValue::StrList(v)
    }
}

pub type Props = HashMap<String, PropValue>;

/// A node to upsert: its label plus properties. `properties` must contain `project` and
/// `qualified_name` for every label except `Project`, which is keyed on `name` alone.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub label: NodeLabel,
    pub properties: Props,
}

impl NodeSpec {
    pub fn new(label: NodeLabel, properties: Props) -> Self {
        Self { label, properties }
    }

    pub fn qualified_name(&self) -> Option<&str> {
        self.properties.get("qualified_name").and_then(PropValue::as_str)
    }
}

/// An endpoint reference for an edge: the label and qualified name of an already-upserted
/// (or about-to-be-upserted) node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub label: NodeLabel,
    pub qualified_name: String,
}

impl NodeRef {
    pub fn new(label: NodeLabel, qualified_name: impl Into<String>) -> Self {
        Self { label, qualified_name: qualified_name.into() }
    }
}

/// An edge to upsert.
#[derive(Debug, Clone)]
pub struct EdgeSpec {
    pub from: NodeRef,
    pub edge_type: EdgeType,
    pub to: NodeRef,
    pub properties: Props,
}

impl EdgeSpec {
    pub fn new(from: NodeRef, edge_type: EdgeType, to: NodeRef) -> Self {
        Self { from, edge_type, to, properties: Props::new() }
    }
}

/// One result row from `GraphStore::read`: an ordered column → value map, per spec.md §6
/// ("rows are returned as ordered column→value maps").
pub type Row = IndexMap<String, serde_json::Value>;
