//! `ad_hoc` tool (spec.md §4.5): the one guarded escape hatch for queries the seven prebuilt
//! tools don't cover. Textually rejects mutation keywords rather than trying to parse Cypher,
//! mirroring the tool's own framing ("parses the query textually").

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::graph::model::{PropValue, Props, Row};
use crate::graph::writer::GraphWriter;

use super::AD_HOC_TRUNCATION;

const FORBIDDEN_KEYWORDS: &[&str] =
    &["CREATE", "MERGE", "DELETE", "SET", "REMOVE", "DROP"];

#[derive(Debug, Clone, Serialize)]
pub struct AdHocResult {
    pub rows: Vec<Row>,
    pub total_count: usize,
    pub shown_count: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

fn keyword_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = FORBIDDEN_KEYWORDS.join("|");
        Regex::new(&format!(r"(?i)\b({alternation})\b")).unwrap()
    })
}

fn limit_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bLIMIT\b").unwrap())
}

/// A permissive label-name sniff, used only to give `FakeGraphStore` something to scan on in
/// tests — a real Cypher engine ignores this parameter entirely.
fn sniff_label(query: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r":(\p{Alphabetic}\w*)").unwrap());
    re.captures(query).map(|c| c[1].to_string())
}

/// The args-only half of `ad_hoc`'s validation — no store access, so CLI/MCP front ends can
/// reject a bad query before ever opening a connection (spec.md §7 "Validation ... surfaced
/// synchronously, never retried").
pub fn validate_args(query: &str, limit: i64) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::invalid_arguments("query must not be empty"));
    }
    if !(1..=1000).contains(&limit) {
        return Err(Error::invalid_arguments("limit must be between 1 and 1000")
            .with_suggestion("pick a limit in 1..=1000"));
    }
    if let Some(hit) = keyword_pattern().find(query) {
        return Err(Error::forbidden_operation(hit.as_str()));
    }
    Ok(())
}

pub async fn ad_hoc(
    writer: &GraphWriter,
    project: &str,
    query: &str,
    params: HashMap<String, JsonValue>,
    limit: i64,
) -> Result<AdHocResult> {
    validate_args(query, limit)?;

    let mut bolt_params = Props::new();
    for (key, value) in &params {
        bolt_params.insert(key.clone(), json_to_prop_value(value).ok_or_else(|| {
            Error::invalid_arguments(format!(
                "param '{key}' must be a string, number, boolean, or null — arrays/objects are rejected"
            ))
        })?);
    }
    bolt_params.insert("__tool".to_string(), PropValue::Str("ad_hoc_scan".to_string()));
    bolt_params.insert("project".to_string(), PropValue::Str(project.to_string()));
    bolt_params.insert("limit".to_string(), PropValue::Int((limit + 1).min(AD_HOC_TRUNCATION as i64 + 1)));
    if let Some(label) = sniff_label(query) {
        bolt_params.insert("label".to_string(), PropValue::Str(label));
    }

    let rows = writer.read(query, bolt_params).await?;

    let effective_limit = (limit as usize).min(AD_HOC_TRUNCATION);
    let total_count = rows.len();
    let truncated = total_count > effective_limit;
    let mut shown = rows;
    shown.truncate(effective_limit);
    let shown_count = shown.len();

    let mut warning = truncated
        .then(|| format!("showing {shown_count}/{total_count}; add a narrower filter or a smaller limit"));
    if !limit_pattern().is_match(query) {
        let note = "query has no LIMIT clause; relying on the tool's own bound".to_string();
        warning = Some(match warning {
            Some(existing) => format!("{existing}; {note}"),
            None => note,
        });
    }

    Ok(AdHocResult { rows: shown, total_count, shown_count, truncated, warning })
}

fn json_to_prop_value(value: &JsonValue) -> Option<PropValue> {
    match value {
        JsonValue::String(s) => Some(PropValue::Str(s.clone())),
        JsonValue::Number(n) => n.as_i64().map(PropValue::Int),
        JsonValue::Bool(b) => Some(PropValue::Bool(*b)),
        JsonValue::Null => Some(PropValue::Null),
        JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fake_store::FakeGraphStore;
    use crate::graph::model::{NodeLabel, Props, PropValue};

    #[tokio::test]
    async fn rejects_mutation_keywords() {
        let store = FakeGraphStore::new();
        let writer = GraphWriter::connect(Box::new(store), 10).await.unwrap();
        let err = ad_hoc(&writer, "demo", "MATCH (n) DETACH DELETE n", HashMap::new(), 10)
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ForbiddenOperation);
    }

    #[tokio::test]
    async fn rejects_non_primitive_params() {
        let store = FakeGraphStore::new();
        let writer = GraphWriter::connect(Box::new(store), 10).await.unwrap();
        let mut params = HashMap::new();
        params.insert("bad".to_string(), serde_json::json!(["nested"]));
        let err = ad_hoc(&writer, "demo", "MATCH (n:Function) RETURN n LIMIT 10", params, 10)
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidArguments);
    }

    #[tokio::test]
    async fn scans_by_sniffed_label_and_warns_without_limit() {
        let store = FakeGraphStore::new();
        let mut writer = GraphWriter::connect(Box::new(store), 10).await.unwrap();
        let mut props = Props::new();
        props.insert("project".into(), PropValue::Str("demo".into()));
        props.insert("qualified_name".into(), PropValue::Str("demo.f".into()));
        writer.upsert_node(NodeLabel::Function, props).await.unwrap();
        writer.flush().await.unwrap();

        let result = ad_hoc(&writer, "demo", "MATCH (n:Function) RETURN n", HashMap::new(), 10)
            .await
            .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert!(result.warning.as_deref().unwrap_or("").contains("no LIMIT"));
    }
}
