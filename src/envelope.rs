//! The uniform response wrapper every tool invocation returns (spec.md §6).
//!
//! Grounded in `original_source/codebase_rag/http/models.py`'s `ResponseEnvelope`, whose
//! `validate_xor` model-validator enforces `success=true ⇔ data present ∧ error/code absent`
//! at runtime. Here the same invariant is a type-level guarantee: the only way to build an
//! `Envelope` is through `ok`/`err`, so a malformed envelope cannot be constructed.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, ErrorCode};

#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    pub request_id: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, Value>>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T, request_id: impl Into<String>, meta: HashMap<String, Value>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            request_id: request_id.into(),
            timestamp: now_iso8601(),
            meta: if meta.is_empty() { None } else { Some(meta) },
        }
    }

    pub fn err(error: &Error, request_id: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.message.clone()),
            code: Some(error.code),
            request_id: request_id.into(),
            timestamp: now_iso8601(),
            meta: error.suggestion.clone().map(|s| {
                let mut m = HashMap::new();
                m.insert("suggestion".to_string(), Value::String(s));
                m
            }),
        }
    }
}

/// Generate a fresh request id for calls that did not supply one.
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Build a timing entry for `meta.execution_time_ms` (spec.md §4.5 "Timing").
pub fn timing_meta(execution_time_ms: u128) -> HashMap<String, Value> {
    let mut meta = HashMap::new();
    meta.insert("execution_time_ms".to_string(), Value::from(execution_time_ms as u64));
    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_serializes_without_error_fields() {
        let env = Envelope::ok(vec![1, 2, 3], "req-1", HashMap::new());
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], Value::Bool(true));
        assert!(json.get("error").is_none());
        assert!(json.get("code").is_none());
    }

    #[test]
    fn err_envelope_serializes_without_data_field() {
        let err = Error::node_not_found("proj.x");
        let env: Envelope<()> = Envelope::err(&err, "req-2");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], Value::Bool(false));
        assert!(json.get("data").is_none());
        assert_eq!(json["code"], Value::String("NODE_NOT_FOUND".to_string()));
    }
}
