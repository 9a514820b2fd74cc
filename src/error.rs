//! Typed error taxonomy shared by ingestion, the graph writer, and the query layer.

use serde::Serialize;

/// Wire-level error code. `Display`s as the exact string used in [`crate::envelope::Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    #[error("TOOL_NOT_FOUND")]
    ToolNotFound,
    #[error("INVALID_ARGUMENTS")]
    InvalidArguments,
    #[error("EXECUTION_ERROR")]
    ExecutionError,
    #[error("INTERNAL_ERROR")]
    InternalError,
    #[error("TIMEOUT")]
    Timeout,
    #[error("RATE_LIMITED")]
    RateLimited,
    #[error("SERVICE_UNAVAILABLE")]
    ServiceUnavailable,
    #[error("NODE_NOT_FOUND")]
    NodeNotFound,
    #[error("QUERY_TIMEOUT")]
    QueryTimeout,
    #[error("FORBIDDEN_OPERATION")]
    ForbiddenOperation,
}

/// The crate's typed result error: a code, a short human message, and an optional
/// suggestion string (spec.md §7: "suggestion text accompanies common misuses").
#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[error("{message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub suggestion: Option<String>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), suggestion: None }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArguments, message)
    }

    pub fn node_not_found(qualified_name: &str) -> Self {
        Self::new(ErrorCode::NodeNotFound, format!("'{qualified_name}' not found in the graph"))
            .with_suggestion(
                "check that the project was ingested, that the qualified name is \
                 dotted (project.module.Class.method), and that case matches exactly"
                    .to_string(),
            )
    }

    pub fn forbidden_operation(keyword: &str) -> Self {
        Self::new(
            ErrorCode::ForbiddenOperation,
            format!("query contains forbidden keyword '{keyword}'"),
        )
        .with_suggestion("the ad_hoc tool only accepts read-only queries".to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl From<neo4rs::Error> for Error {
    fn from(err: neo4rs::Error) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_not_found_carries_suggestion() {
        let err = Error::node_not_found("proj.nope.fn");
        assert_eq!(err.code, ErrorCode::NodeNotFound);
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn error_code_display_matches_wire_string() {
        assert_eq!(ErrorCode::QueryTimeout.to_string(), "QUERY_TIMEOUT");
        assert_eq!(ErrorCode::ForbiddenOperation.to_string(), "FORBIDDEN_OPERATION");
    }
}
