//! Knowledge-base search narrowed by document metadata.

use async_trait::async_trait;
use ragwise_core::error::ToolError;
use ragwise_core::retrieval::{Department, DocType, FilterSet};
use ragwise_core::tool::{Tool, ToolResult};
use ragwise_retrieval::CachedRetrievalClient;
use std::str::FromStr;
use tracing::debug;

pub struct RetrieveWithFiltersTool {
    client: CachedRetrievalClient,
    k: usize,
}

impl RetrieveWithFiltersTool {
    pub fn new(client: CachedRetrievalClient, k: usize) -> Self {
        Self { client, k }
    }
}

/// A string argument naming an enum value. Absent, "any" and unknown
/// values all mean "no constraint".
fn enum_arg<T: FromStr>(arguments: &serde_json::Value, key: &str) -> Option<T> {
    let raw = arguments[key].as_str()?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("any") {
        return None;
    }
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!(key, value = raw, "Ignoring unrecognized filter value");
            None
        }
    }
}

/// Models send the year either as a number or as a numeric string.
fn year_arg(arguments: &serde_json::Value) -> Option<i32> {
    match &arguments["year"] {
        serde_json::Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Build the filter set described by tool arguments.
pub fn filters_from_arguments(arguments: &serde_json::Value) -> FilterSet {
    FilterSet {
        department: enum_arg::<Department>(arguments, "department"),
        doc_type: enum_arg::<DocType>(arguments, "doc_type"),
        year: year_arg(arguments),
        security_level: None,
    }
}

#[async_trait]
impl Tool for RetrieveWithFiltersTool {
    fn name(&self) -> &str {
        crate::RETRIEVE_WITH_FILTERS
    }

    fn description(&self) -> &str {
        "Retrieve information from the enterprise knowledge base, restricted by department, document type and/or year."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        let departments: Vec<&str> = Department::ALL.iter().map(|d| d.as_str()).collect();
        let doc_types: Vec<&str> = DocType::ALL.iter().map(|d| d.as_str()).collect();
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for"
                },
                "department": {
                    "type": "string",
                    "description": "Owning department",
                    "enum": departments
                },
                "doc_type": {
                    "type": "string",
                    "description": "Kind of document",
                    "enum": doc_types
                },
                "year": {
                    "type": "integer",
                    "description": "Publication year"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let filters = filters_from_arguments(&arguments);
        let output = self
            .client
            .retrieve_formatted(query, self.k, Some(&filters))
            .await;

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
        })
    }
}
