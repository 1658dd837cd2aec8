//! Unfiltered knowledge-base search.

use async_trait::async_trait;
use ragwise_core::error::ToolError;
use ragwise_core::tool::{Tool, ToolResult};
use ragwise_retrieval::CachedRetrievalClient;

pub struct RetrieveTool {
    client: CachedRetrievalClient,
    k: usize,
}

impl RetrieveTool {
    pub fn new(client: CachedRetrievalClient, k: usize) -> Self {
        Self { client, k }
    }
}

#[async_trait]
impl Tool for RetrieveTool {
    fn name(&self) -> &str {
        crate::RETRIEVE
    }

    fn description(&self) -> &str {
        "Retrieve information related to a query from the enterprise knowledge base."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let output = self.client.retrieve_formatted(query, self.k, None).await;

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
        })
    }
}
