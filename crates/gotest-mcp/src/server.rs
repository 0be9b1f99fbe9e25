//! MCP server implementation for gotest-mcp
//!
//! This module provides the MCP server handler that exposes test log
//! analysis (upload, result query, termination, per-test details) to LLMs
//! via MCP tool calls over stdio.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::McpServer;
use rust_mcp_sdk::mcp_server::ServerHandler;
use rust_mcp_sdk::schema::{
    CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams, RpcError,
    TextContent, Tool, ToolInputSchema, schema_utils::CallToolError,
};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::handlers::{self, HandlerError};
use crate::task::TaskManager;

/// Convert a JSON object into the properties format expected by ToolInputSchema.
///
/// ToolInputSchema expects `HashMap<String, Map<String, Value>>` for properties,
/// where each key maps to a JSON object describing that property's schema.
fn make_properties(json_obj: Value) -> HashMap<String, Map<String, Value>> {
    let mut properties = HashMap::new();
    if let Value::Object(obj) = json_obj {
        for (key, value) in obj {
            if let Value::Object(inner) = value {
                properties.insert(key, inner);
            }
        }
    }
    properties
}

/// The gotest MCP server handler
///
/// Holds the shared task registry; each tool call drives it through the
/// typed handlers in [`crate::handlers`].
pub struct GotestServer {
    tasks: TaskManager,
}

impl GotestServer {
    /// Create a new server handler over the given task registry
    #[must_use]
    pub fn new(tasks: TaskManager) -> Self {
        Self { tasks }
    }

    /// Get the underlying task registry
    #[must_use]
    pub fn tasks(&self) -> &TaskManager {
        &self.tasks
    }

    /// Build the list of available tools
    fn build_tools() -> Vec<Tool> {
        vec![
            Self::upload_tool(),
            Self::query_tool(),
            Self::terminate_tool(),
            Self::test_details_tool(),
        ]
    }

    fn upload_tool() -> Tool {
        Tool {
            name: "upload_test_log".into(),
            description: Some(
                "Upload a go test log file (JSON event stream or console text) for \
                 analysis. Returns a task id to poll with get_analysis_result."
                    .into(),
            ),
            input_schema: ToolInputSchema::new(
                vec!["file_path".into()],
                Some(make_properties(json!({
                    "file_path": {
                        "type": "string",
                        "description": "Path to the go test output file"
                    }
                }))),
                None,
            ),
            annotations: None,
            execution: None,
            icons: vec![],
            meta: None,
            output_schema: None,
            title: Some("Upload Test Log".into()),
        }
    }

    fn query_tool() -> Tool {
        Tool {
            name: "get_analysis_result".into(),
            description: Some(
                "Get the status and aggregate result of an analysis task by its id.".into(),
            ),
            input_schema: ToolInputSchema::new(
                vec!["task_id".into()],
                Some(make_properties(json!({
                    "task_id": {
                        "type": "string",
                        "description": "Task id returned by upload_test_log"
                    }
                }))),
                None,
            ),
            annotations: None,
            execution: None,
            icons: vec![],
            meta: None,
            output_schema: None,
            title: Some("Analysis Result".into()),
        }
    }

    fn terminate_tool() -> Tool {
        Tool {
            name: "terminate_task".into(),
            description: Some("Terminate a running analysis task.".into()),
            input_schema: ToolInputSchema::new(
                vec!["task_id".into()],
                Some(make_properties(json!({
                    "task_id": {
                        "type": "string",
                        "description": "Task id returned by upload_test_log"
                    }
                }))),
                None,
            ),
            annotations: None,
            execution: None,
            icons: vec![],
            meta: None,
            output_schema: None,
            title: Some("Terminate Task".into()),
        }
    }

    fn test_details_tool() -> Tool {
        Tool {
            name: "get_test_details".into(),
            description: Some(
                "Get the captured output, extracted error and timing of a single test \
                 from a completed analysis task."
                    .into(),
            ),
            input_schema: ToolInputSchema::new(
                vec!["task_id".into(), "test_name".into()],
                Some(make_properties(json!({
                    "task_id": {
                        "type": "string",
                        "description": "Task id returned by upload_test_log"
                    },
                    "test_name": {
                        "type": "string",
                        "description": "Test name, e.g. TestFoo or TestFoo/sub_case"
                    }
                }))),
                None,
            ),
            annotations: None,
            execution: None,
            icons: vec![],
            meta: None,
            output_schema: None,
            title: Some("Test Details".into()),
        }
    }
}

/// Serialize a handler result as pretty JSON for the text content block
fn to_json<T: Serialize>(result: Result<T, HandlerError>) -> Result<String, HandlerError> {
    result.and_then(|value| serde_json::to_string_pretty(&value).map_err(HandlerError::from))
}

/// ServerHandler implementation for the MCP protocol
#[async_trait]
impl ServerHandler for GotestServer {
    /// Handle requests to list available tools
    async fn handle_list_tools_request(
        &self,
        _params: Option<PaginatedRequestParams>,
        _runtime: Arc<dyn McpServer>,
    ) -> Result<ListToolsResult, RpcError> {
        Ok(ListToolsResult {
            tools: Self::build_tools(),
            meta: None,
            next_cursor: None,
        })
    }

    /// Handle requests to call a specific tool
    async fn handle_call_tool_request(
        &self,
        params: CallToolRequestParams,
        _runtime: Arc<dyn McpServer>,
    ) -> Result<CallToolResult, CallToolError> {
        tracing::debug!(tool = %params.name, "Calling tool");

        let result = match params.name.as_str() {
            "upload_test_log" => to_json(handlers::handle_upload(&self.tasks, params.arguments).await),
            "get_analysis_result" => {
                to_json(handlers::handle_query(&self.tasks, params.arguments).await)
            }
            "terminate_task" => {
                to_json(handlers::handle_terminate(&self.tasks, params.arguments).await)
            }
            "get_test_details" => {
                to_json(handlers::handle_test_details(&self.tasks, params.arguments).await)
            }
            _ => return Err(CallToolError::unknown_tool(&params.name)),
        };

        match result {
            Ok(text) => Ok(CallToolResult::text_content(vec![TextContent::new(
                text, None, None,
            )])),
            Err(err) => Err(CallToolError::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tools() {
        let tools = GotestServer::build_tools();
        assert_eq!(tools.len(), 4);

        let tool_names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert!(tool_names.contains(&"upload_test_log"));
        assert!(tool_names.contains(&"get_analysis_result"));
        assert!(tool_names.contains(&"terminate_task"));
        assert!(tool_names.contains(&"get_test_details"));
    }

    #[test]
    fn test_tool_schemas_have_properties() {
        let tools = GotestServer::build_tools();
        for tool in tools {
            assert!(
                tool.input_schema.properties.is_some(),
                "Tool {} should have properties",
                tool.name
            );
        }
    }

    #[test]
    fn test_server_creation() {
        let server = GotestServer::new(TaskManager::new());
        // The registry starts empty
        let tasks = server.tasks().clone();
        let reports = tokio::runtime::Runtime::new()
            .expect("runtime")
            .block_on(async move { tasks.list().await });
        assert!(reports.is_empty());
    }
}
