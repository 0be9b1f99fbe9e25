//! Tool handlers for the MCP server
//!
//! Each handler decodes the raw MCP argument map into a typed input,
//! drives the task registry, and returns a serializable response. The
//! transport layer in `server` turns these into tool-call results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::task::{TaskError, TaskManager, TaskStatusReport, TestDetailsReport};
use gotest_log::parse_with_auto_detection;

// ============================================================================
// Error Types
// ============================================================================

/// Handler errors
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Invalid input - missing or malformed parameters
    #[error("Invalid input: {0}. Check the tool's required parameters.")]
    InvalidInput(String),

    /// Task registry error
    #[error(transparent)]
    Task(#[from] TaskError),

    /// JSON serialization error
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Input Types
// ============================================================================

/// Input for the upload_test_log tool
#[derive(Debug, Clone, Deserialize)]
pub struct UploadInput {
    /// Path to the test log file to analyze
    pub file_path: String,
}

/// Input for the get_analysis_result tool
#[derive(Debug, Clone, Deserialize)]
pub struct QueryInput {
    /// Task id returned by upload_test_log
    pub task_id: String,
}

/// Input for the terminate_task tool
#[derive(Debug, Clone, Deserialize)]
pub struct TerminateInput {
    /// Task id returned by upload_test_log
    pub task_id: String,
}

/// Input for the get_test_details tool
#[derive(Debug, Clone, Deserialize)]
pub struct TestDetailsInput {
    /// Task id returned by upload_test_log
    pub task_id: String,
    /// Name of the test to look up
    pub test_name: String,
}

// ============================================================================
// Output Types
// ============================================================================

/// Response from the upload_test_log tool
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// Id of the created analysis task
    pub task_id: String,
    /// Always "started"
    pub status: String,
    /// Human-readable message
    pub message: String,
}

/// Response from the terminate_task tool
#[derive(Debug, Clone, Serialize)]
pub struct TerminateResponse {
    /// Id of the terminated task
    pub task_id: String,
    /// Always "terminated"
    pub status: String,
    /// Human-readable message
    pub message: String,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Parse input from MCP arguments into a typed struct
fn parse_input<T: for<'de> Deserialize<'de>>(
    args: Option<Map<String, Value>>,
) -> Result<T, HandlerError> {
    let value = args
        .map(Value::Object)
        .unwrap_or(Value::Object(serde_json::Map::new()));
    serde_json::from_value(value).map_err(|e| HandlerError::InvalidInput(e.to_string()))
}

/// Handle the upload_test_log tool
///
/// Creates a task for the file and spawns the parse in the background; the
/// response carries the task id to poll with get_analysis_result.
pub async fn handle_upload(
    manager: &TaskManager,
    args: Option<Map<String, Value>>,
) -> Result<UploadResponse, HandlerError> {
    let input: UploadInput = parse_input(args)?;

    if input.file_path.is_empty() {
        return Err(HandlerError::InvalidInput(
            "file_path parameter is required. Provide the path of a go test log file.".to_string(),
        ));
    }

    let task_id = manager.create(&input.file_path).await;
    info!(task_id = %task_id, file_path = %input.file_path, "starting analysis");
    spawn_analysis(manager.clone(), task_id.clone(), input.file_path);

    Ok(UploadResponse {
        task_id,
        status: "started".to_string(),
        message: "test log analysis task started".to_string(),
    })
}

/// Run the parse on the blocking pool and record the outcome.
fn spawn_analysis(manager: TaskManager, task_id: String, file_path: String) {
    tokio::spawn(async move {
        manager.set_running(&task_id).await;

        let parse = tokio::task::spawn_blocking(move || {
            let file = std::fs::File::open(&file_path)
                .map_err(|e| format!("failed to open file: {e}"))?;
            parse_with_auto_detection(file).map_err(|e| format!("failed to parse test log: {e}"))
        })
        .await;

        match parse {
            Ok(Ok(result)) => manager.set_result(&task_id, result).await,
            Ok(Err(message)) => manager.set_error(&task_id, message).await,
            Err(join_err) => {
                manager
                    .set_error(&task_id, format!("analysis task panicked: {join_err}"))
                    .await;
            }
        }
    });
}

/// Handle the get_analysis_result tool
pub async fn handle_query(
    manager: &TaskManager,
    args: Option<Map<String, Value>>,
) -> Result<TaskStatusReport, HandlerError> {
    let input: QueryInput = parse_input(args)?;

    if input.task_id.is_empty() {
        return Err(HandlerError::InvalidInput(
            "task_id parameter is required. Use the id returned by upload_test_log.".to_string(),
        ));
    }

    Ok(manager.status(&input.task_id).await?)
}

/// Handle the terminate_task tool
pub async fn handle_terminate(
    manager: &TaskManager,
    args: Option<Map<String, Value>>,
) -> Result<TerminateResponse, HandlerError> {
    let input: TerminateInput = parse_input(args)?;

    if input.task_id.is_empty() {
        return Err(HandlerError::InvalidInput(
            "task_id parameter is required. Use the id returned by upload_test_log.".to_string(),
        ));
    }

    manager.terminate(&input.task_id).await?;

    Ok(TerminateResponse {
        task_id: input.task_id,
        status: "terminated".to_string(),
        message: "analysis task terminated".to_string(),
    })
}

/// Handle the get_test_details tool
pub async fn handle_test_details(
    manager: &TaskManager,
    args: Option<Map<String, Value>>,
) -> Result<TestDetailsReport, HandlerError> {
    let input: TestDetailsInput = parse_input(args)?;

    if input.task_id.is_empty() {
        return Err(HandlerError::InvalidInput(
            "task_id parameter is required. Use the id returned by upload_test_log.".to_string(),
        ));
    }
    if input.test_name.is_empty() {
        return Err(HandlerError::InvalidInput(
            "test_name parameter is required. Use a name from the result's test name lists."
                .to_string(),
        ));
    }

    Ok(manager
        .test_details(&input.task_id, &input.test_name)
        .await?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use similar_asserts::assert_eq;

    /// Helper to convert a JSON Value to a Map for testing
    fn to_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("Expected JSON object"),
        }
    }

    #[test]
    fn test_parse_upload_input() {
        let args = to_map(json!({ "file_path": "/tmp/test.log" }));
        let input: UploadInput = parse_input(Some(args)).expect("parse");
        assert_eq!(input.file_path, "/tmp/test.log");
    }

    #[test]
    fn test_parse_upload_input_missing_field() {
        let result: Result<UploadInput, _> = parse_input(None);
        assert!(matches!(result, Err(HandlerError::InvalidInput(_))));
    }

    #[test]
    fn test_parse_test_details_input() {
        let args = to_map(json!({ "task_id": "abc", "test_name": "TestX" }));
        let input: TestDetailsInput = parse_input(Some(args)).expect("parse");
        assert_eq!(input.task_id, "abc");
        assert_eq!(input.test_name, "TestX");
    }

    #[tokio::test]
    async fn test_handle_upload_empty_path() {
        let manager = TaskManager::new();
        let args = to_map(json!({ "file_path": "" }));
        let result = handle_upload(&manager, Some(args)).await;
        assert!(matches!(result, Err(HandlerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_handle_query_unknown_task() {
        let manager = TaskManager::new();
        let args = to_map(json!({ "task_id": "missing" }));
        let result = handle_query(&manager, Some(args)).await;
        assert!(matches!(
            result,
            Err(HandlerError::Task(TaskError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_handle_query_empty_task_id() {
        let manager = TaskManager::new();
        let args = to_map(json!({ "task_id": "" }));
        let result = handle_query(&manager, Some(args)).await;
        assert!(matches!(result, Err(HandlerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_handle_terminate_unknown_task() {
        let manager = TaskManager::new();
        let args = to_map(json!({ "task_id": "missing" }));
        let result = handle_terminate(&manager, Some(args)).await;
        assert!(matches!(
            result,
            Err(HandlerError::Task(TaskError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_handle_test_details_requires_test_name() {
        let manager = TaskManager::new();
        let args = to_map(json!({ "task_id": "abc", "test_name": "" }));
        let result = handle_test_details(&manager, Some(args)).await;
        assert!(matches!(result, Err(HandlerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_handle_upload_missing_file_fails_task() {
        let manager = TaskManager::new();
        let args = to_map(json!({ "file_path": "/nonexistent/path/12345.log" }));
        let response = handle_upload(&manager, Some(args)).await.expect("upload");
        assert_eq!(response.status, "started");

        // The background task should fail to open the file
        let mut report = manager.status(&response.task_id).await.expect("status");
        for _ in 0..100 {
            if report.status.is_finished() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            report = manager.status(&response.task_id).await.expect("status");
        }
        assert_eq!(report.status, crate::task::TaskState::Failed);
        assert!(report.error.expect("error").contains("failed to open file"));
    }
}
