//! Analysis task registry
//!
//! Each uploaded log becomes a task: parsing runs in the background while
//! callers poll for status by task id. Tasks live in memory only; a
//! periodic cleanup drops entries past the configured retention age.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use gotest_log::{TestResult, TestStatus};

// ============================================================================
// Task model
// ============================================================================

/// Lifecycle states of an analysis task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Created but not yet picked up
    Pending,
    /// Parse in progress
    Running,
    /// Parse finished, result available
    Completed,
    /// Parse failed, error available
    Failed,
    /// Canceled before completion
    Canceled,
}

impl TaskState {
    /// Whether the task has reached a terminal state
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled
        )
    }

    /// String form matching the serialized representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log-analysis task
#[derive(Debug, Clone)]
struct Task {
    id: String,
    file_path: String,
    state: TaskState,
    result: Option<TestResult>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Task registry errors
#[derive(Debug, Error)]
pub enum TaskError {
    /// No task with the given id
    #[error("task not found: {0}")]
    NotFound(String),

    /// The task already reached a terminal state
    #[error("task {id} is already finished with status: {state}")]
    AlreadyFinished {
        /// Task id
        id: String,
        /// Terminal state the task is in
        state: TaskState,
    },

    /// The task has not produced a result yet
    #[error("task {id} has no result yet (status: {state})")]
    NotCompleted {
        /// Task id
        id: String,
        /// Current state of the task
        state: TaskState,
    },

    /// The completed result does not contain the requested test
    #[error("test not found: {0}")]
    TestNotFound(String),
}

// ============================================================================
// Reports
// ============================================================================

/// Snapshot of a task, as returned by the status query
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusReport {
    /// Task id
    pub task_id: String,
    /// Current lifecycle state
    pub status: TaskState,
    /// Path of the uploaded log file
    pub file_path: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last state-change timestamp
    pub updated_at: DateTime<Utc>,
    /// Error description, present when the task failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Aggregate result, present when the task completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultSummary>,
}

/// Aggregate counts reported for a completed task
#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    /// Total number of tests with a terminal outcome
    pub total_tests: usize,
    /// Number of passed tests
    pub passed_tests: usize,
    /// Number of failed tests
    pub failed_tests: usize,
    /// Number of skipped tests
    pub skipped_tests: usize,
    /// Failed test names, in terminal-event order
    pub failed_test_names: Vec<String>,
    /// Passed test names, in terminal-event order
    pub passed_test_names: Vec<String>,
}

impl From<&TestResult> for ResultSummary {
    fn from(result: &TestResult) -> Self {
        Self {
            total_tests: result.total_tests,
            passed_tests: result.passed_tests,
            failed_tests: result.failed_tests,
            skipped_tests: result.skipped_tests,
            failed_test_names: result.failed_test_names.clone(),
            passed_test_names: result.passed_test_names.clone(),
        }
    }
}

/// Detail for a single test within a completed task
#[derive(Debug, Clone, Serialize)]
pub struct TestDetailsReport {
    /// Test name as it appeared in the log
    pub test_name: String,
    /// Final classification
    pub status: TestStatus,
    /// Full captured output
    pub output: String,
    /// Extracted diagnostic, only meaningful on `fail`
    pub error: String,
    /// Elapsed seconds
    pub elapsed: f64,
}

// ============================================================================
// Task Manager
// ============================================================================

/// Registry of analysis tasks keyed by id
///
/// Cloning is cheap; all clones share the same task table.
#[derive(Clone, Default)]
pub struct TaskManager {
    tasks: Arc<Mutex<HashMap<String, Task>>>,
}

impl TaskManager {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending task for the given log file, returning its id
    pub async fn create(&self, file_path: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let task = Task {
            id: id.clone(),
            file_path: file_path.to_string(),
            state: TaskState::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.tasks.lock().await.insert(id.clone(), task);
        debug!(task_id = %id, file_path, "task created");
        id
    }

    /// Mark a task as running
    pub async fn set_running(&self, id: &str) {
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.get_mut(id) {
            if !task.state.is_finished() {
                task.state = TaskState::Running;
                task.updated_at = Utc::now();
            }
        }
    }

    /// Store a completed parse, unless the task was canceled meanwhile
    pub async fn set_result(&self, id: &str, result: TestResult) {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.get_mut(id) else {
            return;
        };
        if task.state == TaskState::Canceled {
            warn!(task_id = %id, "discarding result for canceled task");
            return;
        }
        info!(
            task_id = %id,
            total = result.total_tests,
            failed = result.failed_tests,
            "analysis completed"
        );
        task.result = Some(result);
        task.state = TaskState::Completed;
        task.updated_at = Utc::now();
    }

    /// Record a failed parse, unless the task was canceled meanwhile
    pub async fn set_error(&self, id: &str, error: String) {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.get_mut(id) else {
            return;
        };
        if task.state == TaskState::Canceled {
            warn!(task_id = %id, "discarding error for canceled task");
            return;
        }
        info!(task_id = %id, error, "analysis failed");
        task.error = Some(error);
        task.state = TaskState::Failed;
        task.updated_at = Utc::now();
    }

    /// Snapshot a task's current status
    pub async fn status(&self, id: &str) -> Result<TaskStatusReport, TaskError> {
        let tasks = self.tasks.lock().await;
        let task = tasks.get(id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        Ok(report_for(task))
    }

    /// Cooperatively cancel a task that has not finished yet
    ///
    /// A parse already in flight is not interrupted; its eventual result is
    /// discarded instead of overwriting the canceled state.
    pub async fn terminate(&self, id: &str) -> Result<(), TaskError> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        if task.state.is_finished() {
            return Err(TaskError::AlreadyFinished {
                id: id.to_string(),
                state: task.state,
            });
        }
        task.state = TaskState::Canceled;
        task.updated_at = Utc::now();
        info!(task_id = %id, "task canceled");
        Ok(())
    }

    /// Look up one test's detail within a completed task
    pub async fn test_details(
        &self,
        id: &str,
        test_name: &str,
    ) -> Result<TestDetailsReport, TaskError> {
        let tasks = self.tasks.lock().await;
        let task = tasks.get(id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        let result = task.result.as_ref().ok_or(TaskError::NotCompleted {
            id: id.to_string(),
            state: task.state,
        })?;
        let detail = result
            .detail(test_name)
            .ok_or_else(|| TaskError::TestNotFound(test_name.to_string()))?;
        Ok(TestDetailsReport {
            test_name: test_name.to_string(),
            status: detail.status,
            output: detail.output.clone(),
            error: detail.error.clone(),
            elapsed: detail.elapsed,
        })
    }

    /// Snapshot all registered tasks, oldest first
    pub async fn list(&self) -> Vec<TaskStatusReport> {
        let tasks = self.tasks.lock().await;
        let mut reports: Vec<TaskStatusReport> = tasks.values().map(report_for).collect();
        reports.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        reports
    }

    /// Drop tasks created more than `max_age` ago, returning how many were
    /// removed
    pub async fn cleanup_older_than(&self, max_age: Duration) -> usize {
        let mut tasks = self.tasks.lock().await;
        let cutoff = Utc::now() - max_age;
        let before = tasks.len();
        tasks.retain(|_, task| task.created_at > cutoff);
        let removed = before - tasks.len();
        if removed > 0 {
            info!(removed, "cleaned up stale tasks");
        }
        removed
    }
}

fn report_for(task: &Task) -> TaskStatusReport {
    TaskStatusReport {
        task_id: task.id.clone(),
        status: task.state,
        file_path: task.file_path.clone(),
        created_at: task.created_at,
        updated_at: task.updated_at,
        error: task.error.clone(),
        result: task.result.as_ref().map(ResultSummary::from),
    }
}
