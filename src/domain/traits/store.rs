use async_trait::async_trait;
use crate::application::errors::StorageError;
use crate::domain::entities::{Task, TaskId};

/// Task store - workspace-scoped persistence for TODO records.
///
/// Mutations on one workspace are serialized by the implementation;
/// different workspaces are independent.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create a task with the next id for the workspace.
    /// Fails with `InvalidContent` when the trimmed content is empty.
    async fn add(&self, workspace_id: &str, content: &str) -> Result<Task, StorageError>;

    /// All tasks of the workspace in creation order
    async fn list(&self, workspace_id: &str) -> Result<Vec<Task>, StorageError>;

    /// Mark a task completed. Completing twice keeps the first timestamp.
    async fn complete(&self, workspace_id: &str, id: TaskId) -> Result<Task, StorageError>;

    async fn delete(&self, workspace_id: &str, id: TaskId) -> Result<(), StorageError>;
}
