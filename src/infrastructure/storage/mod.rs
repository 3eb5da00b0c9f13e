//! In-memory task storage

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::{normalize_content, Task, TaskId};
use crate::domain::traits::TaskStore;

/// Tasks of one workspace plus its id counter
#[derive(Debug)]
struct WorkspaceTasks {
    next_id: TaskId,
    // Ids are handed out in creation order, so key order is creation order
    tasks: BTreeMap<TaskId, Task>,
}

impl Default for WorkspaceTasks {
    fn default() -> Self {
        Self {
            next_id: 1,
            tasks: BTreeMap::new(),
        }
    }
}

/// Process-local store. Each workspace has its own lock: mutations take
/// it exclusively, listings share it.
#[derive(Default)]
pub struct MemoryStore {
    workspaces: RwLock<HashMap<String, Arc<RwLock<WorkspaceTasks>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn existing(&self, workspace_id: &str) -> Option<Arc<RwLock<WorkspaceTasks>>> {
        self.workspaces.read().await.get(workspace_id).cloned()
    }

    async fn get_or_create(&self, workspace_id: &str) -> Arc<RwLock<WorkspaceTasks>> {
        if let Some(ws) = self.existing(workspace_id).await {
            return ws;
        }
        let mut workspaces = self.workspaces.write().await;
        workspaces
            .entry(workspace_id.to_string())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn add(&self, workspace_id: &str, content: &str) -> Result<Task, StorageError> {
        let content = normalize_content(content).ok_or(StorageError::InvalidContent)?;

        let ws = self.get_or_create(workspace_id).await;
        let mut ws = ws.write().await;
        let id = ws.next_id;
        ws.next_id += 1;

        let task = Task::new(workspace_id, id, content);
        ws.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn list(&self, workspace_id: &str) -> Result<Vec<Task>, StorageError> {
        let Some(ws) = self.existing(workspace_id).await else {
            return Ok(Vec::new());
        };
        let ws = ws.read().await;
        Ok(ws.tasks.values().cloned().collect())
    }

    async fn complete(&self, workspace_id: &str, id: TaskId) -> Result<Task, StorageError> {
        let ws = self
            .existing(workspace_id)
            .await
            .ok_or_else(|| StorageError::not_found(workspace_id, id))?;
        let mut ws = ws.write().await;
        let task = ws
            .tasks
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found(workspace_id, id))?;
        task.complete();
        Ok(task.clone())
    }

    async fn delete(&self, workspace_id: &str, id: TaskId) -> Result<(), StorageError> {
        let ws = self
            .existing(workspace_id)
            .await
            .ok_or_else(|| StorageError::not_found(workspace_id, id))?;
        let mut ws = ws.write().await;
        ws.tasks
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(workspace_id, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use crate::application::errors::ErrorKind;

    #[tokio::test]
    async fn test_add_then_list() {
        let store = MemoryStore::new();
        let task = store.add("T1", "  Buy milk ").await.unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.content, "Buy milk");

        let tasks = store.list("T1").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].content, "Buy milk");
        assert!(!tasks[0].completed);
    }

    #[tokio::test]
    async fn test_empty_content_rejected() {
        let store = MemoryStore::new();
        for content in ["", "   "] {
            let err = store.add("T1", content).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidContent);
        }
        assert!(store.list("T1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_workspace_isolation() {
        let store = MemoryStore::new();
        store.add("T1", "Only in T1").await.unwrap();

        assert!(store.list("T2").await.unwrap().is_empty());
        let second = store.add("T2", "First in T2").await.unwrap();
        assert_eq!(second.id, 1);
        assert_eq!(store.list("T1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_complete() {
        let store = MemoryStore::new();
        let task = store.add("T1", "Write report").await.unwrap();

        let done = store.complete("T1", task.id).await.unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());

        let listed = store.list("T1").await.unwrap();
        assert!(listed[0].completed);
        assert!(listed[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn test_complete_twice_keeps_first_timestamp() {
        let store = MemoryStore::new();
        let task = store.add("T1", "Write report").await.unwrap();

        let first = store.complete("T1", task.id).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.complete("T1", task.id).await.unwrap();
        assert_eq!(first.completed_at, second.completed_at);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let task = store.add("T1", "Write report").await.unwrap();

        let err = store.delete("T1", 99).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        store.delete("T1", task.id).await.unwrap();
        assert!(store.list("T1").await.unwrap().is_empty());

        let err = store.delete("T1", task.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = store.complete("T1", task.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = MemoryStore::new();
        store.add("T1", "one").await.unwrap();
        let two = store.add("T1", "two").await.unwrap();
        store.delete("T1", two.id).await.unwrap();

        let three = store.add("T1", "three").await.unwrap();
        assert_eq!(three.id, 3);
    }

    #[tokio::test]
    async fn test_unknown_workspace() {
        let store = MemoryStore::new();
        assert!(store.list("nowhere").await.unwrap().is_empty());
        assert_eq!(store.complete("nowhere", 1).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.delete("nowhere", 1).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_get_unique_ids() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..100 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add("T1", &format!("task {}", i)).await.unwrap().id
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 100);
        assert_eq!(ids, (1..=100).collect::<HashSet<_>>());

        let listed: Vec<TaskId> = store.list("T1").await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(listed, (1..=100).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_delete_racing_complete() {
        for _ in 0..20 {
            let store = Arc::new(MemoryStore::new());
            let task = store.add("T1", "contested").await.unwrap();

            let s1 = store.clone();
            let s2 = store.clone();
            let complete = tokio::spawn(async move { s1.complete("T1", task.id).await });
            let delete = tokio::spawn(async move { s2.delete("T1", task.id).await });

            // Delete always finds the task: nothing else removes it
            assert!(delete.await.unwrap().is_ok());
            match complete.await.unwrap() {
                Ok(done) => assert!(done.completed),
                Err(e) => assert_eq!(e.kind(), ErrorKind::NotFound),
            }
            assert!(store.list("T1").await.unwrap().is_empty());
        }
    }
}
