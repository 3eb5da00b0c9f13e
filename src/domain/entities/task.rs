use chrono::{DateTime, Utc};

/// Task identifier, unique within a workspace
pub type TaskId = u64;

/// A single TODO record owned by a task store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub workspace_id: String,
    pub content: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(workspace_id: impl Into<String>, id: TaskId, content: impl Into<String>) -> Self {
        Self {
            id,
            workspace_id: workspace_id.into(),
            content: content.into(),
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Mark the task completed. The first completion wins: an already
    /// completed task keeps its original timestamp.
    pub fn complete(&mut self) {
        if !self.completed {
            self.completed = true;
            self.completed_at = Some(Utc::now());
        }
    }
}

/// Trim task content, returning `None` when nothing is left
pub fn normalize_content(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_pending() {
        let task = Task::new("T1", 1, "Write report");
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_complete_keeps_first_timestamp() {
        let mut task = Task::new("T1", 1, "Write report");
        task.complete();
        let first = task.completed_at;
        assert!(first.is_some());

        task.complete();
        assert!(task.completed);
        assert_eq!(task.completed_at, first);
    }

    #[test]
    fn test_normalize_content() {
        assert_eq!(normalize_content("  Buy milk \n"), Some("Buy milk"));
        assert_eq!(normalize_content(""), None);
        assert_eq!(normalize_content("   "), None);
    }
}
