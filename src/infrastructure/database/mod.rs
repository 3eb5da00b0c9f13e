//! SQLite task storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::application::errors::StorageError;
use crate::domain::entities::{normalize_content, Task, TaskId};
use crate::domain::traits::TaskStore;

/// Durable store backed by a single SQLite connection.
///
/// Every operation runs in its own transaction on the blocking pool, so
/// id assignment and updates are atomic per workspace and across restarts.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        init_tables(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `op` inside a transaction on the blocking pool
    async fn with_tx<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| StorageError::Unavailable("connection lock poisoned".to_string()))?;
            let tx = conn.transaction()?;
            let value = op(&tx)?;
            tx.commit()?;
            Ok(value)
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("storage task failed: {}", e)))?
    }
}

fn init_tables(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS workspaces (
            workspace_id TEXT PRIMARY KEY,
            next_id INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS tasks (
            workspace_id TEXT NOT NULL,
            id INTEGER NOT NULL,
            content TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            completed_at TEXT,
            PRIMARY KEY (workspace_id, id)
        );",
    )?;
    Ok(())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("bad timestamp {:?}: {}", raw, e)))
}

/// Raw column values, decoded outside the rusqlite row callback
struct TaskRow {
    workspace_id: String,
    id: i64,
    content: String,
    completed: bool,
    created_at: String,
    completed_at: Option<String>,
}

impl TaskRow {
    const COLUMNS: &'static str = "workspace_id, id, content, completed, created_at, completed_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            workspace_id: row.get(0)?,
            id: row.get(1)?,
            content: row.get(2)?,
            completed: row.get(3)?,
            created_at: row.get(4)?,
            completed_at: row.get(5)?,
        })
    }

    fn into_task(self) -> Result<Task, StorageError> {
        let id = TaskId::try_from(self.id)
            .map_err(|_| StorageError::Serialization(format!("negative task id {}", self.id)))?;
        Ok(Task {
            id,
            workspace_id: self.workspace_id,
            content: self.content,
            completed: self.completed,
            created_at: parse_timestamp(&self.created_at)?,
            completed_at: self.completed_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn find_task(tx: &Transaction<'_>, workspace_id: &str, id: i64) -> Result<Option<Task>, StorageError> {
    let sql = format!(
        "SELECT {} FROM tasks WHERE workspace_id = ?1 AND id = ?2",
        TaskRow::COLUMNS
    );
    tx.query_row(&sql, rusqlite::params![workspace_id, id], TaskRow::from_row)
        .optional()?
        .map(TaskRow::into_task)
        .transpose()
}

/// Ids beyond `i64::MAX` can never have been assigned
fn sql_id(workspace_id: &str, id: TaskId) -> Result<i64, StorageError> {
    i64::try_from(id).map_err(|_| StorageError::not_found(workspace_id, id))
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn add(&self, workspace_id: &str, content: &str) -> Result<Task, StorageError> {
        let content = normalize_content(content)
            .ok_or(StorageError::InvalidContent)?
            .to_string();
        let workspace_id = workspace_id.to_string();

        self.with_tx(move |tx| {
            tx.execute(
                "INSERT OR IGNORE INTO workspaces (workspace_id, next_id) VALUES (?1, 1)",
                [&workspace_id],
            )?;
            let next: i64 = tx.query_row(
                "SELECT next_id FROM workspaces WHERE workspace_id = ?1",
                [&workspace_id],
                |row| row.get(0),
            )?;
            tx.execute(
                "UPDATE workspaces SET next_id = next_id + 1 WHERE workspace_id = ?1",
                [&workspace_id],
            )?;

            let id = TaskId::try_from(next)
                .map_err(|_| StorageError::Serialization(format!("bad id counter {}", next)))?;
            let task = Task::new(workspace_id.as_str(), id, content);
            tx.execute(
                "INSERT INTO tasks (workspace_id, id, content, completed, created_at, completed_at)
                 VALUES (?1, ?2, ?3, 0, ?4, NULL)",
                rusqlite::params![&task.workspace_id, next, &task.content, task.created_at.to_rfc3339()],
            )?;
            Ok(task)
        })
        .await
    }

    async fn list(&self, workspace_id: &str) -> Result<Vec<Task>, StorageError> {
        let workspace_id = workspace_id.to_string();

        self.with_tx(move |tx| {
            let sql = format!(
                "SELECT {} FROM tasks WHERE workspace_id = ?1 ORDER BY id",
                TaskRow::COLUMNS
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map([&workspace_id], TaskRow::from_row)?;

            let mut tasks = Vec::new();
            for row in rows {
                tasks.push(row?.into_task()?);
            }
            Ok(tasks)
        })
        .await
    }

    async fn complete(&self, workspace_id: &str, id: TaskId) -> Result<Task, StorageError> {
        let key = sql_id(workspace_id, id)?;
        let workspace_id = workspace_id.to_string();

        self.with_tx(move |tx| {
            let mut task = find_task(tx, &workspace_id, key)?
                .ok_or_else(|| StorageError::not_found(workspace_id.as_str(), id))?;
            if task.completed {
                return Ok(task);
            }

            task.complete();
            let completed_at = task.completed_at.map(|t| t.to_rfc3339());
            tx.execute(
                "UPDATE tasks SET completed = 1, completed_at = ?3 WHERE workspace_id = ?1 AND id = ?2",
                rusqlite::params![&workspace_id, key, completed_at],
            )?;
            Ok(task)
        })
        .await
    }

    async fn delete(&self, workspace_id: &str, id: TaskId) -> Result<(), StorageError> {
        let key = sql_id(workspace_id, id)?;
        let workspace_id = workspace_id.to_string();

        self.with_tx(move |tx| {
            let rows = tx.execute(
                "DELETE FROM tasks WHERE workspace_id = ?1 AND id = ?2",
                rusqlite::params![&workspace_id, key],
            )?;
            if rows == 0 {
                return Err(StorageError::not_found(workspace_id, id));
            }
            Ok(())
        })
        .await
    }
}
