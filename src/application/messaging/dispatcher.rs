//! Command dispatcher - Runs parsed commands against the task store

use std::sync::Arc;

use super::parser::CommandParser;
use super::replies;
use crate::application::errors::{ErrorKind, StorageError};
use crate::domain::entities::{Command, CommandKind, Task, TaskId};
use crate::domain::traits::TaskStore;

/// What a dispatched command resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Help,
    Added(Task),
    Listed(Vec<Task>),
    Completed(Task),
    Deleted(TaskId),
    /// A recognized command that could not be carried out
    Rejected { command: CommandKind, error: ErrorKind },
    UnknownCommand,
    /// Dispatch itself failed before the store could answer
    Failed,
}

impl Outcome {
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Help => "help",
            Outcome::Added(_) => "added",
            Outcome::Listed(_) => "listed",
            Outcome::Completed(_) => "completed",
            Outcome::Deleted(_) => "deleted",
            Outcome::Rejected { .. } => "rejected",
            Outcome::UnknownCommand => "unknown_command",
            Outcome::Failed => "failed",
        }
    }
}

/// Reply text plus the outcome that produced it.
///
/// The dispatcher never logs; callers inspect [`Reply::error_kind`] and
/// [`Reply::cause`] and decide what to record.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub outcome: Outcome,
    /// Underlying error message for infrastructure failures
    pub cause: Option<String>,
}

impl Reply {
    pub fn new(text: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            text: text.into(),
            outcome,
            cause: None,
        }
    }

    /// Generic transient-failure reply
    pub fn unavailable(cause: impl Into<String>) -> Self {
        Self {
            text: replies::unavailable(),
            outcome: Outcome::Failed,
            cause: Some(cause.into()),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            Outcome::Rejected { error, .. } => Some(*error),
            Outcome::Failed => Some(ErrorKind::StoreUnavailable),
            _ => None,
        }
    }
}

/// Routes commands to the store and formats replies
pub struct CommandDispatcher {
    parser: CommandParser,
    store: Arc<dyn TaskStore>,
    bot_name: String,
}

impl CommandDispatcher {
    pub fn new(store: Arc<dyn TaskStore>, bot_name: impl Into<String>) -> Self {
        Self {
            parser: CommandParser::new(),
            store,
            bot_name: bot_name.into(),
        }
    }

    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    /// Parse and execute raw message text for a workspace
    pub async fn dispatch(&self, workspace_id: &str, text: &str) -> Reply {
        let command = self.parser.parse(text);
        self.execute(workspace_id, command).await
    }

    pub async fn execute(&self, workspace_id: &str, command: Command) -> Reply {
        match command {
            Command::Help => Reply::new(replies::help(&self.bot_name), Outcome::Help),
            Command::Add(content) => match self.store.add(workspace_id, &content).await {
                Ok(task) => Reply::new(replies::added(&task), Outcome::Added(task)),
                Err(e) => self.store_error(CommandKind::Add, None, e),
            },
            Command::List => match self.store.list(workspace_id).await {
                Ok(tasks) => Reply::new(replies::list(&tasks), Outcome::Listed(tasks)),
                Err(e) => self.store_error(CommandKind::List, None, e),
            },
            Command::Done(id) => match self.store.complete(workspace_id, id).await {
                Ok(task) => Reply::new(replies::completed(&task), Outcome::Completed(task)),
                Err(e) => self.store_error(CommandKind::Done, Some(id), e),
            },
            Command::Delete(id) => match self.store.delete(workspace_id, id).await {
                Ok(()) => Reply::new(replies::deleted(id), Outcome::Deleted(id)),
                Err(e) => self.store_error(CommandKind::Delete, Some(id), e),
            },
            Command::MissingArgument(kind) => self.reject(kind, ErrorKind::MissingArgument, None),
            Command::Unknown => Reply::new(replies::unknown(&self.bot_name), Outcome::UnknownCommand),
        }
    }

    fn store_error(&self, command: CommandKind, id: Option<TaskId>, err: StorageError) -> Reply {
        let kind = err.kind();
        let mut reply = self.reject(command, kind, id);
        if kind == ErrorKind::StoreUnavailable {
            reply.cause = Some(err.to_string());
        }
        reply
    }

    fn reject(&self, command: CommandKind, error: ErrorKind, id: Option<TaskId>) -> Reply {
        Reply::new(
            replies::rejected(&self.bot_name, command, error, id),
            Outcome::Rejected { command, error },
        )
    }
}
