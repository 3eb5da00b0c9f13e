use std::fmt;

use super::TaskId;

/// Kind of TODO command, used to label argument and store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Add,
    List,
    Done,
    Delete,
    Help,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Add => "add",
            CommandKind::List => "list",
            CommandKind::Done => "done",
            CommandKind::Delete => "delete",
            CommandKind::Help => "help",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed user intent parsed from message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    List,
    Done(TaskId),
    Delete(TaskId),
    Help,
    /// Recognized keyword without its required content or id
    MissingArgument(CommandKind),
    Unknown,
}

/// Help catalog entry for a command
pub struct CommandInfo {
    pub kind: CommandKind,
    pub usage: &'static str,
    pub description: &'static str,
}

/// All commands the bot understands, in the order they are listed in help
pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        kind: CommandKind::Add,
        usage: "add [content]",
        description: "Add a TODO",
    },
    CommandInfo {
        kind: CommandKind::List,
        usage: "list",
        description: "Show the TODO list",
    },
    CommandInfo {
        kind: CommandKind::Done,
        usage: "done [ID]",
        description: "Mark a TODO as done",
    },
    CommandInfo {
        kind: CommandKind::Delete,
        usage: "delete [ID]",
        description: "Delete a TODO",
    },
    CommandInfo {
        kind: CommandKind::Help,
        usage: "help",
        description: "Show this help",
    },
];

impl CommandInfo {
    pub fn find(kind: CommandKind) -> Option<&'static CommandInfo> {
        COMMANDS.iter().find(|c| c.kind == kind)
    }
}
