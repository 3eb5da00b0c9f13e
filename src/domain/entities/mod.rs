//! Domain entities - Core business objects with no external dependencies

pub mod task;
pub mod message;
pub mod command;

pub use task::{Task, TaskId, normalize_content};
pub use message::{Message, Content};
pub use command::{Command, CommandKind, CommandInfo, COMMANDS};
