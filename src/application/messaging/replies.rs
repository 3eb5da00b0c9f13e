//! User-facing reply text (Slack mrkdwn)

use crate::application::errors::ErrorKind;
use crate::domain::entities::{CommandInfo, CommandKind, Task, TaskId, COMMANDS};

pub fn help(bot_name: &str) -> String {
    let mut text = String::from("🤖 *TODO bot commands*\n\n");
    for cmd in COMMANDS {
        text.push_str(&format!("• `@{} {}` - {}\n", bot_name, cmd.usage, cmd.description));
    }
    text.push_str(&format!("\nExample: `@{} add Prepare meeting notes`", bot_name));
    text
}

pub fn greeting(bot_name: &str) -> String {
    format!(
        "Hello! I'm the TODO bot.\nSend `@{} help` to see what I can do.",
        bot_name
    )
}

pub fn added(task: &Task) -> String {
    format!("✅ Added a TODO!\n*ID*: {}\n*Content*: {}", task.id, task.content)
}

pub fn list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "📝 There are no TODOs.".to_string();
    }

    let mut text = String::from("📋 *TODO list*\n\n");
    for task in tasks {
        let status = if task.completed { "✅" } else { "⏸️" };
        text.push_str(&format!("{} *[{}]* {}\n", status, task.id, task.content));
    }
    text
}

pub fn completed(task: &Task) -> String {
    format!("✅ Marked TODO [{}] as done!", task.id)
}

pub fn deleted(id: TaskId) -> String {
    format!("🗑️ Deleted TODO [{}]!", id)
}

pub fn unknown(bot_name: &str) -> String {
    format!(
        "I didn't recognize that command. Send `@{} help` to see the available commands.",
        bot_name
    )
}

/// Corrective message for a rejected command
pub fn rejected(bot_name: &str, command: CommandKind, error: ErrorKind, id: Option<TaskId>) -> String {
    match error {
        ErrorKind::MissingArgument => usage_hint(bot_name, command),
        ErrorKind::InvalidContent => format!(
            "A TODO needs some content.\nExample: `@{} add Prepare meeting notes`",
            bot_name
        ),
        ErrorKind::NotFound => match id {
            Some(id) => format!(
                "TODO [{}] was not found. Send `@{} list` to see your TODOs.",
                id, bot_name
            ),
            None => format!("That TODO was not found. Send `@{} list` to see your TODOs.", bot_name),
        },
        ErrorKind::StoreUnavailable | ErrorKind::ConfigInvalid => unavailable(),
    }
}

pub fn unavailable() -> String {
    "Something went wrong. Please try again later.".to_string()
}

fn usage_hint(bot_name: &str, command: CommandKind) -> String {
    match command {
        CommandKind::Add => format!(
            "Please enter the TODO content.\nExample: `@{} add Prepare meeting notes`",
            bot_name
        ),
        CommandKind::Done | CommandKind::Delete => format!(
            "Please specify the TODO ID.\nExample: `@{} {} 1`",
            bot_name, command
        ),
        _ => match CommandInfo::find(command) {
            Some(info) => format!("Usage: `@{} {}`", bot_name, info.usage),
            None => help(bot_name),
        },
    }
}
