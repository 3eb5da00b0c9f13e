//! Command parser - Turns raw message text into typed commands

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::domain::entities::{normalize_content, Command, CommandKind, TaskId};

static DONE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)done\s+(\d+)").expect("valid done pattern"));
static DELETE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)delete\s+(\d+)").expect("valid delete pattern"));

/// Parses message text into [`Command`]s.
///
/// Keywords are matched case-insensitively anywhere in the text, in the
/// priority order `help`, `add`, `list`, `done`, `delete`. Parsing never
/// fails: text without a keyword becomes [`Command::Unknown`].
#[derive(Debug, Clone, Default)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> Command {
        // ASCII lowering keeps byte offsets aligned with `text`
        let lowered = text.to_ascii_lowercase();

        if lowered.contains("help") {
            return Command::Help;
        }

        if let Some(pos) = lowered.find("add") {
            let rest = &text[pos + "add".len()..];
            return match normalize_content(rest) {
                Some(content) => Command::Add(content.to_string()),
                None => Command::MissingArgument(CommandKind::Add),
            };
        }

        if lowered.contains("list") {
            return Command::List;
        }

        if lowered.contains("done") {
            return match extract_id(&DONE_ID, text) {
                Some(id) => Command::Done(id),
                None => Command::MissingArgument(CommandKind::Done),
            };
        }

        if lowered.contains("delete") {
            return match extract_id(&DELETE_ID, text) {
                Some(id) => Command::Delete(id),
                None => Command::MissingArgument(CommandKind::Delete),
            };
        }

        Command::Unknown
    }
}

/// First integer after the keyword; digit runs that overflow are treated as absent
fn extract_id(pattern: &Regex, text: &str) -> Option<TaskId> {
    pattern.captures(text)?.get(1)?.as_str().parse().ok()
}
