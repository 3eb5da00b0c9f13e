//! Platform adapters - Slack and a local console for development

pub mod console;
pub mod slack;

pub use console::ConsoleAdapter;
pub use slack::SlackAdapter;
