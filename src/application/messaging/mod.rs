//! Message handling - Command parsing, dispatching and reply formatting

pub mod dispatcher;
pub mod parser;
pub mod replies;

pub use dispatcher::{CommandDispatcher, Reply};
