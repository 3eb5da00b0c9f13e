//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: Event handling and the dispatch loop
//! - Errors: Domain-specific errors
//! - Messaging: Command parsing, dispatching, reply formatting

pub mod errors;
pub mod services;
pub mod messaging;

#[cfg(test)]
mod tests;
