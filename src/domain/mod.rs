//! Domain layer - Core business logic with no external dependencies
//! 
//! This layer contains:
//! - Entities: Core business objects (Task, Message, Command)
//! - Traits: Abstractions for infrastructure (Bot, TaskStore)
//! - Rules: Task invariants (trimmed content, one-way completion)

pub mod entities;
pub mod traits;
