//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: In-memory task store
//! - Database: SQLite task store
//! - Adapters: Platform integrations (Slack, console)

pub mod config;
pub mod storage;
pub mod database;
pub mod adapters;
