use async_trait::async_trait;
use tokio::sync::mpsc;
use crate::domain::entities::Message;
use crate::application::errors::BotError;

/// Bot trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Listen for platform events and push them into `events`.
    /// Returns once the event source is exhausted or the receiver is gone.
    async fn start(&self, events: mpsc::Sender<Message>) -> Result<(), BotError>;

    /// Send a message to a channel
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub platform: String,
}
