use chrono::{DateTime, Utc};

/// Inbound event content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Message text addressed to the bot
    Text(String),
    /// The user opened the bot's home tab
    HomeOpened,
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            Content::HomeOpened => None,
        }
    }
}

/// An inbound platform event reduced to what the bot needs
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub workspace_id: String,
    pub channel_id: String,
    pub sender_id: Option<String>,
    pub content: Content,
    pub timestamp: DateTime<Utc>,
    pub platform: String,
}

impl Message {
    pub fn new(workspace_id: impl Into<String>, channel_id: impl Into<String>, content: Content) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            workspace_id: workspace_id.into(),
            channel_id: channel_id.into(),
            sender_id: None,
            content,
            timestamp: Utc::now(),
            platform: "unknown".to_string(),
        }
    }

    pub fn from_text(workspace_id: impl Into<String>, channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(workspace_id, channel_id, Content::Text(text.into()))
    }

    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }
}
