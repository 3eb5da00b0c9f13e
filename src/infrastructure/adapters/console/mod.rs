//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use crate::domain::entities::Message;
use crate::domain::traits::{Bot, BotInfo};
use crate::application::errors::BotError;

/// Workspace and channel every console line belongs to
pub const CONSOLE_WORKSPACE: &str = "console";

/// Console bot adapter for local development: one stdin line per message
pub struct ConsoleAdapter {
    info: BotInfo,
}

impl ConsoleAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: name.into(),
                platform: "console".to_string(),
            },
        }
    }

    /// Forward each non-empty line of `reader` as a message
    pub async fn pump<R>(&self, mut reader: R, events: mpsc::Sender<Message>) -> Result<(), BotError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let Ok(line) = std::str::from_utf8(&buf) else {
                tracing::warn!("Skipping input line that is not valid UTF-8");
                continue;
            };
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            let message = Message::from_text(CONSOLE_WORKSPACE, CONSOLE_WORKSPACE, text)
                .with_sender("local")
                .with_platform("console");
            if events.send(message).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self, events: mpsc::Sender<Message>) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode), type `help` to begin");
        self.pump(BufReader::new(tokio::io::stdin()), events).await
    }

    async fn send_message(&self, _channel_id: &str, text: &str) -> Result<String, BotError> {
        println!("[BOT] {}", text);
        Ok("console_msg".to_string())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
