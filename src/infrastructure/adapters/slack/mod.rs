//! Slack adapter
//!
//! Inbound events arrive as Events API envelopes, one JSON document per
//! line, from whatever relay owns the socket or HTTP subscription.
//! Replies go out through the Web API.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::errors::{BotError, ConfigError};
use crate::domain::entities::{Content, Message};
use crate::domain::traits::{Bot, BotInfo};
use crate::infrastructure::config::SlackCredentials;

/// Slack Web API base URL
const API_BASE: &str = "https://slack.com/api";

static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@([A-Z0-9]+)(?:\|[^>]*)?>").expect("valid mention pattern"));

/// Events API envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    EventCallback { team_id: String, event: Event },
    UrlVerification { challenge: String },
    #[serde(other)]
    Other,
}

/// The inner event of an `event_callback`
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: Option<String>,
    pub channel: Option<String>,
    pub text: Option<String>,
    pub bot_id: Option<String>,
    pub subtype: Option<String>,
}

/// Slack bot adapter
pub struct SlackAdapter {
    credentials: SlackCredentials,
    client: Client,
    api_base: String,
    info: BotInfo,
    trigger: Regex,
}

impl SlackAdapter {
    pub fn new(
        credentials: SlackCredentials,
        name: impl Into<String>,
        trigger_pattern: &str,
    ) -> Result<Self, BotError> {
        let trigger = Regex::new(&format!("(?i){}", trigger_pattern))
            .map_err(|e| ConfigError::InvalidValue(format!("bot.trigger-pattern: {}", e)))?;

        Ok(Self {
            credentials,
            client: Client::new(),
            api_base: API_BASE.to_string(),
            info: BotInfo {
                id: String::new(),
                name: name.into(),
                platform: "slack".to_string(),
            },
            trigger,
        })
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Verify the token with `auth.test` and learn the bot's own user id
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct Response {
            ok: bool,
            user_id: Option<String>,
            user: Option<String>,
            error: Option<String>,
        }

        let url = self.api_url("auth.test");
        let response = self.client
            .post(&url)
            .bearer_auth(&self.credentials.bot_token)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        if !data.ok {
            return Err(BotError::Auth(data.error.unwrap_or_else(|| "auth.test failed".to_string())));
        }

        self.info.id = data.user_id.unwrap_or_default();
        if let Some(user) = data.user {
            self.info.name = user;
        }
        Ok(())
    }

    /// First characters of the bot token, safe to log
    fn token_hint(&self) -> String {
        self.credentials.bot_token.chars().take(8).collect()
    }

    /// Remove mentions of this bot. Before the bot id is known every
    /// mention is treated as addressing the bot.
    fn strip_mentions(&self, text: &str) -> String {
        let own_id = self.info.id.as_str();
        MENTION
            .replace_all(text, |caps: &Captures<'_>| {
                if own_id.is_empty() || &caps[1] == own_id {
                    String::new()
                } else {
                    caps[0].to_string()
                }
            })
            .trim()
            .to_string()
    }

    /// Decode one envelope into a message for the bot, if it is one
    pub fn parse_event(&self, raw: &str) -> Result<Option<Message>, BotError> {
        let envelope: Envelope = serde_json::from_str(raw)
            .map_err(|e| BotError::Parse(format!("invalid event envelope: {}", e)))?;

        let (team_id, event) = match envelope {
            Envelope::EventCallback { team_id, event } => (team_id, event),
            Envelope::UrlVerification { challenge } => {
                tracing::debug!("Ignoring url_verification handshake ({} byte challenge)", challenge.len());
                return Ok(None);
            }
            Envelope::Other => return Ok(None),
        };

        let Some(channel) = event.channel.clone() else {
            return Ok(None);
        };

        let content = match event.kind.as_str() {
            "app_home_opened" => Content::HomeOpened,
            "app_mention" => {
                let text = self.strip_mentions(event.text.as_deref().unwrap_or_default());
                if text.is_empty() {
                    return Ok(None);
                }
                Content::Text(text)
            }
            "message" => {
                if event.bot_id.is_some() || event.subtype.is_some() {
                    return Ok(None);
                }
                if !self.info.id.is_empty() && event.user.as_deref() == Some(self.info.id.as_str()) {
                    return Ok(None);
                }
                let raw_text = event.text.as_deref().unwrap_or_default();
                if !self.trigger.is_match(raw_text) {
                    return Ok(None);
                }
                let text = self.strip_mentions(&self.trigger.replace_all(raw_text, ""));
                if text.is_empty() {
                    return Ok(None);
                }
                Content::Text(text)
            }
            _ => return Ok(None),
        };

        let mut message = Message::new(team_id, channel, content).with_platform("slack");
        if let Some(user) = event.user {
            message = message.with_sender(user);
        }
        Ok(Some(message))
    }

    /// Read envelopes line by line and forward the ones addressed to the bot
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
                tracing::warn!("Skipping event line that is not valid UTF-8");
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }
            match self.parse_event(line) {
                Ok(Some(message)) => {
                    tracing::debug!(event_id = %message.id, workspace = %message.workspace_id, "Event received");
                    if events.send(message).await.is_err() {
                        break;
                    }
                }
                Ok(None) => tracing::trace!("Skipping event not addressed to the bot"),
                Err(e) => tracing::warn!("Skipping event: {}", e),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Bot for SlackAdapter {
    async fn start(&self, events: mpsc::Sender<Message>) -> Result<(), BotError> {
        tracing::info!("Starting Slack bot (token: {}...)", self.token_hint());
        self.pump(BufReader::new(tokio::io::stdin()), events).await
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct PostMessageRequest<'a> {
            channel: &'a str,
            text: &'a str,
        }

        #[derive(Deserialize)]
        struct Response {
            ok: bool,
            ts: Option<String>,
            error: Option<String>,
        }

        tracing::debug!("Sending to {}: {}", channel_id, text);

        let url = self.api_url("chat.postMessage");
        let response = self.client
            .post(&url)
            .bearer_auth(&self.credentials.bot_token)
            .json(&PostMessageRequest { channel: channel_id, text })
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Slack API error: {}", response.status())));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        match (data.ok, data.error) {
            (true, _) => Ok(data.ts.unwrap_or_default()),
            (false, Some(error)) if error == "invalid_auth" || error == "not_authed" => Err(BotError::Auth(error)),
            (false, error) => Err(BotError::Network(format!(
                "chat.postMessage failed: {}",
                error.unwrap_or_else(|| "unknown error".to_string())
            ))),
        }
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
