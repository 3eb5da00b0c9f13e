//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub slack: SlackConfig,
    pub store: StoreConfig,
    pub environment: Environment,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    /// Plain channel messages are handled only when they match this pattern
    pub trigger_pattern: String,
    /// Inbound events buffered before the reader waits
    pub queue_size: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlackConfig {
    pub bot_token: Option<String>,
    pub signing_secret: Option<String>,
    pub app_token: Option<String>,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    /// Default log filter when `RUST_LOG` is not set
    pub fn log_level(&self) -> tracing::Level {
        match self {
            Environment::Development => tracing::Level::DEBUG,
            Environment::Production | Environment::Test => tracing::Level::INFO,
        }
    }
}

/// Credentials required to talk to Slack
#[derive(Debug, Clone)]
pub struct SlackCredentials {
    pub bot_token: String,
    /// Validated at startup only; request verification belongs to the relay
    #[allow(dead_code)]
    pub signing_secret: String,
    pub app_token: Option<String>,
    pub port: u16,
}

impl SlackCredentials {
    /// Socket mode is used when an app-level token is configured
    pub fn socket_mode(&self) -> bool {
        self.app_token.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "todobot".to_string(),
                trigger_pattern: "todo-slack-app|todobot".to_string(),
                queue_size: 64,
            },
            slack: SlackConfig {
                bot_token: None,
                signing_secret: None,
                app_token: None,
                port: 3000,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                path: PathBuf::from("todo-bot.db"),
            },
            environment: Environment::Development,
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Load the file when present, otherwise start from defaults, then
    /// apply environment overrides.
    pub fn resolve(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            Config::default()
        };
        config.apply_env(&std::env::vars().collect())?;
        Ok(config)
    }

    /// Apply overrides from an environment snapshot
    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<(), ConfigError> {
        let get = |key: &str| env.get(key).filter(|v| !v.is_empty()).cloned();

        if let Some(token) = get("SLACK_BOT_TOKEN") {
            self.slack.bot_token = Some(token);
        }
        if let Some(secret) = get("SLACK_SIGNING_SECRET") {
            self.slack.signing_secret = Some(secret);
        }
        if let Some(token) = get("SLACK_APP_TOKEN") {
            self.slack.app_token = Some(token);
        }
        if let Some(port) = get("PORT") {
            self.slack.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("PORT must be a port number, got {:?}", port)))?;
        }
        if let Some(env_name) = get("BOT_ENV") {
            self.environment = match env_name.as_str() {
                "development" => Environment::Development,
                "production" => Environment::Production,
                "test" => Environment::Test,
                other => {
                    return Err(ConfigError::InvalidValue(format!(
                        "BOT_ENV must be development, production or test, got {:?}",
                        other
                    )))
                }
            };
        }
        if let Some(backend) = get("TODO_STORE") {
            self.store.backend = match backend.as_str() {
                "memory" => StoreBackend::Memory,
                "sqlite" => StoreBackend::Sqlite,
                other => {
                    return Err(ConfigError::InvalidValue(format!(
                        "TODO_STORE must be memory or sqlite, got {:?}",
                        other
                    )))
                }
            };
        }
        if let Some(path) = get("TODO_DB_PATH") {
            self.store.path = PathBuf::from(path);
        }

        Ok(())
    }

    /// Check the bot settings every mode depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.name.trim().is_empty() {
            return Err(ConfigError::MissingField("bot.name".to_string()));
        }
        if self.bot.queue_size == 0 {
            return Err(ConfigError::InvalidValue("bot.queue-size must be at least 1".to_string()));
        }
        regex_lite::Regex::new(&self.bot.trigger_pattern)
            .map_err(|e| ConfigError::InvalidValue(format!("bot.trigger-pattern: {}", e)))?;
        Ok(())
    }

    /// Credentials for Slack mode; fails when a required one is absent
    pub fn slack_credentials(&self) -> Result<SlackCredentials, ConfigError> {
        let bot_token = self
            .slack
            .bot_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingField("SLACK_BOT_TOKEN is required".to_string()))?;
        let signing_secret = self
            .slack
            .signing_secret
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingField("SLACK_SIGNING_SECRET is required".to_string()))?;

        Ok(SlackCredentials {
            bot_token,
            signing_secret,
            app_token: self.slack.app_token.clone().filter(|t| !t.is_empty()),
            port: self.slack.port,
        })
    }
}
