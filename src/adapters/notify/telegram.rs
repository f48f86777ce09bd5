use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::UserId;
use crate::ports::Notifier;

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Bot API base, overridable for tests
    pub api_base_url: String,
    pub timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base_url: "https://api.telegram.org".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base_url, self.bot_token)
    }
}

/// Posts events to the user's Telegram chat; the user id is the chat id
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    config: TelegramConfig,
    http: Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, user: &UserId, message: &str) {
        let params = [("chat_id", user.as_str()), ("text", message)];

        match self
            .http
            .post(self.config.send_message_url())
            .form(&params)
            .send()
            .await
        {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!("Telegram send failed: {}", resp.status());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Telegram error: {}", e),
        }
    }
}
