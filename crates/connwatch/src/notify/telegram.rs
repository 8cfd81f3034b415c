//! Telegram Bot API channel, used for the fixed administrator chat.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::sender::{DeliveryError, MessageId, Sender, http_client};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const PROVIDER: &str = "telegram";

pub struct TelegramSender {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
}

#[derive(Deserialize)]
struct Reply {
    ok: bool,
    result: Option<SentMessage>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramSender {
    pub fn new(bot_token: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token: bot_token.into(),
        })
    }

    /// Point the sender at another API host (tests, proxies)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl Sender for TelegramSender {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<MessageId, DeliveryError> {
        let payload = SendMessage { chat_id: recipient, text: format!("{subject}\n\n{body}") };

        // the URL carries the bot token, keep it out of error messages
        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport { provider: PROVIDER, source: e.without_url() })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| DeliveryError::Transport { provider: PROVIDER, source: e.without_url() })?;

        parse_reply(status, &text)
    }
}

fn parse_reply(status: u16, body: &str) -> Result<MessageId, DeliveryError> {
    let reply: Reply = serde_json::from_str(body).map_err(|e| {
        DeliveryError::UnexpectedResponse { provider: PROVIDER, detail: format!("status {status}: {e}") }
    })?;

    match reply {
        Reply { ok: true, result: Some(message), .. } => Ok(MessageId(message.message_id.to_string())),
        Reply { ok: true, result: None, .. } => Err(DeliveryError::UnexpectedResponse {
            provider: PROVIDER,
            detail: "missing result".to_string(),
        }),
        Reply { description, .. } => Err(DeliveryError::Rejected {
            provider: PROVIDER,
            status,
            detail: description.unwrap_or_else(|| "no description".to_string()),
        }),
    }
}
