//! Twilio Messages API channel, used for SMS subscribers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::sender::{DeliveryError, MessageId, Sender, http_client};
use crate::config::TwilioConfig;

pub const TWILIO_API_BASE: &str = "https://api.twilio.com";
const PROVIDER: &str = "twilio";

pub struct TwilioSender {
    client: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_phone: String,
}

#[derive(Deserialize)]
struct Reply {
    sid: Option<String>,
    message: Option<String>,
}

impl TwilioSender {
    pub fn new(config: &TwilioConfig, timeout: Duration) -> Result<Self, DeliveryError> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            api_base: TWILIO_API_BASE.to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_phone: config.from_phone.clone(),
        })
    }

    /// Point the sender at another API host (tests, proxies)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}/Messages.json", self.api_base, self.account_sid)
    }
}

#[async_trait]
impl Sender for TwilioSender {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<MessageId, DeliveryError> {
        let text = format!("{subject}\n\n{body}");
        let form = [("From", self.from_phone.as_str()), ("To", recipient), ("Body", text.as_str())];

        let response = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|source| DeliveryError::Transport { provider: PROVIDER, source })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|source| DeliveryError::Transport { provider: PROVIDER, source })?;

        parse_reply(status, &text)
    }
}

fn parse_reply(status: u16, body: &str) -> Result<MessageId, DeliveryError> {
    let reply: Reply = serde_json::from_str(body).map_err(|e| {
        DeliveryError::UnexpectedResponse { provider: PROVIDER, detail: format!("status {status}: {e}") }
    })?;

    if !(200..300).contains(&status) {
        return Err(DeliveryError::Rejected {
            provider: PROVIDER,
            status,
            detail: reply.message.unwrap_or_else(|| "no message".to_string()),
        });
    }

    reply.sid.map(MessageId).ok_or_else(|| DeliveryError::UnexpectedResponse {
        provider: PROVIDER,
        detail: "missing sid".to_string(),
    })
}
