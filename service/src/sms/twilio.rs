//! Twilio REST implementation of [`SmsSender`].

use async_trait::async_trait;
use tracing::debug;

use super::{SmsError, SmsSender};
use crate::config::SmsConfig;

const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Sends real SMS through Twilio's Messages endpoint.
pub struct TwilioSender {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
    messaging_service_sid: String,
}

impl TwilioSender {
    #[must_use]
    pub fn new(config: &SmsConfig) -> Self {
        Self::with_base_url(config, TWILIO_API_BASE)
    }

    /// Point the sender at a different API host (for testing against a
    /// local mock server).
    pub fn with_base_url(config: &SmsConfig, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.from.clone(),
            messaging_service_sid: config.messaging_service_sid.clone(),
        }
    }
}

#[async_trait]
impl SmsSender for TwilioSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        // Messaging service wins when both are configured: Twilio then picks
        // the sender number and handles carrier compliance.
        let mut form: Vec<(&str, &str)> = vec![("To", to), ("Body", body)];
        if self.messaging_service_sid.is_empty() {
            form.push(("From", self.from.as_str()));
        } else {
            form.push(("MessagingServiceSid", self.messaging_service_sid.as_str()));
        }

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SmsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(to = %to, "SMS dispatched");
        Ok(())
    }
}
