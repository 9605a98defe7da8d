//! A notifier that posts alerts to a Slack incoming webhook.

use crate::core::{AlerterConfig, Message, Notifier};
use crate::errors::NotifierError;
use crate::formatting::summary_line;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, instrument};

const WEBHOOK_URL: &str = "webhook_url";
const CHANNEL: &str = "channel";

/// Posts `{"text": ...}` to the `webhook_url` option of each config.
pub struct SlackNotifier {
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn payload(message: &Message, config: &AlerterConfig) -> Value {
        let mut payload = json!({ "text": summary_line(message) });
        if let Some(channel) = config.options.get(CHANNEL).filter(|c| !c.is_empty()) {
            payload["channel"] = Value::String(channel.clone());
        }
        payload
    }

    async fn send_request(&self, webhook_url: &str, payload: &Value) -> anyhow::Result<()> {
        let response = self.client.post(webhook_url).json(payload).send().await;

        match response {
            Ok(res) => {
                if res.status().is_success() {
                    Ok(())
                } else {
                    let status = res.status();
                    let text = res.text().await.unwrap_or_default();
                    error!(
                        status = %status,
                        body = %text,
                        "Failed to send Slack notification"
                    );
                    anyhow::bail!(
                        "Failed to send Slack notification: status {}, body: {}",
                        status,
                        text
                    );
                }
            }
            Err(e) => {
                error!(error = %e, "HTTP request to Slack failed");
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn identify(&self) -> &str {
        "slack"
    }

    fn validate_config(&self, config: &AlerterConfig) -> Result<(), NotifierError> {
        let url = config.required_option(WEBHOOK_URL)?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(NotifierError::InvalidOption {
                name: WEBHOOK_URL.to_string(),
                reason: "must be an http(s) URL".to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip_all, fields(correlation_id = %message.correlation_id()))]
    async fn send(&self, message: &Message, config: &AlerterConfig) -> anyhow::Result<()> {
        let webhook_url = config.required_option(WEBHOOK_URL)?;
        let payload = Self::payload(message, config);
        self.send_request(webhook_url, &payload).await?;
        info!("Successfully sent alert to Slack.");
        Ok(())
    }
}
