//! A notifier that writes alerts to the service log.

use crate::core::{AlerterConfig, Message, Notifier};
use crate::errors::NotifierError;
use crate::formatting::{contents_line, summary_line};
use async_trait::async_trait;
use tracing::info;

/// Logs every alert at `info`. Accepts any options.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn identify(&self) -> &str {
        "log"
    }

    fn validate_config(&self, _config: &AlerterConfig) -> Result<(), NotifierError> {
        Ok(())
    }

    async fn send(&self, message: &Message, config: &AlerterConfig) -> anyhow::Result<()> {
        info!(
            target: "alerter::alert",
            correlation_id = %message.correlation_id(),
            description = %config.description,
            count = message.count,
            contents = %contents_line(message),
            "{}",
            summary_line(message)
        );
        Ok(())
    }
}
