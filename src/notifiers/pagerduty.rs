//! A notifier that raises and resolves PagerDuty incidents (Events API v2).

use crate::core::{AlertType, AlerterConfig, Message, Notifier};
use crate::errors::NotifierError;
use crate::formatting::summary_line;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, instrument};

pub const DEFAULT_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

const ROUTING_KEY: &str = "routing_key";
const SEVERITY: &str = "severity";
const SEVERITIES: [&str; 4] = ["critical", "error", "warning", "info"];

/// Sends one event per alert to the configured events endpoint.
pub struct PagerDutyNotifier {
    client: reqwest::Client,
    events_url: String,
}

impl PagerDutyNotifier {
    pub fn new(events_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, events_url })
    }

    /// Builds the event body. `resolve` messages close the incident that
    /// shares their dedup key; everything else triggers one.
    fn event(message: &Message, routing_key: &str, config: &AlerterConfig) -> Value {
        let alert_type = message.alert_type();
        let event_action = match alert_type {
            Some(AlertType::Resolve) => "resolve",
            _ => "trigger",
        };
        let severity = config
            .options
            .get(SEVERITY)
            .map(String::as_str)
            .unwrap_or(match alert_type {
                Some(AlertType::Critical) => "critical",
                Some(AlertType::Warning) => "warning",
                _ => "info",
            });

        json!({
            "routing_key": routing_key,
            "event_action": event_action,
            "dedup_key": format!("{}:{}", message.source, message.title),
            "payload": {
                "summary": summary_line(message),
                "source": message.source,
                "severity": severity,
                "custom_details": message.contents,
            },
        })
    }
}

#[async_trait]
impl Notifier for PagerDutyNotifier {
    fn identify(&self) -> &str {
        "pagerduty"
    }

    fn validate_config(&self, config: &AlerterConfig) -> Result<(), NotifierError> {
        config.required_option(ROUTING_KEY)?;
        if let Some(severity) = config.options.get(SEVERITY) {
            if !SEVERITIES.contains(&severity.as_str()) {
                return Err(NotifierError::InvalidOption {
                    name: SEVERITY.to_string(),
                    reason: format!("must be one of {:?}", SEVERITIES),
                });
            }
        }
        Ok(())
    }

    #[instrument(skip_all, fields(correlation_id = %message.correlation_id()))]
    async fn send(&self, message: &Message, config: &AlerterConfig) -> anyhow::Result<()> {
        let routing_key = config.required_option(ROUTING_KEY)?;
        let event = Self::event(message, routing_key, config);

        let res = self
            .client
            .post(&self.events_url)
            .json(&event)
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "HTTP request to PagerDuty failed"))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "PagerDuty rejected event");
            anyhow::bail!("PagerDuty rejected event: status {}, body: {}", status, text);
        }

        info!(event_action = %event["event_action"], "Successfully sent event to PagerDuty.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(kind: &str) -> Message {
        let mut message = Message::new(kind, ["svc-a"], "http-check")
            .with_contents(HashMap::from([("host".to_string(), "h1".to_string())]));
        message.title = "api down".to_string();
        message
    }

    fn config() -> AlerterConfig {
        AlerterConfig {
            kind: "pagerduty".to_string(),
            options: HashMap::from([(ROUTING_KEY.to_string(), "abc123".to_string())]),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_config() {
        let notifier = PagerDutyNotifier::new(DEFAULT_EVENTS_URL.to_string(), Duration::from_secs(1)).unwrap();
        assert!(notifier.validate_config(&config()).is_ok());
        assert_eq!(
            notifier.validate_config(&AlerterConfig::default()),
            Err(NotifierError::MissingOption(ROUTING_KEY.to_string()))
        );

        let mut bad = config();
        bad.options.insert(SEVERITY.to_string(), "loud".to_string());
        assert!(matches!(
            notifier.validate_config(&bad),
            Err(NotifierError::InvalidOption { name, .. }) if name == SEVERITY
        ));
    }

    #[test]
    fn test_event_maps_type_to_action_and_severity() {
        let trigger = PagerDutyNotifier::event(&message("critical"), "abc123", &config());
        assert_eq!(trigger["event_action"], "trigger");
        assert_eq!(trigger["payload"]["severity"], "critical");
        assert_eq!(trigger["dedup_key"], "http-check:api down");
        assert_eq!(trigger["payload"]["custom_details"]["host"], "h1");

        let resolve = PagerDutyNotifier::event(&message("resolve"), "abc123", &config());
        assert_eq!(resolve["event_action"], "resolve");
        assert_eq!(resolve["payload"]["severity"], "info");
    }

    #[tokio::test]
    async fn test_send_posts_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/enqueue"))
            .and(body_partial_json(json!({
                "routing_key": "abc123",
                "event_action": "trigger",
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            PagerDutyNotifier::new(format!("{}/v2/enqueue", server.uri()), Duration::from_secs(5)).unwrap();
        assert!(notifier.send(&message("warning"), &config()).await.is_ok());
    }

    #[tokio::test]
    async fn test_send_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid routing key"))
            .mount(&server)
            .await;

        let notifier = PagerDutyNotifier::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = notifier.send(&message("critical"), &config()).await.unwrap_err();
        assert!(err.to_string().contains("invalid routing key"));
    }
}
