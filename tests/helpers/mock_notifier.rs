//! A configurable notifier that records every call.

use alerter::core::{AlerterConfig, Message, Notifier};
use alerter::errors::NotifierError;
use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

/// One recorded `send` call.
#[derive(Debug, Clone)]
pub struct SentAlert {
    pub correlation_id: String,
    pub message: Message,
    pub config: AlerterConfig,
}

#[derive(Debug)]
pub struct MockNotifier {
    name: &'static str,
    required_option: Option<&'static str>,
    fail_with: Option<String>,
    delay: Option<Duration>,
    panics: bool,
    started: AtomicUsize,
    sent: Mutex<Vec<SentAlert>>,
}

impl MockNotifier {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            required_option: None,
            fail_with: None,
            delay: None,
            panics: false,
            started: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Rejects configs that lack this option.
    pub fn requiring(mut self, option: &'static str) -> Self {
        self.required_option = Some(option);
        self
    }

    /// Fails every send with the given message.
    pub fn failing(mut self, error: &str) -> Self {
        self.fail_with = Some(error.to_string());
        self
    }

    /// Panics inside every send.
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    /// Sleeps before completing each send.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Number of sends that have begun.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Sends that completed, in order.
    pub fn sent(&self) -> Vec<SentAlert> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn identify(&self) -> &str {
        self.name
    }

    fn validate_config(&self, config: &AlerterConfig) -> Result<(), NotifierError> {
        match self.required_option {
            Some(option) => config.required_option(option).map(|_| ()),
            None => Ok(()),
        }
    }

    async fn send(&self, message: &Message, config: &AlerterConfig) -> anyhow::Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if self.panics {
            panic!("{} notifier blew up", self.name);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.fail_with {
            anyhow::bail!("{}", error);
        }
        self.sent.lock().unwrap().push(SentAlert {
            correlation_id: message.correlation_id().to_string(),
            message: message.clone(),
            config: config.clone(),
        });
        Ok(())
    }
}
