//! Concrete notifier backends.
//!
//! Each backend only knows how to validate its own `options` and how to hand
//! a message to its service. Routing between backends is the dispatcher's job.
pub mod log;
pub mod pagerduty;
pub mod slack;

pub use self::log::LogNotifier;
pub use pagerduty::PagerDutyNotifier;
pub use slack::SlackNotifier;

use crate::config::NotifiersConfig;
use crate::core::Notifier;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Instantiates the built-in notifiers from the configuration.
pub fn default_notifiers(config: &NotifiersConfig) -> Result<Vec<Arc<dyn Notifier>>> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    let notifiers: Vec<Arc<dyn Notifier>> = vec![
        Arc::new(SlackNotifier::new(timeout)?),
        Arc::new(PagerDutyNotifier::new(
            config.pagerduty_events_url.clone(),
            timeout,
        )?),
        Arc::new(LogNotifier),
    ];
    Ok(notifiers)
}
