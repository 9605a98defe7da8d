//! Core domain types and service traits for the alerter
//!
//! This module defines the alert message produced by health checks, the
//! per-key notifier configuration, and the trait contracts that the dispatch
//! engine talks to: notifiers, the config store and the report sink.

use crate::errors::{NotifierError, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// The classifications a health check may attach to an alert.
pub const VALID_TYPES: [&str; 3] = ["resolve", "critical", "warning"];

/// Classification of an alert message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Resolve,
    Warning,
    Critical,
}

impl AlertType {
    /// Parses one of the recognised lowercase classification names.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "resolve" => Some(AlertType::Resolve),
            "warning" => Some(AlertType::Warning),
            "critical" => Some(AlertType::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Resolve => "resolve",
            AlertType::Warning => "warning",
            AlertType::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier attached to a message when it enters the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Generates a new random correlation id (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An alert event emitted by a health check.
///
/// Every producer field decodes to its zero value when it is absent or null,
/// so incomplete messages still reach validation and get reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Message {
    /// One of "resolve", "warning" or "critical". Kept as the raw string so
    /// that unrecognised values are rejected by validation, not by parsing.
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    /// Alert keys; each one resolves to its own notifier configuration.
    #[serde(default, deserialize_with = "null_as_default")]
    pub keys: Vec<String>,
    /// Short description of the alert.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// In-depth description of the alert state.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Identity of the producing health check.
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    /// How many check attempts were made.
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u32,
    /// Checker-specific data. `None` means the producer never set it.
    #[serde(default)]
    pub contents: Option<HashMap<String, String>>,
    #[serde(skip)]
    correlation_id: Option<CorrelationId>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Message {
    /// A message with the routing fields set and everything else empty.
    pub fn new<K>(kind: impl Into<String>, keys: impl IntoIterator<Item = K>, source: impl Into<String>) -> Self
    where
        K: Into<String>,
    {
        Self {
            kind: kind.into(),
            keys: keys.into_iter().map(Into::into).collect(),
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_contents(mut self, contents: HashMap<String, String>) -> Self {
        self.contents = Some(contents);
        self
    }

    /// Returns the correlation id, or an empty string before ingestion.
    pub fn correlation_id(&self) -> &str {
        self.correlation_id
            .as_ref()
            .map(CorrelationId::as_str)
            .unwrap_or_default()
    }

    /// Tags the message at ingestion. Later calls keep the first id.
    pub fn assign_correlation_id(&mut self, id: CorrelationId) {
        if self.correlation_id.is_none() {
            self.correlation_id = Some(id);
        }
    }

    /// The parsed classification, if the raw type is recognised.
    pub fn alert_type(&self) -> Option<AlertType> {
        AlertType::parse(&self.kind)
    }
}

/// Notifier configuration stored per alert key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AlerterConfig {
    /// Selects the notifier that handles this key.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    /// Backend-specific settings.
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl AlerterConfig {
    /// Looks up a required, non-empty option.
    pub fn required_option(&self, name: &str) -> Result<&str, NotifierError> {
        match self.options.get(name).map(|v| v.trim()) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(NotifierError::MissingOption(name.to_string())),
        }
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// A notification backend (chat, pager, email, ...)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// The stable type name used as the registry key. Must match the `type`
    /// field of the `AlerterConfig` records that target this backend.
    fn identify(&self) -> &str;

    /// Checks the backend-specific options. Must not have side effects.
    fn validate_config(&self, config: &AlerterConfig) -> Result<(), NotifierError>;

    /// Delivers the alert to the backend.
    ///
    /// # Returns
    /// * `Ok(())` once the backend accepted the alert
    /// * `Err` on any transport or delivery failure
    async fn send(&self, message: &Message, config: &AlerterConfig) -> anyhow::Result<()>;
}

/// External key-value store holding serialised `AlerterConfig` records.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetches the JSON-encoded config for an alert key.
    async fn fetch_alerter_config(&self, key: &str) -> Result<String, StoreError>;
}

/// Severity of an entry written to a `ReportSink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Error,
    Debug,
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLevel::Error => f.write_str("error"),
            ReportLevel::Debug => f.write_str("debug"),
        }
    }
}

/// Destination for operational error and trace entries.
///
/// Implementations are called concurrently from every in-flight handler and
/// must not block.
pub trait ReportSink: Send + Sync {
    fn add(&self, level: ReportLevel, text: String);
}
