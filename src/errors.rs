//! Error taxonomy for message dispatch.
//!
//! Message-scoped errors (`ValidationError`) abort the whole message. Every
//! other error is scoped to a single alert key and is collected into a
//! `KeyFailure` without affecting sibling keys.

use crate::core::VALID_TYPES;
use std::fmt;
use thiserror::Error;

/// A message failed its structural checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message must have at least one element in the 'keys' list")]
    NoKeys,

    #[error("Message must have the 'source' value filled out")]
    EmptySource,

    #[error("Message 'contents' must be filled out")]
    MissingContents,

    #[error("Message 'type' must contain one of {valid:?}, got '{0}'", valid = VALID_TYPES)]
    InvalidType(String),
}

/// Failures reported by a `ConfigStore`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no alerter config stored for key '{0}'")]
    NotFound(String),

    #[error("config store unavailable: {0}")]
    Unavailable(String),

    #[error("config store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while turning an alert key into an `AlerterConfig`.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("unable to fetch alerter config: {0}")]
    Fetch(#[from] StoreError),

    #[error("unable to decode alerter config: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unable to find any alerter named {0}")]
    UnknownType(String),
}

/// A notifier rejected the options of an `AlerterConfig`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifierError {
    #[error("missing required option '{0}'")]
    MissingOption(String),

    #[error("invalid value for option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },
}

/// The stage at which a single key failed.
#[derive(Error, Debug)]
pub enum KeyErrorKind {
    #[error("Unable to load alerter key: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Unable to validate alerter config: {0}")]
    ConfigValidation(#[from] NotifierError),

    #[error("Unable to complete message send: {0:#}")]
    Send(anyhow::Error),
}

/// One failed key of a message, kept structured until it is reported.
#[derive(Debug)]
pub struct KeyFailure {
    pub key: String,
    pub kind: KeyErrorKind,
}

impl KeyFailure {
    pub fn new(key: impl Into<String>, kind: impl Into<KeyErrorKind>) -> Self {
        Self {
            key: key.into(),
            kind: kind.into(),
        }
    }

    /// Renders the entry the way it appears in the aggregated report.
    pub fn render(&self, correlation_id: &str) -> String {
        match &self.kind {
            KeyErrorKind::Resolve(e) => {
                format!("Unable to load alerter key for {}: {}", correlation_id, e)
            }
            KeyErrorKind::ConfigValidation(e) => {
                format!("Unable to validate alerter config for {}: {}", correlation_id, e)
            }
            KeyErrorKind::Send(e) => {
                format!("Unable to complete message send for {}: {:#}", correlation_id, e)
            }
        }
    }

    /// Short machine-friendly label for metrics.
    pub fn stage(&self) -> &'static str {
        match &self.kind {
            KeyErrorKind::Resolve(ResolveError::Fetch(_)) => "fetch",
            KeyErrorKind::Resolve(ResolveError::Decode(_)) => "decode",
            KeyErrorKind::Resolve(ResolveError::UnknownType(_)) => "unknown_type",
            KeyErrorKind::ConfigValidation(_) => "config_validation",
            KeyErrorKind::Send(_) => "send",
        }
    }
}

impl fmt::Display for KeyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.kind)
    }
}
