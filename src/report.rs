//! Report sinks and the texts written to them.

use crate::core::{Message, ReportLevel, ReportSink};
use crate::errors::{KeyFailure, ValidationError};
use std::sync::Mutex;
use tracing::{debug, error};

/// Prefix that identifies entries written by the dispatch engine.
pub const IDENTIFIER: &str = "alerter";

/// Writes report entries to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn add(&self, level: ReportLevel, text: String) {
        match level {
            ReportLevel::Error => error!(target: "alerter::report", "{}", text),
            ReportLevel::Debug => debug!(target: "alerter::report", "{}", text),
        }
    }
}

/// A single recorded report entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub level: ReportLevel,
    pub text: String,
}

/// Append-only in-memory sink.
#[derive(Debug, Default)]
pub struct MemoryReportSink {
    entries: Mutex<Vec<ReportEntry>>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportSink for MemoryReportSink {
    fn add(&self, level: ReportLevel, text: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(ReportEntry { level, text });
        }
    }
}

pub fn render_validation_failure(message: &Message, err: &ValidationError) -> String {
    format!(
        "{}: Unable to validate message {}: {}",
        IDENTIFIER,
        message.correlation_id(),
        err
    )
}

/// Joins per-key failures into the single aggregated report line.
pub fn render_key_failures(message: &Message, failures: &[KeyFailure]) -> String {
    let entries: Vec<String> = failures
        .iter()
        .map(|f| f.render(message.correlation_id()))
        .collect();
    format!(
        "{}: Ran into {} errors during alert send for {} (alerters: {:?}); error list: {}",
        IDENTIFIER,
        failures.len(),
        message.source,
        message.keys,
        entries.join("; ")
    )
}

pub fn render_success(message: &Message) -> String {
    format!(
        "{}: Successfully sent {} alert messages for {} (alerters: {:?})",
        IDENTIFIER,
        message.keys.len(),
        message.correlation_id(),
        message.keys
    )
}
