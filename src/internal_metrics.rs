//! Metric names used by the dispatch engine.
//!
//! The engine records through the `metrics` facade. Nothing is exported
//! unless the embedding process installs a recorder; without one every call
//! is a no-op.

use metrics::Unit;

pub const MESSAGES_RECEIVED: &str = "alerter_messages_received_total";
pub const MESSAGES_REJECTED: &str = "alerter_messages_rejected_total";
pub const KEY_FAILURES: &str = "alerter_key_failures_total";
pub const ALERTS_SENT: &str = "alerter_alerts_sent_total";
pub const IN_FLIGHT_HANDLERS: &str = "alerter_in_flight_handlers";
pub const HANDLE_DURATION: &str = "alerter_handle_duration_seconds";

/// Registers descriptions for all metrics with the installed recorder.
pub fn describe_metrics() {
    metrics::describe_counter!(MESSAGES_RECEIVED, Unit::Count, "Total number of alert messages taken off the inbound channel.");
    metrics::describe_counter!(MESSAGES_REJECTED, Unit::Count, "Total number of messages that failed validation.");
    metrics::describe_counter!(KEY_FAILURES, Unit::Count, "Total number of alert keys that failed, labeled by stage.");
    metrics::describe_counter!(ALERTS_SENT, Unit::Count, "Total number of alerts accepted by a notifier, labeled by notifier.");
    metrics::describe_gauge!(IN_FLIGHT_HANDLERS, Unit::Count, "The number of message handlers currently running.");
    metrics::describe_histogram!(HANDLE_DURATION, Unit::Seconds, "Time taken to handle one message across all of its keys.");
}
