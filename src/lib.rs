//! Alerter - the alert-dispatch stage of a monitoring platform
//!
//! This library receives alert messages produced by health checks and routes
//! each one to the notification backends configured for its alert keys.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatcher;
pub mod errors;
pub mod formatting;
pub mod intake;
pub mod internal_metrics;
pub mod notifiers;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod store;
pub mod task_manager;
pub mod validation;

// Re-export core types for convenience
pub use crate::core::*;
pub use dispatcher::{handle_message, DispatchContext, DispatchOutcome, Dispatcher};
