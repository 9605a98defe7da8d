//! Configuration management for the alerter
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, an `alerter.toml` file,
//! `ALERTER_` environment variables and command-line arguments, in that order.

use crate::cli::Cli;
use crate::core::AlerterConfig;
use crate::notifiers::pagerduty::DEFAULT_EVENTS_URL;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "alerter.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level filter (overridden by `RUST_LOG`).
    pub log_level: String,
    /// Configuration for the dispatch engine.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Where per-key alerter configs are looked up.
    #[serde(default)]
    pub store: StoreConfig,
    /// Settings shared by the built-in notifiers.
    #[serde(default)]
    pub notifiers: NotifiersConfig,
    /// Static alerter configs keyed by alert key, used when no config
    /// directory is set.
    #[serde(default)]
    pub alerters: HashMap<String, AlerterConfig>,
}

/// Configuration for the dispatch engine.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Capacity of the inbound message channel. `0` means unbounded.
    pub channel_capacity: usize,
    /// Upper bound on concurrently running message handlers. Unset means
    /// unbounded.
    pub max_in_flight: Option<usize>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            max_in_flight: None,
        }
    }
}

/// Configuration for the config store.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory containing one `<key>.json` file per alert key.
    pub config_dir: Option<PathBuf>,
}

/// Configuration for the built-in notifiers.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct NotifiersConfig {
    /// Request timeout for HTTP-based notifiers.
    pub timeout_seconds: u64,
    /// PagerDuty Events API v2 endpoint.
    pub pagerduty_events_url: String,
}

impl Default for NotifiersConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            pagerduty_events_url: DEFAULT_EVENTS_URL.to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration for the given command line.
    ///
    /// A missing config file is not an error; defaults and the other layers
    /// still apply.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g. ALERTER_DISPATCH__MAX_IN_FLIGHT=64
            .merge(Env::prefixed("ALERTER_").split("__"))
            .merge(cli)
            .extract()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            dispatch: DispatchConfig::default(),
            store: StoreConfig::default(),
            notifiers: NotifiersConfig::default(),
            alerters: HashMap::new(),
        }
    }
}
