//! Command-Line Interface (CLI) argument parsing.
//!
//! Arguments parsed here are the last configuration layer, applied on top of
//! the `alerter.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Routes alert messages from health checks to notification backends.
///
/// Messages are read from stdin as newline-delimited JSON.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level filter (e.g. "debug", "alerter=trace").
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Directory holding one `<key>.json` alerter config per alert key.
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Maximum number of messages handled concurrently.
    #[arg(long, value_name = "N")]
    pub max_in_flight: Option<usize>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        if let Some(dir) = &self.config_dir {
            let mut store = Dict::new();
            store.insert("config_dir".into(), Value::from(dir.display().to_string()));
            dict.insert("store".into(), Value::from(store));
        }

        if let Some(limit) = self.max_in_flight {
            let mut dispatch = Dict::new();
            dispatch.insert("max_in_flight".into(), Value::from(limit));
            dict.insert("dispatch".into(), Value::from(dispatch));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
