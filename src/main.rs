//! Alerter - routes health-check alerts to notification backends.
//!
//! Reads newline-delimited JSON alert messages from stdin and dispatches them
//! until end of input or Ctrl-C.

use alerter::{app::App, cli::Cli, config::Config, intake::MessageReader};
use anyhow::Result;
use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            tracing_subscriber::fmt().with_env_filter(EnvFilter::new("error")).init();
            error!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Alerter starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Channel Capacity: {}", config.dispatch.channel_capacity);
    match config.dispatch.max_in_flight {
        Some(limit) => info!("Max In-Flight Handlers: {}", limit),
        None => info!("Max In-Flight Handlers: unbounded"),
    }
    match &config.store.config_dir {
        Some(dir) => info!("Config Store: directory {}", dir.display()),
        None => info!("Config Store: {} static alerters", config.alerters.len()),
    }
    info!("Notifier Timeout: {}s", config.notifiers.timeout_seconds);
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = App::builder(config).build(shutdown_rx).await?;

    // Producer: stdin, one JSON message per line.
    let reader = MessageReader::new(BufReader::new(tokio::io::stdin()), app.messages_tx());
    let mut intake = tokio::spawn(reader.run());

    let mut app_task = tokio::spawn(app.run());
    let mut app_result = None;

    // End of input closes the channel: the dispatcher drains the queue and
    // waits for its handlers. Ctrl-C stops intake, leaving queued messages.
    let interrupted = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            intake.abort();
            true
        }
        res = &mut intake => {
            match res {
                Ok(Ok(n)) => info!("Input finished after {} messages. Draining queued messages...", n),
                Ok(Err(e)) => error!("Message input failed: {}", e),
                Err(e) => error!("Message input task panicked: {:?}", e),
            }
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    res?;
                    true
                }
                res = &mut app_task => {
                    app_result = Some(res);
                    false
                }
            }
        }
    };

    if interrupted {
        info!("Ctrl-C received. Shutting down...");
        if shutdown_tx.send(true).is_err() {
            error!("Failed to send shutdown signal; the application already stopped.");
        }
    }
    let app_result = match app_result {
        Some(res) => res,
        None => app_task.await,
    };
    match app_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Application error: {}", e),
        Err(e) => error!("Application task panicked: {:?}", e),
    }

    info!("All tasks shut down. Exiting.");
    Ok(())
}
