//! The main application wiring, decoupled from the entry point.

use crate::{
    config::Config,
    core::{ConfigStore, Message, Notifier, ReportSink},
    dispatcher::{DispatchContext, Dispatcher},
    internal_metrics,
    notifiers,
    registry::NotifierRegistry,
    report::TracingReportSink,
    resolver::ConfigResolver,
    store::{FileConfigStore, MemoryConfigStore},
    task_manager::TaskManager,
};
use anyhow::Result;
use async_channel::{Receiver, Sender};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// A handle to the running application.
pub struct App {
    task_manager: TaskManager,
    messages_tx: Sender<Message>,
    registry: Arc<NotifierRegistry>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// A producer handle for the inbound message channel.
    pub fn messages_tx(&self) -> Sender<Message> {
        self.messages_tx.clone()
    }

    pub fn registry(&self) -> &Arc<NotifierRegistry> {
        &self.registry
    }

    pub fn task_manager(&self) -> &TaskManager {
        &self.task_manager
    }

    /// Waits for the managed tasks to finish.
    ///
    /// The dispatcher returns once shutdown is signalled, or once every
    /// producer handle from `messages_tx` is dropped and the queued messages
    /// have been handled.
    pub async fn run(self) -> Result<()> {
        let App {
            task_manager,
            messages_tx,
            ..
        } = self;
        drop(messages_tx);

        task_manager.shutdown().await;
        Ok(())
    }
}

/// Builder for the main application.
///
/// Every external collaborator can be overridden so tests can run the full
/// engine against fakes.
pub struct AppBuilder {
    config: Config,
    store_override: Option<Arc<dyn ConfigStore>>,
    notifiers_override: Option<Vec<Arc<dyn Notifier>>>,
    sink_override: Option<Arc<dyn ReportSink>>,
    messages_channel: Option<(Sender<Message>, Receiver<Message>)>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store_override: None,
            notifiers_override: None,
            sink_override: None,
            messages_channel: None,
        }
    }

    /// Overrides the config store.
    pub fn store_override(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store_override = Some(store);
        self
    }

    /// Replaces the built-in notifiers.
    pub fn notifiers_override(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notifiers_override = Some(notifiers);
        self
    }

    /// Overrides the report sink.
    pub fn sink_override(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink_override = Some(sink);
        self
    }

    /// Uses an existing inbound channel instead of creating one.
    pub fn messages_channel(mut self, tx: Sender<Message>, rx: Receiver<Message>) -> Self {
        self.messages_channel = Some((tx, rx));
        self
    }

    /// Builds the registry, resolver and dispatcher and starts intake.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        let task_manager = TaskManager::new(shutdown_rx);
        internal_metrics::describe_metrics();

        // =========================================================================
        // 1. Notifier registry
        // =========================================================================
        let notifiers = match self.notifiers_override {
            Some(notifiers) => notifiers,
            None => notifiers::default_notifiers(&config.notifiers)?,
        };
        let registry = Arc::new(NotifierRegistry::new(notifiers));
        info!(notifiers = ?registry.names(), "Notifier registry built");

        // =========================================================================
        // 2. Config store and resolver
        // =========================================================================
        let store: Arc<dyn ConfigStore> = match self.store_override {
            Some(store) => store,
            None => match &config.store.config_dir {
                Some(dir) => {
                    if !config.alerters.is_empty() {
                        warn!(
                            "Both store.config_dir and [alerters] are set; the {} static alerters are ignored.",
                            config.alerters.len()
                        );
                    }
                    info!(config_dir = %dir.display(), "Using file config store");
                    Arc::new(FileConfigStore::new(dir))
                }
                None => {
                    info!(alerters = config.alerters.len(), "Using static config store");
                    Arc::new(MemoryConfigStore::from_configs(&config.alerters)?)
                }
            },
        };
        let resolver = ConfigResolver::new(store, registry.clone());

        // =========================================================================
        // 3. Dispatch engine
        // =========================================================================
        let sink = self
            .sink_override
            .unwrap_or_else(|| Arc::new(TracingReportSink) as Arc<dyn ReportSink>);
        let (messages_tx, messages_rx) = match self.messages_channel {
            Some(channel) => channel,
            None if config.dispatch.channel_capacity == 0 => async_channel::unbounded(),
            None => async_channel::bounded(config.dispatch.channel_capacity),
        };
        debug!(
            channel_capacity = config.dispatch.channel_capacity,
            max_in_flight = ?config.dispatch.max_in_flight,
            "Starting dispatcher"
        );
        Dispatcher::new(DispatchContext::new(resolver, sink), messages_rx, &config.dispatch)
            .start(&task_manager);

        info!("Alerter initialized successfully. Waiting for messages...");

        Ok(App {
            task_manager,
            messages_tx,
            registry,
        })
    }
}
