//! The dispatch engine.
//!
//! A single intake loop pulls messages off the inbound channel, tags each one
//! with a correlation id and spawns a detached handler for it. The loop never
//! waits for a handler, so intake is decoupled from the latency of the config
//! store and the notifier backends.
//!
//! Handlers are tracked so the loop can wait for them before it returns:
//! when the channel closes after end of input, every queued message is still
//! handled and reported. A shutdown signal stops intake; handlers already
//! running finish, but messages still queued are left unhandled.
//!
//! By default the number of in-flight handlers is unbounded: there is no
//! worker pool and no backpressure, and a burst of messages produces a burst
//! of concurrent handlers. Setting `dispatch.max_in_flight` caps this with a
//! semaphore, in which case the intake loop waits for a free slot before it
//! takes the next message off the channel.

use crate::{
    config::DispatchConfig,
    core::{CorrelationId, Message, ReportLevel, ReportSink},
    errors::{KeyErrorKind, KeyFailure, ResolveError, ValidationError},
    internal_metrics,
    report::{self, IDENTIFIER},
    resolver::ConfigResolver,
    task_manager::TaskManager,
    validation::validate_message,
};
use async_channel::Receiver;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, instrument, warn};

/// Everything a message handler needs, passed in explicitly.
#[derive(Clone)]
pub struct DispatchContext {
    resolver: ConfigResolver,
    sink: Arc<dyn ReportSink>,
}

impl DispatchContext {
    pub fn new(resolver: ConfigResolver, sink: Arc<dyn ReportSink>) -> Self {
        Self { resolver, sink }
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }
}

/// What happened to a single message.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The message failed validation; no key was attempted.
    Rejected(ValidationError),
    /// Every key was resolved and sent.
    Delivered { keys: usize },
    /// At least one key failed. The others were still attempted.
    Failed {
        failures: Vec<KeyFailure>,
        total: usize,
    },
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }

    /// Number of failed keys, or 0 for a rejected message.
    pub fn failure_count(&self) -> usize {
        match self {
            DispatchOutcome::Failed { failures, .. } => failures.len(),
            _ => 0,
        }
    }
}

/// The intake loop over the inbound message channel.
pub struct Dispatcher {
    ctx: Arc<DispatchContext>,
    messages_rx: Receiver<Message>,
    limiter: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    pub fn new(ctx: DispatchContext, messages_rx: Receiver<Message>, config: &DispatchConfig) -> Self {
        let limiter = match config.max_in_flight {
            Some(0) => {
                warn!("dispatch.max_in_flight = 0 would stall intake; running unbounded instead.");
                None
            }
            Some(limit) => Some(Arc::new(Semaphore::new(limit))),
            None => None,
        };
        Self {
            ctx: Arc::new(ctx),
            messages_rx,
            limiter,
        }
    }

    /// Launches the intake loop as a managed task and returns immediately.
    pub fn start(self, task_manager: &TaskManager) {
        let shutdown_rx = task_manager.get_shutdown_rx();
        task_manager.spawn("DispatchIntake", self.run(shutdown_rx));
    }

    /// Runs the intake loop until shutdown is signalled or the channel closes,
    /// then waits for the handlers it spawned.
    ///
    /// Handlers are never cancelled. A closed channel is only observed once
    /// it is empty, so every queued message gets handled.
    #[instrument(skip_all)]
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        match &self.limiter {
            Some(limiter) => info!(
                max_in_flight = limiter.available_permits(),
                "Dispatch intake started (bounded)."
            ),
            None => info!("Dispatch intake started (unbounded)."),
        }

        let mut handlers = JoinSet::new();
        'intake: loop {
            let permit = match self.acquire_slot(&mut shutdown_rx).await {
                Some(permit) => permit,
                None => break,
            };

            let next = loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        info!("Dispatch intake received shutdown signal.");
                        break 'intake;
                    }
                    Some(res) = handlers.join_next(), if !handlers.is_empty() => log_handler_exit(res),
                    res = self.messages_rx.recv() => break res,
                }
            };

            let mut message = match next {
                Ok(message) => message,
                Err(_) => {
                    info!("Inbound message channel closed, dispatch intake shutting down.");
                    break;
                }
            };

            message.assign_correlation_id(CorrelationId::generate());
            metrics::counter!(internal_metrics::MESSAGES_RECEIVED).increment(1);
            debug!(
                "{}: Received message ({}) from checker '{}' -> {:?}",
                IDENTIFIER,
                message.correlation_id(),
                message.source,
                message.keys
            );

            let ctx = self.ctx.clone();
            handlers.spawn(async move {
                let _permit = permit;
                let _in_flight = InFlightGuard::enter();
                handle_message(&ctx, message).await;
            });
        }

        if !handlers.is_empty() {
            info!("Waiting for {} in-flight handlers to finish...", handlers.len());
        }
        while let Some(res) = handlers.join_next().await {
            log_handler_exit(res);
        }
        info!("Dispatch intake finished.");
    }

    /// Waits for a handler slot when bounded. `None` means stop intake.
    async fn acquire_slot(
        &self,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Option<Option<OwnedSemaphorePermit>> {
        let Some(limiter) = &self.limiter else {
            return Some(None);
        };
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                info!("Dispatch intake received shutdown signal while waiting for a slot.");
                None
            }
            permit = limiter.clone().acquire_owned() => permit.ok().map(Some),
        }
    }
}

fn log_handler_exit(res: Result<(), JoinError>) {
    if let Err(e) = res {
        error!(error = %e, "Message handler panicked.");
    }
}

/// Keeps `alerter_in_flight_handlers` accurate even if a handler unwinds.
struct InFlightGuard;

impl InFlightGuard {
    fn enter() -> Self {
        metrics::gauge!(internal_metrics::IN_FLIGHT_HANDLERS).increment(1.0);
        InFlightGuard
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        metrics::gauge!(internal_metrics::IN_FLIGHT_HANDLERS).decrement(1.0);
    }
}

/// Handles one message: validate, then resolve and send every key.
///
/// Emits exactly one entry to the report sink: an error for a rejected
/// message, one aggregated error if any key failed, or a debug trace when all
/// keys succeeded.
#[instrument(skip_all, fields(correlation_id = %message.correlation_id(), source = %message.source))]
pub async fn handle_message(ctx: &DispatchContext, message: Message) -> DispatchOutcome {
    let start = Instant::now();

    if let Err(e) = validate_message(&message) {
        metrics::counter!(internal_metrics::MESSAGES_REJECTED).increment(1);
        ctx.sink
            .add(ReportLevel::Error, report::render_validation_failure(&message, &e));
        return DispatchOutcome::Rejected(e);
    }

    let mut failures = Vec::new();
    for key in &message.keys {
        if let Err(kind) = dispatch_key(ctx, key, &message).await {
            let failure = KeyFailure::new(key.clone(), kind);
            error!("{}: {}", IDENTIFIER, failure.render(message.correlation_id()));
            metrics::counter!(internal_metrics::KEY_FAILURES, "stage" => failure.stage()).increment(1);
            failures.push(failure);
        }
    }

    metrics::histogram!(internal_metrics::HANDLE_DURATION).record(start.elapsed().as_secs_f64());

    if failures.is_empty() {
        ctx.sink.add(ReportLevel::Debug, report::render_success(&message));
        DispatchOutcome::Delivered {
            keys: message.keys.len(),
        }
    } else {
        ctx.sink
            .add(ReportLevel::Error, report::render_key_failures(&message, &failures));
        DispatchOutcome::Failed {
            failures,
            total: message.keys.len(),
        }
    }
}

async fn dispatch_key(ctx: &DispatchContext, key: &str, message: &Message) -> Result<(), KeyErrorKind> {
    let config = ctx.resolver.load_alerter_config(key, message).await?;
    let notifier = ctx
        .resolver
        .registry()
        .get(&config.kind)
        .ok_or_else(|| ResolveError::UnknownType(config.kind.clone()))?;

    notifier.validate_config(&config)?;

    debug!(
        "{}: Sending {} to alerter {}!",
        IDENTIFIER,
        message.correlation_id(),
        config.kind
    );
    notifier
        .send(message, &config)
        .await
        .map_err(KeyErrorKind::Send)?;

    metrics::counter!(internal_metrics::ALERTS_SENT, "notifier" => config.kind.clone()).increment(1);
    Ok(())
}
