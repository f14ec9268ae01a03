use oxiguard_filters::{FilterStore, Signal};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// First wake comes quickly; later ones back off while the network or the
/// upstream servers are down.
const INITIAL_PERIOD_SECS: u64 = 5;
const MAX_PERIOD_SECS: u64 = 60 * 60;

/// Background drivers for one filter-list engine instance.
///
/// Two cooperating tasks are spawned from `start`:
///   - the timer driver queues a wake on a dynamically doubling interval
///     (5 s up to 1 h) while scheduled updates are enabled;
///   - the signal driver owns the engine's wake queue and runs one refresh
///     pass per wake, exiting on the shutdown sentinel or cancellation.
///
/// `Arc<Self>` spawn so the job owns its state across ticks.
pub struct FilterSyncJob {
    store: Arc<FilterStore>,
    shutdown: CancellationToken,
}

impl FilterSyncJob {
    pub fn new(store: Arc<FilterStore>) -> Self {
        Self {
            store,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(dir = %self.store.dir().display(), "Starting filter sync job");

        let Some(mut signals) = self.store.take_signal_receiver() else {
            error!("FilterSyncJob: signal receiver already taken; not starting");
            return;
        };

        let timer_job = Arc::clone(&self);
        let store_shutdown = self.store.shutdown_token();
        tokio::spawn(async move {
            let mut period = INITIAL_PERIOD_SECS;
            loop {
                let sleep_secs = if timer_job.store.update_interval_hours().await == 0 {
                    // Scheduled updates disabled; only explicit refreshes run.
                    MAX_PERIOD_SECS
                } else {
                    timer_job.store.poke();
                    let current = period;
                    period = (period * 2).min(MAX_PERIOD_SECS);
                    current
                };

                tokio::select! {
                    _ = timer_job.shutdown.cancelled() => break,
                    _ = store_shutdown.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(sleep_secs)) => {}
                }
            }
            info!("FilterSyncJob: timer driver stopped");
        });

        let signal_job = Arc::clone(&self);
        let store_shutdown = self.store.shutdown_token();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = signal_job.shutdown.cancelled() => break,
                    _ = store_shutdown.cancelled() => break,
                    signal = signals.recv() => match signal {
                        Some(Signal::Wake) => signal_job.store.update_pass().await,
                        Some(Signal::Shutdown) | None => break,
                    },
                }
            }
            info!("FilterSyncJob: signal driver stopped");
        });
    }
}
