use crate::FilterSyncJob;
use oxiguard_filters::FilterRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Spawns the configured background jobs, one sync job per engine instance,
/// optionally under a shared shutdown token.
pub struct JobRunner {
    filter_sync: Vec<FilterSyncJob>,
    shutdown: Option<CancellationToken>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            filter_sync: Vec::new(),
            shutdown: None,
        }
    }

    pub fn with_filter_sync(mut self, job: FilterSyncJob) -> Self {
        self.filter_sync.push(job);
        self
    }

    /// One sync job for every engine in the registry.
    pub fn with_registry(mut self, registry: &FilterRegistry) -> Self {
        for (_, store) in registry.engines() {
            self.filter_sync.push(FilterSyncJob::new(store));
        }
        self
    }

    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    pub async fn start(self) {
        info!("Starting background job runner");

        for job in self.filter_sync {
            let job = match &self.shutdown {
                Some(token) => job.with_cancellation(token.clone()),
                None => job,
            };
            Arc::new(job).start().await;
        }

        info!("All background jobs started");
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
