use oxiguard_domain::{DomainError, FilterList, UpdateEvent};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::ports::FilterStorePort;

pub struct RemoveFilterUseCase {
    store: Arc<dyn FilterStorePort>,
}

impl RemoveFilterUseCase {
    pub fn new(store: Arc<dyn FilterStorePort>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, url: &str) -> Result<FilterList, DomainError> {
        let removed = self
            .store
            .delete(url)
            .await
            .ok_or_else(|| DomainError::FilterNotFound(url.to_string()))?;

        // A disabled list was invisible to consumers; no rebuild needed.
        if removed.enabled {
            self.store.notify_observer(UpdateEvent::BeforeUpdate);
            self.store.notify_observer(UpdateEvent::AfterUpdate);
        }

        if let Some(path) = &removed.path {
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "Failed to remove filter file");
            }
        }

        info!(url = %url, "Filter list removed");
        Ok(removed)
    }
}
