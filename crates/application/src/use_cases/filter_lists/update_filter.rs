use oxiguard_domain::{DomainError, FilterList, ModifyStatus, UpdateEvent};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::ports::FilterStorePort;

pub struct UpdateFilterUseCase {
    store: Arc<dyn FilterStorePort>,
}

impl UpdateFilterUseCase {
    pub fn new(store: Arc<dyn FilterStorePort>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn execute(
        &self,
        url: &str,
        enabled: bool,
        name: &str,
        new_url: &str,
    ) -> Result<ModifyStatus, DomainError> {
        FilterList::validate_name(name).map_err(DomainError::InvalidFilterList)?;
        FilterList::validate_url(new_url).map_err(DomainError::InvalidFilterList)?;

        let (status, old) = self.store.modify(url, enabled, name, new_url).await?;

        // The engine keeps the old file until we unlink it here.
        if status.contains(ModifyStatus::CHANGED_URL) {
            if let Some(path) = &old.path {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "Failed to remove old filter file");
                }
            }
        }

        if !status.is_empty() {
            self.store.notify_observer(UpdateEvent::BeforeUpdate);
            self.store.notify_observer(UpdateEvent::AfterUpdate);
        }

        info!(url = %url, status = status.bits(), "Filter list modified");
        Ok(status)
    }
}
