use oxiguard_domain::{DomainError, FilterList, UpdateEvent};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::ports::FilterStorePort;

pub struct AddFilterUseCase {
    store: Arc<dyn FilterStorePort>,
}

impl AddFilterUseCase {
    pub fn new(store: Arc<dyn FilterStorePort>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, name: String, url: String) -> Result<FilterList, DomainError> {
        FilterList::validate_name(&name).map_err(DomainError::InvalidFilterList)?;
        FilterList::validate_url(&url).map_err(DomainError::InvalidFilterList)?;

        let path = Path::new(&url);
        if path.is_absolute() && !path.is_file() {
            return Err(DomainError::InvalidFilterList(format!(
                "no such file: {url}"
            )));
        }

        let filter = self.store.add(name.clone(), url).await?;

        info!(
            filter_id = filter.id,
            name = %name,
            rule_count = filter.rule_count,
            "Filter list added"
        );

        // Let consumers pick up the new file.
        self.store.notify_observer(UpdateEvent::BeforeUpdate);
        self.store.notify_observer(UpdateEvent::AfterUpdate);

        Ok(filter)
    }
}
