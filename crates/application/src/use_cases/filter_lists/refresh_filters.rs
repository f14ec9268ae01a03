use std::sync::Arc;
use tracing::{info, instrument};

use crate::ports::FilterStorePort;

pub struct RefreshFiltersUseCase {
    store: Arc<dyn FilterStorePort>,
}

impl RefreshFiltersUseCase {
    pub fn new(store: Arc<dyn FilterStorePort>) -> Self {
        Self { store }
    }

    /// Fire-and-forget: callers observe completion through `list` or the
    /// update observer.
    #[instrument(skip(self))]
    pub async fn execute(&self) {
        self.store.refresh().await;
        info!("Filter refresh requested");
    }
}
