use oxiguard_domain::FilterList;
use std::sync::Arc;

use crate::ports::FilterStorePort;

pub struct GetFiltersUseCase {
    store: Arc<dyn FilterStorePort>,
}

impl GetFiltersUseCase {
    pub fn new(store: Arc<dyn FilterStorePort>) -> Self {
        Self { store }
    }

    pub async fn get_all(&self) -> Vec<FilterList> {
        self.store.list().await
    }

    /// Lists a consumer may actually use: enabled and loaded.
    pub async fn get_active(&self) -> Vec<FilterList> {
        self.store
            .list()
            .await
            .into_iter()
            .filter(|f| f.enabled && f.rule_count > 0)
            .collect()
    }
}
