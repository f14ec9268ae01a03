use oxiguard_domain::{DomainError, FilterCategory, FilteringConfig};
use std::sync::Arc;
use tracing::{error, info};

use crate::store::FilterStore;

/// The filtering module: one engine instance per consumer category, each
/// with its own directory under the data dir, all sharing one HTTP client.
pub struct FilterRegistry {
    engines: Vec<(FilterCategory, Arc<FilterStore>)>,
}

impl FilterRegistry {
    pub fn new(conf: FilteringConfig, client: reqwest::Client) -> Self {
        let mut engines = Vec::with_capacity(FilterCategory::ALL.len());
        for category in FilterCategory::ALL {
            let dir = conf.data_dir.join(category.dir_name());
            if let Err(e) = std::fs::create_dir_all(&dir) {
                error!(dir = %dir.display(), error = %e, "failed to create filter directory");
            }
            let list = match category {
                FilterCategory::Blocklist => conf.blocklist.clone(),
                FilterCategory::Allowlist => conf.allowlist.clone(),
                FilterCategory::Proxylist => conf.proxylist.clone(),
            };
            let store = FilterStore::new(
                oxiguard_domain::FilterConfig {
                    filter_dir: dir,
                    update_interval_hours: conf.update_interval_hours,
                    list,
                },
                client.clone(),
            );
            engines.push((category, Arc::new(store)));
        }
        Self { engines }
    }

    /// Resolve a category to its engine.
    pub fn get(&self, category: FilterCategory) -> Arc<FilterStore> {
        let (_, store) = self
            .engines
            .iter()
            .find(|(c, _)| *c == category)
            .expect("registry holds every category");
        Arc::clone(store)
    }

    pub fn engines(&self) -> impl Iterator<Item = (FilterCategory, Arc<FilterStore>)> + '_ {
        self.engines.iter().map(|(c, s)| (*c, Arc::clone(s)))
    }

    pub async fn start(&self) {
        for (category, store) in &self.engines {
            store.start().await;
            info!(category = %category, "filter engine started");
        }
    }

    pub async fn close(&self) {
        for (_, store) in &self.engines {
            store.close().await;
        }
    }

    pub async fn set_config(&self, update_interval_hours: u32) -> Result<(), DomainError> {
        for (_, store) in &self.engines {
            store.set_config(update_interval_hours).await?;
        }
        Ok(())
    }

    pub async fn write_disk_config(&self, conf: &mut FilteringConfig) {
        for (category, store) in &self.engines {
            let c = store.write_disk_config().await;
            conf.update_interval_hours = c.update_interval_hours;
            match category {
                FilterCategory::Blocklist => conf.blocklist = c.list,
                FilterCategory::Allowlist => conf.allowlist = c.list,
                FilterCategory::Proxylist => conf.proxylist = c.list,
            }
        }
    }
}
