use async_trait::async_trait;
use oxiguard_domain::{DomainError, FilterConfig, FilterList, ModifyStatus, UpdateEvent};
use std::sync::Arc;

/// Callback invoked around every commit batch. Must return promptly; the
/// engine calls it synchronously.
pub type UpdateObserver = Arc<dyn Fn(UpdateEvent) + Send + Sync>;

/// Management surface of one filter-list engine instance.
#[async_trait]
pub trait FilterStorePort: Send + Sync {
    /// Materialize descriptors from the files already on disk.
    async fn start(&self);

    /// Snapshot of all descriptors with `path` resolved.
    async fn list(&self) -> Vec<FilterList>;

    /// Download, validate and publish a new filter list. Fails with
    /// `DuplicateFilter` when the name or URL is already present.
    async fn add(&self, name: String, url: String) -> Result<FilterList, DomainError>;

    /// Remove the descriptor with the given URL and return it with `path`
    /// resolved so the caller can unlink the file.
    async fn delete(&self, url: &str) -> Option<FilterList>;

    /// Update descriptor properties. Returns what changed and the
    /// pre-modification descriptor (its `path` points at the old file when
    /// the URL changed).
    async fn modify(
        &self,
        url: &str,
        enabled: bool,
        name: &str,
        new_url: &str,
    ) -> Result<(ModifyStatus, FilterList), DomainError>;

    /// Mark every descriptor due and wake the refresh driver.
    async fn refresh(&self);

    async fn set_config(&self, update_interval_hours: u32) -> Result<(), DomainError>;

    async fn write_disk_config(&self) -> FilterConfig;

    fn set_observer(&self, observer: UpdateObserver);

    fn notify_observer(&self, event: UpdateEvent);

    /// Stop the background drivers. Operations after `close` are undefined.
    async fn close(&self);
}
