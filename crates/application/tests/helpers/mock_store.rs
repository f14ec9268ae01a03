#![allow(dead_code)]

use async_trait::async_trait;
use oxiguard_application::ports::{FilterStorePort, UpdateObserver};
use oxiguard_domain::{DomainError, FilterConfig, FilterList, ModifyStatus, UpdateEvent};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::sync::RwLock;

/// In-memory engine stand-in. Writes real files under `dir` so the use-case
/// file-cleanup paths can be exercised.
pub struct MockFilterStore {
    dir: PathBuf,
    filters: RwLock<Vec<FilterList>>,
    next_id: AtomicU64,
    events: StdMutex<Vec<UpdateEvent>>,
    refresh_count: AtomicU64,
    modify_count: AtomicU64,
    fail_downloads: StdMutex<bool>,
}

impl MockFilterStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            filters: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1_600_000_000),
            events: StdMutex::new(Vec::new()),
            refresh_count: AtomicU64::new(0),
            modify_count: AtomicU64::new(0),
            fail_downloads: StdMutex::new(false),
        }
    }

    pub fn set_fail_downloads(&self, fail: bool) {
        *self.fail_downloads.lock().unwrap() = fail;
    }

    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::Relaxed)
    }

    pub fn modify_count(&self) -> u64 {
        self.modify_count.load(Ordering::Relaxed)
    }

    pub async fn count(&self) -> usize {
        self.filters.read().await.len()
    }

    fn file_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{id}.txt"))
    }

    fn fake_download(&self, id: u64) -> Result<u64, DomainError> {
        if *self.fail_downloads.lock().unwrap() {
            return Err(DomainError::Network("connection refused".to_string()));
        }
        std::fs::write(self.file_path(id), "||example.org^\n||example.com^\n")
            .map_err(|e| DomainError::Io(e.to_string()))?;
        Ok(2)
    }
}

#[async_trait]
impl FilterStorePort for MockFilterStore {
    async fn start(&self) {}

    async fn list(&self) -> Vec<FilterList> {
        let filters = self.filters.read().await;
        filters
            .iter()
            .map(|f| {
                let mut f = f.clone();
                f.path = Some(self.file_path(f.id));
                f
            })
            .collect()
    }

    async fn add(&self, name: String, url: String) -> Result<FilterList, DomainError> {
        let mut filters = self.filters.write().await;
        if filters.iter().any(|f| f.name == name || f.url == url) {
            return Err(DomainError::DuplicateFilter(url));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut filter = FilterList::new(name, url);
        filter.id = id;
        filter.enabled = true;
        filter.rule_count = self.fake_download(id)?;
        let mut published = filter.clone();
        published.path = Some(self.file_path(id));
        filters.push(filter);
        Ok(published)
    }

    async fn delete(&self, url: &str) -> Option<FilterList> {
        let mut filters = self.filters.write().await;
        let pos = filters.iter().position(|f| f.url == url)?;
        let mut removed = filters.remove(pos);
        removed.path = Some(self.file_path(removed.id));
        Some(removed)
    }

    async fn modify(
        &self,
        url: &str,
        enabled: bool,
        name: &str,
        new_url: &str,
    ) -> Result<(ModifyStatus, FilterList), DomainError> {
        self.modify_count.fetch_add(1, Ordering::Relaxed);
        let mut filters = self.filters.write().await;
        let pos = filters
            .iter()
            .position(|f| f.url == url)
            .ok_or_else(|| DomainError::FilterNotFound(url.to_string()))?;

        let mut old = filters[pos].clone();
        old.path = Some(self.file_path(old.id));

        let mut status = ModifyStatus::NONE;
        let filter = &mut filters[pos];
        filter.name = name.to_string();
        if filter.enabled != enabled {
            filter.enabled = enabled;
            status |= ModifyStatus::CHANGED_ENABLED;
        }
        if filter.url != new_url {
            status |= ModifyStatus::CHANGED_URL;
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            filter.id = id;
            filter.url = new_url.to_string();
            filter.rule_count = self.fake_download(id)?;
        }
        Ok((status, old))
    }

    async fn refresh(&self) {
        self.refresh_count.fetch_add(1, Ordering::Relaxed);
    }

    async fn set_config(&self, _update_interval_hours: u32) -> Result<(), DomainError> {
        Ok(())
    }

    async fn write_disk_config(&self) -> FilterConfig {
        let filters = self.filters.read().await;
        FilterConfig {
            filter_dir: self.dir.clone(),
            update_interval_hours: 24,
            list: filters.iter().map(|f| f.to_persisted()).collect(),
        }
    }

    fn set_observer(&self, _observer: UpdateObserver) {}

    fn notify_observer(&self, event: UpdateEvent) {
        self.events.lock().unwrap().push(event);
    }

    async fn close(&self) {}
}
