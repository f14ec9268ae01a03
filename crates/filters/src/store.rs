use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use oxiguard_application::ports::{FilterStorePort, UpdateObserver};
use oxiguard_domain::{
    valid_update_interval, DomainError, FilterConfig, FilterList, ModifyStatus, UpdateEvent,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::SystemTime;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::download::Downloader;
use crate::parse::count_rules;

/// Bursts of refresh requests coalesce into the pending wake.
const SIGNAL_QUEUE_CAPACITY: usize = 2;

/// How soon a descriptor is retried after a network failure.
const NETWORK_RETRY_SECS: i64 = 10;

/// Message on the refresh driver's signal channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Wake,
    Shutdown,
}

#[derive(Debug, Clone)]
struct TrackedFilter {
    filter: FilterList,
    next_update: DateTime<Utc>,
}

/// A download completed during a scheduler pass, waiting for the commit
/// phase. The content sits at `<dir>/<id>.txt` under a fresh `id` so it
/// cannot collide with the live file. `path == None` is the not-modified
/// sentinel: only the live file's mtime needs touching.
#[derive(Debug)]
struct StagedDownload {
    url: String,
    id: u64,
    rule_count: u64,
    last_modified: Option<String>,
    last_updated: DateTime<Utc>,
    path: Option<PathBuf>,
}

struct StoreState {
    list: Vec<TrackedFilter>,
    staged: Vec<StagedDownload>,
    update_interval_hours: u32,
}

/// One filter-list engine instance: owns a directory of `<id>.txt` files and
/// the descriptors pointing at them, keeps them refreshed, and notifies the
/// registered observer around every batch of file swaps.
pub struct FilterStore {
    dir: PathBuf,
    state: Mutex<StoreState>,
    next_id: AtomicU64,
    downloader: Downloader,
    observer: StdMutex<Option<UpdateObserver>>,
    signal_tx: mpsc::Sender<Signal>,
    signal_rx: StdMutex<Option<mpsc::Receiver<Signal>>>,
    shutdown: CancellationToken,
}

impl FilterStore {
    pub fn new(conf: FilterConfig, client: reqwest::Client) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_QUEUE_CAPACITY);
        let list = conf
            .list
            .into_iter()
            .map(|p| TrackedFilter {
                filter: FilterList::from_persisted(p),
                next_update: DateTime::UNIX_EPOCH,
            })
            .collect();

        Self {
            dir: conf.filter_dir,
            state: Mutex::new(StoreState {
                list,
                staged: Vec::new(),
                update_interval_hours: conf.update_interval_hours,
            }),
            // Seeded from the clock so ids stay unique across restarts.
            next_id: AtomicU64::new(Utc::now().timestamp().max(0) as u64),
            downloader: Downloader::new(client),
            observer: StdMutex::new(None),
            signal_tx,
            signal_rx: StdMutex::new(Some(signal_rx)),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{id}.txt"))
    }

    fn next_filter_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Materialize descriptors from the files already on disk. A descriptor
    /// whose file is missing stays listed with `rule_count == 0`; a later
    /// refresh re-materializes it.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        let interval = i64::from(state.update_interval_hours);
        for tracked in state.list.iter_mut() {
            let fname = self.file_path(tracked.filter.id);
            let meta = match std::fs::metadata(&fname) {
                Ok(meta) => meta,
                Err(e) => {
                    error!(path = %fname.display(), error = %e, "stat failed; skipping filter list");
                    continue;
                }
            };
            let mtime: DateTime<Utc> = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            tracked.filter.last_updated = Some(mtime);
            tracked.next_update = mtime + Duration::hours(interval);

            match std::fs::File::open(&fname).and_then(count_rules) {
                Ok(count) => tracked.filter.rule_count = count,
                Err(e) => {
                    error!(path = %fname.display(), error = %e, "failed to parse filter list")
                }
            }
        }
        debug!(count = state.list.len(), dir = %self.dir.display(), "filter store started");
    }

    /// Stop the background drivers: cancel the token and queue the shutdown
    /// sentinel for the signal driver.
    pub async fn close(&self) {
        self.shutdown.cancel();
        let _ = self.signal_tx.try_send(Signal::Shutdown);
    }

    /// Snapshot of all descriptors with `path` resolved.
    pub async fn list(&self) -> Vec<FilterList> {
        let state = self.state.lock().await;
        state
            .list
            .iter()
            .map(|tracked| {
                let mut filter = tracked.filter.clone();
                filter.path = Some(self.file_path(filter.id));
                filter
            })
            .collect()
    }

    /// Download, validate and publish a new filter list. Nothing is published
    /// when the download fails.
    pub async fn add(&self, name: String, url: String) -> Result<FilterList, DomainError> {
        let mut state = self.state.lock().await;
        if state
            .list
            .iter()
            .any(|t| t.filter.name == name || t.filter.url == url)
        {
            return Err(DomainError::DuplicateFilter(url));
        }

        let id = self.next_filter_id();
        let mut filter = FilterList::new(name, url);
        filter.id = id;
        filter.enabled = true;

        let dest = self.file_path(id);
        let fetched = self.downloader.fetch(&filter.url, "", &dest).await?;
        filter.rule_count = fetched.rule_count;
        filter.last_modified = fetched.last_modified.unwrap_or_default();
        filter.last_updated = Some(fetched.last_updated);

        debug!(url = %filter.url, id = id, rules = filter.rule_count, "added filter list");

        let mut published = filter.clone();
        published.path = Some(dest);
        let next_update =
            fetched.last_updated + Duration::hours(i64::from(state.update_interval_hours));
        state.list.push(TrackedFilter {
            filter,
            next_update,
        });
        Ok(published)
    }

    /// Remove the descriptor with this URL and return it with `path`
    /// resolved; the file itself is the caller's to unlink.
    pub async fn delete(&self, url: &str) -> Option<FilterList> {
        let mut state = self.state.lock().await;
        let pos = state.list.iter().position(|t| t.filter.url == url)?;
        let mut removed = state.list.remove(pos).filter;
        removed.path = Some(self.file_path(removed.id));
        debug!(url = %url, "removed filter list");
        Some(removed)
    }

    /// Update descriptor properties, downloading fresh content when the URL
    /// changes. Returns what changed plus the pre-modification descriptor
    /// (whose `path` names the old file). A failed download on the
    /// URL-changing path restores the descriptor untouched.
    pub async fn modify(
        &self,
        url: &str,
        enabled: bool,
        name: &str,
        new_url: &str,
    ) -> Result<(ModifyStatus, FilterList), DomainError> {
        let mut state = self.state.lock().await;
        let interval = state.update_interval_hours;
        let pos = state
            .list
            .iter()
            .position(|t| t.filter.url == url)
            .ok_or_else(|| DomainError::FilterNotFound(url.to_string()))?;

        if state
            .list
            .iter()
            .enumerate()
            .any(|(i, t)| i != pos && (t.filter.name == name || t.filter.url == new_url))
        {
            return Err(DomainError::DuplicateFilter(new_url.to_string()));
        }

        let prior = state.list[pos].clone();
        let mut old = prior.filter.clone();
        old.path = Some(self.file_path(old.id));

        let mut status = ModifyStatus::NONE;
        {
            let filter = &mut state.list[pos].filter;
            filter.name = name.to_string();
            if filter.enabled != enabled {
                filter.enabled = enabled;
                status |= ModifyStatus::CHANGED_ENABLED;
            }
        }

        if new_url != url {
            status |= ModifyStatus::CHANGED_URL;
            let id = self.next_filter_id();
            let dest = self.file_path(id);
            {
                let filter = &mut state.list[pos].filter;
                filter.id = id;
                filter.url = new_url.to_string();
                filter.last_modified.clear();
                filter.rule_count = 0;
            }
            match self.downloader.fetch(new_url, "", &dest).await {
                Ok(fetched) => {
                    let tracked = &mut state.list[pos];
                    tracked.filter.rule_count = fetched.rule_count;
                    tracked.filter.last_modified = fetched.last_modified.unwrap_or_default();
                    tracked.filter.last_updated = Some(fetched.last_updated);
                    tracked.next_update =
                        fetched.last_updated + Duration::hours(i64::from(interval));
                }
                Err(e) => {
                    state.list[pos] = prior;
                    return Err(e);
                }
            }
        } else if status.contains(ModifyStatus::CHANGED_ENABLED) && enabled {
            // Re-enable: refresh the count from disk; if the file is gone,
            // download it again under the same id.
            let id = state.list[pos].filter.id;
            let fname = self.file_path(id);
            match std::fs::File::open(&fname).and_then(count_rules) {
                Ok(count) => state.list[pos].filter.rule_count = count,
                Err(e) => {
                    debug!(path = %fname.display(), error = %e, "reload failed; re-downloading");
                    let fetch_url = state.list[pos].filter.url.clone();
                    let fetched = self.downloader.fetch(&fetch_url, "", &fname).await?;
                    let tracked = &mut state.list[pos];
                    tracked.filter.rule_count = fetched.rule_count;
                    tracked.filter.last_modified = fetched.last_modified.unwrap_or_default();
                    tracked.filter.last_updated = Some(fetched.last_updated);
                    tracked.next_update =
                        fetched.last_updated + Duration::hours(i64::from(interval));
                }
            }
        }

        debug!(url = %url, status = status.bits(), "modified filter list");
        Ok((status, old))
    }

    /// Mark every descriptor due and wake the refresh driver.
    pub async fn refresh(&self) {
        {
            let mut state = self.state.lock().await;
            for tracked in state.list.iter_mut() {
                tracked.next_update = DateTime::UNIX_EPOCH;
            }
        }
        self.poke();
    }

    /// Queue one wake for the refresh driver. A full queue means a wake is
    /// already pending; bursts coalesce.
    pub fn poke(&self) {
        let _ = self.signal_tx.try_send(Signal::Wake);
    }

    pub async fn set_config(&self, update_interval_hours: u32) -> Result<(), DomainError> {
        if !valid_update_interval(update_interval_hours) {
            return Err(DomainError::ConfigError(format!(
                "unsupported update interval: {update_interval_hours}"
            )));
        }
        let mut state = self.state.lock().await;
        state.update_interval_hours = update_interval_hours;
        Ok(())
    }

    pub async fn update_interval_hours(&self) -> u32 {
        self.state.lock().await.update_interval_hours
    }

    /// Copy out the persistable state.
    pub async fn write_disk_config(&self) -> FilterConfig {
        let state = self.state.lock().await;
        FilterConfig {
            filter_dir: self.dir.clone(),
            update_interval_hours: state.update_interval_hours,
            list: state.list.iter().map(|t| t.filter.to_persisted()).collect(),
        }
    }

    /// Register the observer, replacing any previous one.
    pub fn set_observer(&self, observer: UpdateObserver) {
        *self.observer.lock().unwrap() = Some(observer);
    }

    pub fn notify_observer(&self, event: UpdateEvent) {
        let observer = self.observer.lock().unwrap().clone();
        if let Some(observer) = observer {
            observer(event);
        }
    }

    /// Hand the signal receiver to the driver that will run
    /// [`update_pass`](Self::update_pass) on every wake. Can only be taken
    /// once.
    pub fn take_signal_receiver(&self) -> Option<mpsc::Receiver<Signal>> {
        self.signal_rx.lock().unwrap().take()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// One scheduler pass: download every due descriptor into a staged side
    /// file, then commit the batch. Callers must not run two passes
    /// concurrently; the signal driver serializes them.
    pub async fn update_pass(&self) {
        debug!("updating filter lists");
        loop {
            let due = {
                let mut state = self.state.lock().await;
                self.select_next_due(&mut state)
            };
            let Some(due) = due else { break };

            // Staged under a fresh id so the side file never collides with
            // the live one; commit renames it into place.
            let staged_id = self.next_filter_id();
            let dest = self.file_path(staged_id);
            match self
                .downloader
                .fetch(&due.url, &due.last_modified, &dest)
                .await
            {
                Ok(fetched) => {
                    let mut state = self.state.lock().await;
                    state.staged.push(StagedDownload {
                        url: due.url,
                        id: staged_id,
                        rule_count: fetched.rule_count,
                        last_modified: fetched.last_modified,
                        last_updated: fetched.last_updated,
                        path: fetched.path,
                    });
                }
                Err(DomainError::Network(e)) => {
                    warn!(url = %due.url, error = %e, "network error; retrying shortly");
                    let mut state = self.state.lock().await;
                    if let Some(tracked) =
                        state.list.iter_mut().find(|t| t.filter.url == due.url)
                    {
                        tracked.next_update = Utc::now() + Duration::seconds(NETWORK_RETRY_SECS);
                    }
                }
                Err(e) => warn!(url = %due.url, error = %e, "failed to update filter list"),
            }
        }
        self.apply_staged().await;
    }

    /// First enabled descriptor whose `next_update` is due, advanced past
    /// `now` so one pass visits each descriptor at most once.
    fn select_next_due(&self, state: &mut StoreState) -> Option<FilterList> {
        let now = Utc::now();
        // With updates disabled the timer never fires, but an explicit
        // refresh must still terminate: keep the advance positive.
        let hours = i64::from(state.update_interval_hours.max(1));
        for tracked in state.list.iter_mut() {
            if tracked.filter.enabled && tracked.next_update <= now {
                tracked.next_update = now + Duration::hours(hours);
                return Some(tracked.filter.clone());
            }
        }
        None
    }

    /// Commit the staged batch: swap files under the lock, bracketed by the
    /// before/after events. An empty batch fires no events. A failed rename
    /// is logged and the batch continues.
    async fn apply_staged(&self) {
        {
            let state = self.state.lock().await;
            if state.staged.is_empty() {
                debug!("no filter lists were updated");
                return;
            }
        }

        self.notify_observer(UpdateEvent::BeforeUpdate);

        let mut updated = 0usize;
        {
            let mut state = self.state.lock().await;
            let staged = std::mem::take(&mut state.staged);
            for item in staged {
                let Some(tracked) = state.list.iter_mut().find(|t| t.filter.url == item.url)
                else {
                    // Deleted while the download was in flight.
                    let _ = std::fs::remove_file(self.file_path(item.id));
                    continue;
                };

                tracked.filter.last_updated = Some(item.last_updated);
                let fname = self.file_path(tracked.filter.id);

                match item.path {
                    None => {
                        if let Err(e) = touch(&fname, item.last_updated) {
                            error!(path = %fname.display(), error = %e, "failed to update mtime");
                        }
                    }
                    Some(staged_path) => {
                        if let Err(e) = std::fs::rename(&staged_path, &fname) {
                            error!(
                                from = %staged_path.display(),
                                to = %fname.display(),
                                error = %e,
                                "rename failed"
                            );
                        }
                        tracked.filter.rule_count = item.rule_count;
                        if let Some(validator) = item.last_modified {
                            tracked.filter.last_modified = validator;
                        }
                        updated += 1;
                    }
                }
            }
        }

        debug!(count = updated, "filter lists updated");
        self.notify_observer(UpdateEvent::AfterUpdate);
    }
}

/// Set the file's access and modification times, as a 304 response proves
/// the content is still current.
fn touch(path: &Path, at: DateTime<Utc>) -> std::io::Result<()> {
    let file = std::fs::OpenOptions::new().append(true).open(path)?;
    let at = SystemTime::from(at);
    file.set_times(std::fs::FileTimes::new().set_accessed(at).set_modified(at))
}

#[async_trait]
impl FilterStorePort for FilterStore {
    async fn start(&self) {
        FilterStore::start(self).await;
    }

    async fn list(&self) -> Vec<FilterList> {
        FilterStore::list(self).await
    }

    async fn add(&self, name: String, url: String) -> Result<FilterList, DomainError> {
        FilterStore::add(self, name, url).await
    }

    async fn delete(&self, url: &str) -> Option<FilterList> {
        FilterStore::delete(self, url).await
    }

    async fn modify(
        &self,
        url: &str,
        enabled: bool,
        name: &str,
        new_url: &str,
    ) -> Result<(ModifyStatus, FilterList), DomainError> {
        FilterStore::modify(self, url, enabled, name, new_url).await
    }

    async fn refresh(&self) {
        FilterStore::refresh(self).await;
    }

    async fn set_config(&self, update_interval_hours: u32) -> Result<(), DomainError> {
        FilterStore::set_config(self, update_interval_hours).await
    }

    async fn write_disk_config(&self) -> FilterConfig {
        FilterStore::write_disk_config(self).await
    }

    fn set_observer(&self, observer: UpdateObserver) {
        FilterStore::set_observer(self, observer);
    }

    fn notify_observer(&self, event: UpdateEvent) {
        FilterStore::notify_observer(self, event);
    }

    async fn close(&self) {
        FilterStore::close(self).await;
    }
}
