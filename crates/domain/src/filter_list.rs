use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};

/// In-memory descriptor for one filter list.
///
/// `path` is derived from `id` by the owning engine and is only populated on
/// snapshots handed out to callers; it is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterList {
    pub id: u64,
    pub enabled: bool,
    pub name: String,
    pub url: String,
    /// Server-supplied HTTP validator, sent back as `If-Modified-Since`.
    /// Empty when no validator is known.
    pub last_modified: String,
    pub last_updated: Option<DateTime<Utc>>,
    /// Number of rules counted on the last load. 0 means "not loaded";
    /// consumers must not use such a list.
    pub rule_count: u64,
    pub path: Option<PathBuf>,
}

impl FilterList {
    pub fn new(name: String, url: String) -> Self {
        Self {
            id: 0,
            enabled: false,
            name,
            url,
            last_modified: String::new(),
            last_updated: None,
            rule_count: 0,
            path: None,
        }
    }

    pub fn from_persisted(p: PersistedFilter) -> Self {
        Self {
            id: p.id,
            enabled: p.enabled,
            name: p.name,
            url: p.url,
            last_modified: p.last_modified,
            last_updated: None,
            rule_count: 0,
            path: None,
        }
    }

    pub fn to_persisted(&self) -> PersistedFilter {
        PersistedFilter {
            id: self.id,
            enabled: self.enabled,
            name: self.name.clone(),
            url: self.url.clone(),
            last_modified: self.last_modified.clone(),
        }
    }

    pub fn validate_name(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("filter name cannot be empty".to_string());
        }
        if name.len() > 200 {
            return Err("filter name cannot exceed 200 characters".to_string());
        }
        Ok(())
    }

    /// A filter location is either an absolute local path or an HTTP(S) URL.
    pub fn validate_url(url: &str) -> Result<(), String> {
        if url.is_empty() {
            return Err("filter URL cannot be empty".to_string());
        }
        if url.len() > 2048 {
            return Err("filter URL cannot exceed 2048 characters".to_string());
        }
        if Path::new(url).is_absolute() {
            return Ok(());
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err("filter URL must start with http:// or https://".to_string());
        }
        Ok(())
    }
}

/// Persistable descriptor state; everything else is recomputed on start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedFilter {
    pub id: u64,
    pub enabled: bool,
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub last_modified: String,
}

/// Bitmask describing what a `modify` call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifyStatus(u32);

impl ModifyStatus {
    pub const NONE: ModifyStatus = ModifyStatus(0);
    pub const CHANGED_ENABLED: ModifyStatus = ModifyStatus(2);
    pub const CHANGED_URL: ModifyStatus = ModifyStatus(4);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: ModifyStatus) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ModifyStatus {
    type Output = ModifyStatus;

    fn bitor(self, rhs: ModifyStatus) -> ModifyStatus {
        ModifyStatus(self.0 | rhs.0)
    }
}

impl BitOrAssign for ModifyStatus {
    fn bitor_assign(&mut self, rhs: ModifyStatus) {
        self.0 |= rhs.0;
    }
}
