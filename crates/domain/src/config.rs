use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::filter_list::PersistedFilter;

/// Refresh intervals the control surface accepts, in hours. 0 disables
/// scheduled refreshes.
pub const UPDATE_INTERVALS_HOURS: [u32; 6] = [0, 1, 12, 24, 72, 168];

pub fn valid_update_interval(hours: u32) -> bool {
    UPDATE_INTERVALS_HOURS.contains(&hours)
}

/// Configuration for one filter-list engine instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub filter_dir: PathBuf,

    #[serde(default)]
    pub update_interval_hours: u32,

    /// Descriptors resurrected from persisted state on start.
    #[serde(default)]
    pub list: Vec<PersistedFilter>,
}

/// Configuration for the whole filtering module: one engine per consumer
/// category, all under `data_dir`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilteringConfig {
    pub data_dir: PathBuf,

    #[serde(default)]
    pub update_interval_hours: u32,

    #[serde(default)]
    pub blocklist: Vec<PersistedFilter>,

    #[serde(default)]
    pub allowlist: Vec<PersistedFilter>,

    #[serde(default)]
    pub proxylist: Vec<PersistedFilter>,
}

/// Stock DNS blocklists offered on first run.
pub fn default_blocklists() -> Vec<PersistedFilter> {
    vec![
        PersistedFilter {
            id: 1,
            enabled: true,
            name: "AdGuard Simplified Domain Names filter".to_string(),
            url: "https://adguardteam.github.io/AdGuardSDNSFilter/Filters/filter.txt".to_string(),
            last_modified: String::new(),
        },
        PersistedFilter {
            id: 2,
            enabled: false,
            name: "AdAway".to_string(),
            url: "https://adaway.org/hosts.txt".to_string(),
            last_modified: String::new(),
        },
        PersistedFilter {
            id: 3,
            enabled: false,
            name: "MalwareDomainList.com Hosts List".to_string(),
            url: "https://www.malwaredomainlist.com/hostslist/hosts.txt".to_string(),
            last_modified: String::new(),
        },
    ]
}
