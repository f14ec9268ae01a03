use serde::{Deserialize, Serialize};

/// Identifies which consumer a filter-list engine instance serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCategory {
    /// Lists consumed by the DNS blocklist matcher.
    Blocklist,
    /// Lists consumed by the DNS allowlist matcher.
    Allowlist,
    /// Lists consumed by the MITM proxy rule set.
    Proxylist,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 3] = [
        FilterCategory::Blocklist,
        FilterCategory::Allowlist,
        FilterCategory::Proxylist,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            FilterCategory::Blocklist => "blocklist",
            FilterCategory::Allowlist => "allowlist",
            FilterCategory::Proxylist => "proxylist",
        }
    }

    /// Parse the selector strings accepted by the control API.
    /// `whitelist` is the wire name the UI uses for the allowlist.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blocklist" => Some(FilterCategory::Blocklist),
            "allowlist" | "whitelist" => Some(FilterCategory::Allowlist),
            "proxylist" => Some(FilterCategory::Proxylist),
            _ => None,
        }
    }

    /// Subdirectory of the data dir holding this category's filter files.
    pub fn dir_name(&self) -> &'static str {
        match self {
            FilterCategory::Blocklist => "filters_dnsblock",
            FilterCategory::Allowlist => "filters_dnsallow",
            FilterCategory::Proxylist => "filters_mitmproxy",
        }
    }
}

impl std::fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}
