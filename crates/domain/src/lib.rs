pub mod category;
pub mod config;
pub mod errors;
pub mod events;
pub mod filter_list;

pub use category::FilterCategory;
pub use config::{default_blocklists, valid_update_interval, FilterConfig, FilteringConfig};
pub use errors::DomainError;
pub use events::UpdateEvent;
pub use filter_list::{FilterList, ModifyStatus, PersistedFilter};
