pub mod filter_sync;
pub mod runner;

pub use filter_sync::FilterSyncJob;
pub use runner::JobRunner;
