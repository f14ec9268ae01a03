mod filter_store;

pub use filter_store::{FilterStorePort, UpdateObserver};
