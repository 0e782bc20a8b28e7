//! Local cache of the target list, refreshed after every mutation.

pub mod cache;

pub use cache::{CachedSnapshot, ListStore, SyncCache};
