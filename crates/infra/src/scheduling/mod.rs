//! Background refresh scheduling
//!
//! The scheduler follows the usual lifecycle rules for spawned work:
//! explicit start/stop, a held join handle, and a cancellation token that is
//! also fired on drop.

pub mod error;
pub mod refresh_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use refresh_scheduler::{RefreshScheduler, RefreshSchedulerConfig, RefreshTarget};
