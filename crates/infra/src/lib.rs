//! # Basket Infrastructure
//!
//! Network-facing implementation of the grocery-list sync client.
//!
//! This crate contains:
//! - The remote list client (login, token refresh, fetch, mutations)
//! - The snapshot cache and its periodic refresh scheduler
//! - HTTP plumbing with deadlines and cancellation
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Depends on `basket-domain` for types and errors
//! - Every fallible call returns `basket_domain::Result`

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod scheduling;
pub mod sync;

// Re-export commonly used items
pub use api::{Client, ClientBuilder};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use scheduling::{RefreshScheduler, RefreshSchedulerConfig, RefreshTarget, SchedulerError};
pub use sync::{CachedSnapshot, ListStore, SyncCache};
