//! # Basket App
//!
//! Process runner for the grocery-list sync client.
//!
//! This crate contains:
//! - Application context wiring client, cache and refresh scheduler
//! - Logging setup and structured outcome helpers
//! - The `basket` binary entry point
//!
//! ## Architecture
//! - Depends on `basket-domain` and `basket-infra`
//! - `anyhow` is used only at this edge; library crates return `SyncError`

pub mod context;
pub mod logging;

pub use context::AppContext;
