//! # Basket Domain
//!
//! Domain types shared by the grocery-list sync client.
//!
//! This crate contains:
//! - List snapshot types served to callers (`ListSnapshot`, `ListItem`)
//! - Credential and configuration structures
//! - The `SyncError` taxonomy and its `ErrorKind` classification
//!
//! ## Architecture
//! - No dependencies on other Basket crates
//! - No I/O; everything that talks to the network lives in `basket-infra`

pub mod config;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
