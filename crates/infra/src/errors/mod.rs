//! Infrastructure error plumbing.
//!
//! External crates' errors are converted into the domain `SyncError` here so
//! the rest of the crate only ever propagates domain errors with `?`.

pub mod conversions;

pub use conversions::InfraError;
