//! Remote list service client
//!
//! - `auth`: session state, password login and refresh-token rotation
//! - `transport`: request signing on top of the shared HTTP client
//! - `operations`: encoding of edits into the remote operation log format
//! - `fetcher`: user data download and list selection
//! - `client`: the public [`Client`] tying the above together

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod fetcher;
pub mod operations;
pub mod proto;
pub mod transport;

pub use auth::{AuthHeaders, AuthMode, AuthState, SessionManager, SessionState};
pub use client::{Client, ClientBuilder};
pub use fetcher::ListFetcher;
pub use operations::{HandlerKind, Operation};
pub use transport::AuthenticatedTransport;
