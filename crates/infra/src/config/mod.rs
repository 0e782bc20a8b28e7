//! Configuration loading
//!
//! Reads the client configuration from environment variables or a config
//! file next to the working directory or executable.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
