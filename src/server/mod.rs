//! Server orchestration for the picows binary.
//!
//! This module exposes the command-line interface and the TCP listener that
//! feed accepted sockets into [`crate::connection::Connection`]. Binary crates
//! stay thin wrappers that only need to call [`run`].

pub mod cli;
pub mod listener;

use anyhow::Result;
pub use cli::{AppConfig, Cli, ConfigError};
pub use listener::{ServerResources, accept_connections, run_daemon};

/// Load configuration from all layers and run the listener.
///
/// # Errors
///
/// Returns any error emitted while loading configuration or running the
/// listener.
pub async fn run() -> Result<()> {
    let cfg = AppConfig::load()?;
    run_daemon(cfg).await
}
