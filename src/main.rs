//! Binary entry point for the picows server.
//!
//! The runtime logic lives in `picows::server`, so this binary only installs
//! logging and delegates to the shared library code.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    picows::server::run().await
}
