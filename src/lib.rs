//! Seller Console
//!
//! Headless client for the seller side of the marketplace: sign-up, sign-in,
//! password reset, profile and store management, and the order dashboard
//! (`orders::OrderDashboard`) with its double-click confirmation flow.
//!
//! The library never reads credentials ambiently. Callers build a
//! [`session::Session`], hand it to an [`api::ApiClient`] and pass that to the
//! modules that need the backend. The `seller-console` binary wires this up
//! from the OS credential store.

use clap::Parser;
use tracing::info;

pub mod api;
mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod orders;
pub mod seller;
pub mod session;
pub mod storage;
pub mod store;
#[cfg(test)]
mod test_support;

pub use api::ApiClient;
pub use error::{ApiError, ValidationError};
pub use session::Session;

/// Entry point of the `seller-console` binary.
pub fn run() -> anyhow::Result<()> {
    let cli = config::Cli::parse();

    // Keep the guard alive until exit; dropping it flushes the file log.
    let _log_guard = logging::init(cli.log_dir.clone());
    info!("Starting Seller Console v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(commands::dispatch(cli));
    // Do not wait on blocking work still parked after the command finished.
    runtime.shutdown_timeout(std::time::Duration::from_millis(500));
    result
}
