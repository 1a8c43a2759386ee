//! Port Scanner and Gateway Proxy
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌────────────────────────────────────────────────┐
//!                        │                  PORT GATEWAY                   │
//!                        │                                                 │
//!   Client Request       │  ┌────────┐   ┌─────────┐   ┌─────────────┐     │
//!   ─────────────────────┼─▶│  net   │──▶│  http   │──▶│   routing   │     │
//!                        │  │listener│   │ server  │   │ route table │     │
//!                        │  └────────┘   └─────────┘   └──────┬──────┘     │
//!                        │                                    ▼            │
//!                        │                             ┌─────────────┐     │
//!                        │                             │   backend   │     │
//!                        │                             │  resolver   │     │
//!                        │                             └──────┬──────┘     │
//!                        │                                    │ reads      │
//!   Client Response      │  ┌────────┐   ┌─────────┐   ┌──────┴──────┐     │
//!   ◀────────────────────┼──│response│◀──│ forward │   │  scanner    │◀────┼── periodic
//!                        │  └────────┘   └────┬────┘   │  registry   │     │   TCP probes
//!                        │                    │        └─────────────┘     │
//!                        └────────────────────┼────────────────────────────┘
//!                                             ▼
//!                                        Backend service
//! ```
//!
//! Configuration is read once from `config/config.json`.

use std::path::Path;

use port_gateway::config::load_config;
use port_gateway::lifecycle::{spawn_signal_handler, startup, Shutdown};
use port_gateway::observability::logging;

const CONFIG_PATH: &str = "config/config.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match load_config(Path::new(CONFIG_PATH)) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            tracing::error!(path = CONFIG_PATH, error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    logging::init(&config.observability.log_level);
    tracing::info!("port-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.bind_address(),
        scan_begin = config.scan_begin,
        scan_end = config.scan_end,
        scan_interval_secs = config.scan_interval,
        targets = config.targets.len(),
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    startup::run(config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
