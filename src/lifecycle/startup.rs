//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start the scanner, then bind and serve the gateway
//! - Keep the gateway up if the scanner dies
//!
//! # Design Decisions
//! - Fail fast: resolver, listener and probe setup errors are fatal
//! - Listener binds before the scanner starts, so a taken port aborts early

use std::sync::Arc;

use thiserror::Error;

use crate::backend::resolver;
use crate::config::Config;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::{self, ListenerError};
use crate::observability::metrics;
use crate::scanner::{PortRegistry, PortScanner, ScanError};

/// Errors that prevent the service from starting or end it abnormally.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("listener: {0}")]
    Listener(#[from] ListenerError),

    #[error("backend address: {0}")]
    Resolver(#[from] std::net::AddrParseError),

    #[error("scanner: {0}")]
    Scanner(#[from] ScanError),

    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the scanner and the gateway until `shutdown` fires.
pub async fn run(config: Config, shutdown: Shutdown) -> Result<(), StartupError> {
    let config = Arc::new(config);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(PortRegistry::new());
    let scanner = PortScanner::from_config(&config, registry.clone())?;
    let resolver = resolver::from_config(&config, registry.clone())?;
    let listener = net::bind(&config).await?;

    let scanner = scanner.start();
    let stop_scanner = scanner.stopper();
    let scanner_task = tokio::spawn(async move {
        match scanner.join().await {
            Ok(()) => tracing::info!("Port scanner exited"),
            Err(e) => tracing::error!(error = %e, "Port scanner died, gateway keeps serving"),
        }
    });

    let server = HttpServer::new(config.clone(), resolver, registry);
    let result = server.run(listener, shutdown).await;

    stop_scanner.trigger();
    if let Err(e) = scanner_task.await {
        tracing::error!(error = %e, "Port scanner watcher failed");
    }

    result.map_err(StartupError::Io)
}
