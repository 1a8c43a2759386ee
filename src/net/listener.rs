//! TCP listener setup for the gateway.
//!
//! # Responsibilities
//! - Resolve the configured `host:port`
//! - Bind the listening socket, reporting failures distinctly

use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;

use crate::config::Config;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// The configured host is not an IP address.
    Address(std::net::AddrParseError),
    /// Failed to bind to address.
    Bind(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Address(e) => write!(f, "Invalid bind address: {}", e),
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Bind the gateway listener on `config.host:config.port`.
pub async fn bind(config: &Config) -> Result<TcpListener, ListenerError> {
    let ip: IpAddr = config.host.parse().map_err(ListenerError::Address)?;
    let addr = SocketAddr::new(ip, config.port);

    let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
    let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}
