//! Backend address resolution.
//!
//! # Responsibilities
//! - Turn a matched request into the address of the backend serving it
//! - Refuse backends the latest scan did not see listening
//!
//! # Design Decisions
//! - Resolution is synchronous and lock-free; it runs on every request
//! - The router never knows how addresses are found, only that they are

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::config::{BackendConfig, Config};
use crate::http::response::GatewayError;
use crate::routing::RoutedRequest;
use crate::scanner::PortRegistry;

/// Finds the backend address for a routed request.
pub trait BackendResolver: Send + Sync + 'static {
    fn resolve(&self, request: &RoutedRequest) -> Result<SocketAddr, GatewayError>;
}

/// Every request goes to one fixed address.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    addr: SocketAddr,
}

impl StaticResolver {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

impl BackendResolver for StaticResolver {
    fn resolve(&self, _request: &RoutedRequest) -> Result<SocketAddr, GatewayError> {
        Ok(self.addr)
    }
}

/// Resolves `base_port + <selector>` and requires the port to be open in the
/// latest scan.
#[derive(Debug, Clone)]
pub struct ScanResolver {
    host: IpAddr,
    base_port: u16,
    selector_param: String,
    registry: Arc<PortRegistry>,
}

impl ScanResolver {
    pub fn new(
        host: IpAddr,
        base_port: u16,
        selector_param: impl Into<String>,
        registry: Arc<PortRegistry>,
    ) -> Self {
        Self {
            host,
            base_port,
            selector_param: selector_param.into(),
            registry,
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> GatewayError {
        GatewayError::InvalidParam {
            name: self.selector_param.clone(),
            reason: reason.into(),
        }
    }
}

impl BackendResolver for ScanResolver {
    fn resolve(&self, request: &RoutedRequest) -> Result<SocketAddr, GatewayError> {
        let raw = request
            .params
            .get(&self.selector_param)
            .ok_or_else(|| self.invalid("missing"))?;

        let offset: u16 = raw
            .trim()
            .parse()
            .map_err(|_| self.invalid(format!("{raw} is not a machine number")))?;

        let port = self
            .base_port
            .checked_add(offset)
            .ok_or_else(|| self.invalid(format!("{raw} is out of range")))?;

        if !self.registry.is_open(port) {
            return Err(GatewayError::backend_unavailable(format!(
                "service {raw} (port {port}) is not running"
            )));
        }

        Ok(SocketAddr::new(self.host, port))
    }
}

/// Build the resolver described by the config.
///
/// The scan-backed resolver reads from `registry`, which must be the sink the
/// scanner publishes to.
pub fn from_config(
    config: &Config,
    registry: Arc<PortRegistry>,
) -> Result<Arc<dyn BackendResolver>, std::net::AddrParseError> {
    let resolver: Arc<dyn BackendResolver> = match &config.backend {
        BackendConfig::Static { address } => Arc::new(StaticResolver::new(address.parse()?)),
        BackendConfig::Scanned {
            host,
            selector_param,
            ..
        } => Arc::new(ScanResolver::new(
            host.parse()?,
            config.base_port(),
            selector_param.clone(),
            registry,
        )),
    };
    Ok(resolver)
}
