//! TCP connect probing with bounded fan-out.

use std::collections::BTreeMap;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time;

use crate::scanner::error::ScanError;
use crate::scanner::result::PortState;

/// Something that can classify a single port.
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Probe one port. `Err` is reserved for resource exhaustion; an
    /// unreachable port is `Ok(PortState::Closed)`.
    async fn probe(&self, port: u16) -> Result<PortState, ScanError>;
}

/// Probes ports with a TCP connect followed by an immediate close.
#[derive(Debug, Clone)]
pub struct TcpProber {
    host: IpAddr,
    timeout: Duration,
}

impl TcpProber {
    pub fn new(host: IpAddr, timeout: Duration) -> Self {
        Self { host, timeout }
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, port: u16) -> Result<PortState, ScanError> {
        let addr = SocketAddr::new(self.host, port);
        match time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                Ok(PortState::Open)
            }
            Ok(Err(e)) if is_resource_exhaustion(&e) => Err(ScanError::SchedulerFatal(format!(
                "cannot open socket for {addr}: {e}"
            ))),
            Ok(Err(e)) => {
                tracing::trace!(port, error = %e, "Port closed");
                Ok(PortState::Closed)
            }
            Err(_) => {
                tracing::trace!(port, "Probe timed out");
                Ok(PortState::Closed)
            }
        }
    }
}

/// True for errors that mean the host ran out of sockets or memory rather
/// than the port being closed.
fn is_resource_exhaustion(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::OutOfMemory {
        return true;
    }
    // EMFILE, ENFILE, ENOBUFS
    #[cfg(unix)]
    if let Some(code) = e.raw_os_error() {
        return matches!(code, 23 | 24 | 105);
    }
    false
}

/// Probe every port in `ports`, at most `max_concurrency` at a time.
///
/// Returns only once every probe has finished, so the map always covers
/// the full input.
pub async fn probe_all(
    prober: Arc<dyn Prober>,
    ports: impl IntoIterator<Item = u16>,
    max_concurrency: usize,
) -> Result<BTreeMap<u16, PortState>, ScanError> {
    let ports: Vec<u16> = ports.into_iter().collect();
    let limit = max_concurrency.min(ports.len()).max(1);
    let permits = Arc::new(Semaphore::new(limit));
    let mut workers = JoinSet::new();

    for port in ports {
        let permits = permits.clone();
        let prober = prober.clone();
        workers.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| ScanError::SchedulerFatal(format!("probe pool closed: {e}")))?;
            let state = prober.probe(port).await?;
            Ok::<_, ScanError>((port, state))
        });
    }

    let mut states = BTreeMap::new();
    while let Some(joined) = workers.join_next().await {
        let (port, state) = joined??;
        states.insert(port, state);
    }
    Ok(states)
}
