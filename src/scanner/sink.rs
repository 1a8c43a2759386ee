//! Delivery of scan results.
//!
//! Sinks are called from the scanner task once per completed cycle and must
//! return promptly; anything slow belongs behind a channel.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::mpsc;

use crate::observability::metrics;
use crate::scanner::result::ScanResult;

/// Receiver of completed scan cycles.
pub trait ScanSink: Send + Sync + 'static {
    /// Called exactly once per completed cycle with the full range.
    fn on_scan_complete(&self, result: ScanResult);
}

impl<S: ScanSink + ?Sized> ScanSink for Arc<S> {
    fn on_scan_complete(&self, result: ScanResult) {
        (**self).on_scan_complete(result)
    }
}

/// Holds the most recent scan result and logs changes between cycles.
///
/// Reads are lock-free so the gateway can consult the registry on every
/// request without contending with the scanner.
#[derive(Debug, Default)]
pub struct PortRegistry {
    latest: ArcSwapOption<ScanResult>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published result, if any cycle has completed.
    pub fn latest(&self) -> Option<Arc<ScanResult>> {
        self.latest.load_full()
    }

    /// Open ports from the latest cycle (empty before the first one).
    pub fn open_ports(&self) -> Vec<u16> {
        self.latest()
            .map(|r| r.open_ports())
            .unwrap_or_default()
    }

    pub fn is_open(&self, port: u16) -> bool {
        self.latest().is_some_and(|r| r.is_open(port))
    }
}

impl ScanSink for PortRegistry {
    fn on_scan_complete(&self, result: ScanResult) {
        let result = Arc::new(result);
        let previous = self.latest.swap(Some(result.clone()));

        metrics::record_open_ports(result.open_ports().len());

        match previous {
            Some(previous) => {
                let changes = result.diff(&previous);
                if !changes.opened.is_empty() {
                    tracing::info!(ports = ?changes.opened, "Services started");
                }
                if !changes.closed.is_empty() {
                    tracing::info!(ports = ?changes.closed, "Services stopped");
                }
                if !changes.is_empty() {
                    tracing::info!(ports = ?result.open_ports(), "Services currently open");
                }
            }
            None => {
                tracing::info!(ports = ?result.open_ports(), "Initial scan complete");
            }
        }
    }
}

/// Forwards results over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ScanResult>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ScanSink for ChannelSink {
    fn on_scan_complete(&self, result: ScanResult) {
        if self.tx.send(result).is_err() {
            tracing::debug!("Scan result receiver dropped");
        }
    }
}

/// Delivers each result to several sinks in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn ScanSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ScanSink) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl ScanSink for FanoutSink {
    fn on_scan_complete(&self, result: ScanResult) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.on_scan_complete(result.clone());
            }
            last.on_scan_complete(result);
        }
    }
}
