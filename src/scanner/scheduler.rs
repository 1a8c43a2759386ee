//! Periodic scan scheduling.
//!
//! # Responsibilities
//! - Run one scan cycle per interval over the configured range
//! - Never overlap cycles; skip ticks a slow cycle ran over
//! - Publish each complete result to the sink
//! - Stop between or during cycles without waiting on probes

use std::net::IpAddr;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::config::Config;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::scanner::error::{ScanCycleOverrun, ScanError};
use crate::scanner::probe::{probe_all, Prober, TcpProber};
use crate::scanner::result::ScanResult;
use crate::scanner::sink::ScanSink;

/// What to scan and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerSettings {
    pub ports: RangeInclusive<u16>,
    pub interval: Duration,
    pub max_concurrency: usize,
}

impl ScannerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ports: config.scan_begin..=config.scan_end,
            interval: config.scan_interval(),
            max_concurrency: config.probe.max_concurrency,
        }
    }
}

/// Periodic TCP port scanner.
pub struct PortScanner {
    settings: ScannerSettings,
    prober: Arc<dyn Prober>,
    sink: Arc<dyn ScanSink>,
}

impl PortScanner {
    pub fn new(settings: ScannerSettings, prober: Arc<dyn Prober>, sink: impl ScanSink) -> Self {
        Self {
            settings,
            prober,
            sink: Arc::new(sink),
        }
    }

    /// Build a scanner probing `probe.host` over TCP.
    pub fn from_config(config: &Config, sink: impl ScanSink) -> Result<Self, ScanError> {
        let host: IpAddr = config.probe.host.parse().map_err(|e| {
            ScanError::SchedulerFatal(format!("invalid probe host {}: {e}", config.probe.host))
        })?;
        let prober = Arc::new(TcpProber::new(host, config.probe.timeout()));
        Ok(Self::new(ScannerSettings::from_config(config), prober, sink))
    }

    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    /// Run a single cycle and return its result without publishing it.
    pub async fn scan_once(&self, cycle: u64) -> Result<ScanResult, ScanError> {
        let started_at = SystemTime::now();
        let start = Instant::now();

        let states = probe_all(
            self.prober.clone(),
            self.settings.ports.clone(),
            self.settings.max_concurrency,
        )
        .await?;

        Ok(ScanResult::new(cycle, started_at, start.elapsed(), states))
    }

    /// Spawn the scanner loop.
    pub fn start(self) -> ScannerHandle {
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        let task = tokio::spawn(self.run(signal));
        ScannerHandle { shutdown, task }
    }

    /// Run cycles on a fixed grid until `shutdown` fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ScanError> {
        let interval = self.settings.interval;
        tracing::info!(
            begin = self.settings.ports.start(),
            end = self.settings.ports.end(),
            interval = ?interval,
            max_concurrency = self.settings.max_concurrency,
            "Port scanner starting"
        );

        let origin = Instant::now();
        let mut cycle: u64 = 0;

        loop {
            let result = tokio::select! {
                res = self.scan_once(cycle) => res,
                _ = shutdown.recv() => {
                    tracing::info!(cycle, "Port scanner stopped during cycle");
                    return Ok(());
                }
            };

            let result = match result {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(cycle, error = %e, "Port scanner failed");
                    return Err(e);
                }
            };

            let elapsed = result.duration;
            tracing::debug!(
                cycle,
                elapsed = ?elapsed,
                open = result.open_ports().len(),
                "Scan cycle complete"
            );
            metrics::record_scan_cycle(elapsed);
            self.sink.on_scan_complete(result);

            let next = next_cycle(cycle, origin.elapsed(), interval);
            let skipped = next - cycle - 1;
            if skipped > 0 {
                let warning = ScanCycleOverrun {
                    cycle,
                    elapsed,
                    interval,
                    skipped,
                };
                tracing::warn!(%warning, "Scan cycle overran interval");
                metrics::record_scan_overrun(skipped);
            }
            cycle = next;

            let deadline = origin + interval.saturating_mul(u32::try_from(next).unwrap_or(u32::MAX));
            tokio::select! {
                _ = time::sleep_until(deadline) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Port scanner stopped");
                    return Ok(());
                }
            }
        }
    }
}

/// Index of the first grid point at or after `elapsed`, and always after
/// `current`.
fn next_cycle(current: u64, elapsed: Duration, interval: Duration) -> u64 {
    let step = interval.as_nanos().max(1);
    let due = elapsed.as_nanos().div_ceil(step);
    let due = u64::try_from(due).unwrap_or(u64::MAX);
    due.max(current + 1)
}

/// Handle to a running scanner task.
pub struct ScannerHandle {
    shutdown: Shutdown,
    task: JoinHandle<Result<(), ScanError>>,
}

impl ScannerHandle {
    /// Request the scanner to stop. Does not wait; in-flight probes are
    /// dropped with the cycle.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    /// A detached handle that stops the scanner when triggered.
    pub fn stopper(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the scanner task to end.
    pub async fn join(self) -> Result<(), ScanError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(ScanError::Worker(e)),
        }
    }
}
