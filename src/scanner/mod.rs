//! Port scanning subsystem.
//!
//! # Data Flow
//! ```text
//! Fixed-grid timer (scheduler.rs)
//!     → probe.rs (bounded TCP connect fan-out, join barrier)
//!     → ScanResult (result.rs, full range, by value)
//!     → sink.rs (registry snapshot, channels, fan-out)
//! ```
//!
//! # Design Decisions
//! - A closed port is a result, not an error
//! - Cycles never overlap; missed ticks are skipped and reported
//! - Stopping drops the running cycle instead of waiting for probes

pub mod error;
pub mod probe;
pub mod result;
pub mod scheduler;
pub mod sink;

pub use error::{ScanCycleOverrun, ScanError};
pub use probe::{Prober, TcpProber};
pub use result::{PortChanges, PortState, ScanResult};
pub use scheduler::{PortScanner, ScannerHandle, ScannerSettings};
pub use sink::{ChannelSink, FanoutSink, PortRegistry, ScanSink};
