//! Scan cycle results.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// Classification of a single probed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortState {
    /// A TCP connection was accepted.
    Open,
    /// Refused, timed out, or otherwise not reachable.
    Closed,
}

impl PortState {
    pub fn is_open(self) -> bool {
        matches!(self, PortState::Open)
    }
}

/// The outcome of one complete pass over the configured port range.
///
/// Produced fresh each cycle and handed off by value; never mutated after
/// publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Index of the cycle on the schedule grid (first cycle is 0).
    pub cycle: u64,
    /// Wall-clock time at which the cycle started.
    pub started_at: SystemTime,
    /// Time spent probing the whole range.
    pub duration: Duration,
    ports: BTreeMap<u16, PortState>,
}

impl ScanResult {
    pub fn new(
        cycle: u64,
        started_at: SystemTime,
        duration: Duration,
        ports: BTreeMap<u16, PortState>,
    ) -> Self {
        Self {
            cycle,
            started_at,
            duration,
            ports,
        }
    }

    /// State of every probed port, ordered by port number.
    pub fn ports(&self) -> &BTreeMap<u16, PortState> {
        &self.ports
    }

    pub fn state(&self, port: u16) -> Option<PortState> {
        self.ports.get(&port).copied()
    }

    pub fn is_open(&self, port: u16) -> bool {
        self.state(port).is_some_and(PortState::is_open)
    }

    /// Open ports in ascending order.
    pub fn open_ports(&self) -> Vec<u16> {
        self.ports
            .iter()
            .filter(|(_, state)| state.is_open())
            .map(|(port, _)| *port)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Ports whose state differs from `previous`.
    pub fn diff(&self, previous: &ScanResult) -> PortChanges {
        let mut changes = PortChanges::default();
        for (port, state) in &self.ports {
            let was_open = previous.is_open(*port);
            match (was_open, state.is_open()) {
                (false, true) => changes.opened.push(*port),
                (true, false) => changes.closed.push(*port),
                _ => {}
            }
        }
        for port in previous.open_ports() {
            if !self.ports.contains_key(&port) {
                changes.closed.push(port);
            }
        }
        changes.closed.sort_unstable();
        changes
    }

    /// Same port states, ignoring timing metadata.
    pub fn same_states(&self, other: &ScanResult) -> bool {
        self.ports == other.ports
    }
}

/// Ports that changed state between two cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortChanges {
    pub opened: Vec<u16>,
    pub closed: Vec<u16>,
}

impl PortChanges {
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.closed.is_empty()
    }
}
