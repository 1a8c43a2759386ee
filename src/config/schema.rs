//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway
//! and the port scanner. Required keys sit at the top level of the JSON
//! document; optional tuning sections default when absent.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration shared by the scanner and the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Gateway bind host (e.g. "0.0.0.0").
    pub host: String,

    /// Gateway bind port.
    pub port: u16,

    /// First port of the scanned range (inclusive).
    pub scan_begin: u16,

    /// Last port of the scanned range (inclusive).
    pub scan_end: u16,

    /// Scan cadence in seconds.
    pub scan_interval: u64,

    /// Route table, checked in order.
    pub targets: Vec<TargetRoute>,

    /// Per-port probe settings.
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Backend address resolution strategy.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Timeout configuration.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Request limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Path of the service discovery endpoint, `null` to disable it.
    #[serde(default = "default_discovery_path")]
    pub discovery_path: Option<String>,

    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_discovery_path() -> Option<String> {
    Some("/machine-list".to_string())
}

impl Config {
    /// Build a config with the required fields and default sections.
    pub fn new(host: impl Into<String>, port: u16, scan_begin: u16, scan_end: u16) -> Self {
        Self {
            host: host.into(),
            port,
            scan_begin,
            scan_end,
            scan_interval: 5,
            targets: Vec::new(),
            probe: ProbeConfig::default(),
            backend: BackendConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            discovery_path: default_discovery_path(),
            observability: ObservabilityConfig::default(),
        }
    }

    /// Gateway bind address as "host:port", bracketing IPv6 hosts.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Scan cadence.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    /// Number of ports in the scanned range.
    pub fn scan_range_len(&self) -> usize {
        if self.scan_end < self.scan_begin {
            return 0;
        }
        usize::from(self.scan_end - self.scan_begin) + 1
    }

    /// Base port used to translate selector values into ports.
    ///
    /// Falls back to `scan_begin` when the backend section does not set one.
    pub fn base_port(&self) -> u16 {
        match &self.backend {
            BackendConfig::Scanned { base_port, .. } => base_port.unwrap_or(self.scan_begin),
            BackendConfig::Static { .. } => self.scan_begin,
        }
    }
}

/// A configured gateway target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TargetRoute {
    /// Exact request path (e.g. "/produce").
    #[serde(rename = "target")]
    pub path: String,

    /// Parameter names forwarded to the backend.
    #[serde(default)]
    pub params: BTreeSet<String>,
}

impl TargetRoute {
    pub fn new<I, S>(path: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-port probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Host whose ports are probed.
    pub host: String,

    /// Connect timeout per port in milliseconds.
    pub timeout_ms: u64,

    /// Upper bound on concurrent probes.
    pub max_concurrency: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            timeout_ms: 1000,
            max_concurrency: 50,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// How the gateway finds the backend for a matched route.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Backend port is `base_port + <selector_param>`, and must be open in
    /// the latest scan.
    Scanned {
        #[serde(default = "default_backend_host")]
        host: String,
        #[serde(default)]
        base_port: Option<u16>,
        #[serde(default = "default_selector_param")]
        selector_param: String,
    },
    /// Every route forwards to one fixed address.
    Static { address: String },
}

fn default_backend_host() -> String {
    "127.0.0.1".to_string()
}

fn default_selector_param() -> String {
    "machine_no".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Scanned {
            host: default_backend_host(),
            base_port: None,
            selector_param: default_selector_param(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connect + response header timeout in seconds.
    pub backend_secs: u64,

    /// Whole inbound request timeout in seconds.
    pub request_secs: u64,

    /// Grace period for draining in-flight requests on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            backend_secs: 10,
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
