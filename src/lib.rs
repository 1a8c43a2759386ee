//! Port Scanner and Gateway Proxy Library

pub mod backend;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod scanner;

pub use config::Config;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use scanner::{PortRegistry, PortScanner};
