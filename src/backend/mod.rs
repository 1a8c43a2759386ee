//! Backend resolution subsystem.
//!
//! # Data Flow
//! ```text
//! RoutedRequest (route, filtered params)
//!     → resolver.rs (static address, or base_port + selector checked
//!       against the scanner's PortRegistry)
//!     → SocketAddr or GatewayError
//! ```

pub mod resolver;

pub use resolver::{BackendResolver, ScanResolver, StaticResolver};
