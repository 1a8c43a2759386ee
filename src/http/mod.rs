//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, query + body params)
//!     → [routing table matches path, filters params]
//!     → [backend resolver picks address]
//!     → forward.rs (outbound request, bounded wait)
//!     → response.rs (error mapping) or relayed backend response
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::GatewayError;
pub use server::HttpServer;
