//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Config host:port
//!     → listener.rs (parse, bind)
//!     → Hand off to HTTP layer (axum serve)
//! ```

pub mod listener;

pub use listener::{bind, ListenerError};
