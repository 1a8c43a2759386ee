//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path, params)
//!     → router.rs (ordered route lookup)
//!     → matcher.rs (exact path match, param whitelist)
//!     → Return: RoutedRequest or NotFound
//!
//! Route Compilation (at startup):
//!     TargetRoute[]
//!     → Drop shadowed duplicates (first wins)
//!     → Freeze as immutable RouteTable
//! ```

pub mod matcher;
pub mod router;

pub use matcher::{ExactPathMatcher, Matcher, ParamWhitelist};
pub use router::{Route, RouteTable, RoutedRequest};
