//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in configured order
//! - Look up the route for a request path
//! - Produce the filtered parameter set for the backend
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in configured order, first match wins
//! - Explicit NotFound rather than silent default

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::config::TargetRoute;
use crate::http::response::GatewayError;
use crate::routing::matcher::{ExactPathMatcher, Matcher, ParamWhitelist};

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    matcher: ExactPathMatcher,
    whitelist: ParamWhitelist,
}

impl Route {
    pub fn from_target(target: &TargetRoute) -> Self {
        Self {
            matcher: ExactPathMatcher::new(target.path.clone()),
            whitelist: ParamWhitelist::new(target.params.clone()),
        }
    }

    pub fn path(&self) -> &str {
        self.matcher.path()
    }

    pub fn whitelist(&self) -> &ParamWhitelist {
        &self.whitelist
    }
}

/// A request that matched a route, carrying only forwardable parameters.
#[derive(Debug, Clone)]
pub struct RoutedRequest {
    pub route: Arc<Route>,
    pub params: BTreeMap<String, String>,
}

impl RoutedRequest {
    pub fn path(&self) -> &str {
        self.route.path()
    }
}

/// Ordered, immutable route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    /// Compile the configured targets, keeping their order.
    pub fn from_config(targets: &[TargetRoute]) -> Self {
        let mut seen = HashSet::new();
        let routes = targets
            .iter()
            .filter(|target| {
                if seen.insert(target.path.clone()) {
                    true
                } else {
                    tracing::warn!(path = %target.path, "Ignoring shadowed duplicate route");
                    false
                }
            })
            .map(|target| Arc::new(Route::from_target(target)))
            .collect::<Vec<_>>();

        for route in &routes {
            tracing::info!(
                path = route.path(),
                params = ?route.whitelist().names().collect::<Vec<_>>(),
                "Registered route"
            );
        }

        Self { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Match `path` and filter `params` to the matched route's whitelist.
    pub fn route(
        &self,
        path: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<RoutedRequest, GatewayError> {
        let route = self
            .routes
            .iter()
            .find(|route| route.matcher.matches(path))
            .ok_or_else(|| GatewayError::NotFound {
                path: path.to_string(),
            })?;

        Ok(RoutedRequest {
            route: route.clone(),
            params: route.whitelist.filter(params),
        })
    }
}
