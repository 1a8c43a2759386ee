//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request path against a configured target
//! - Filter request parameters down to a route's whitelist
//!
//! # Design Decisions
//! - Path matching is exact and case-sensitive
//! - No prefix or regex matching: "/produce/x" does not match "/produce"
//! - Whitelisted keys missing from the request are omitted, never defaulted

use std::collections::{BTreeMap, BTreeSet};

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches one path exactly.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, path: &str) -> bool {
        self.path == path
    }
}

/// The set of parameter names a route forwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamWhitelist {
    allowed: BTreeSet<String>,
}

impl ParamWhitelist {
    pub fn new(allowed: BTreeSet<String>) -> Self {
        Self { allowed }
    }

    pub fn allows(&self, key: &str) -> bool {
        self.allowed.contains(key)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    /// Keep only whitelisted pairs.
    pub fn filter(&self, params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        params
            .iter()
            .filter(|(key, _)| self.allows(key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
