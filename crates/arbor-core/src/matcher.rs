//! Route-table matching
//!
//! Runs the path matcher over a slot's routes in declaration order. The
//! first route that matches wins.

use crate::history::parse_query;
use crate::{Route, RouterSlot};
use arbor_path::{PathFragments, RawMatch};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The winning route for a fragment
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Matched route (pointer identity is the route's identity)
    pub route: Arc<Route>,
    /// Captured path parameters
    pub params: HashMap<String, String>,
    /// Consumed / rest split
    pub fragments: PathFragments,
    /// Raw matcher output
    pub raw: RawMatch,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// First route of `routes` matching `fragment`
pub fn match_routes(routes: &[Arc<Route>], fragment: &str) -> Option<RouteMatch> {
    routes.iter().find_map(|route| {
        route.match_fragment(fragment).map(|m| RouteMatch {
            route: route.clone(),
            params: m.params_map(),
            fragments: m.fragments,
            raw: m.raw,
        })
    })
}

/// Navigation context handed to guards, resolvers, setup hooks and listeners
#[derive(Clone)]
pub struct RoutingInfo {
    pub slot: Arc<RouterSlot>,
    pub matched: Arc<RouteMatch>,
}

impl RoutingInfo {
    pub fn new(slot: Arc<RouterSlot>, matched: Arc<RouteMatch>) -> Self {
        Self { slot, matched }
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.matched.route
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.matched.params
    }

    pub fn fragments(&self) -> &PathFragments {
        &self.matched.fragments
    }

    /// Query parameters of the current URL
    pub fn query(&self) -> HashMap<String, String> {
        self.slot
            .history()
            .and_then(|history| history.current_query())
            .map(|query| parse_query(&query))
            .unwrap_or_default()
    }
}

impl fmt::Debug for RoutingInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingInfo")
            .field("slot", &self.slot.name())
            .field("match", &self.matched)
            .finish()
    }
}
