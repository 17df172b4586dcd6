//! arbor-core: Navigation engine for trees of router slots
//!
//! Each [`RouterSlot`] owns an ordered route table. Given a path it picks
//! the first matching route, runs its guards, resolves it (redirect,
//! component or custom resolver) and commits the result. A fuzzy route
//! leaves the unmatched rest of the path to the slot nested in its
//! component, which is notified through the `changestate` cascade.
//!
//! The engine owns no platform state. History, mounting and scrolling are
//! reached through [`HistoryAdapter`], [`HostComponent`] and
//! [`ScrollRestoration`]. [`MemoryHistory`] is an in-memory adapter.
//!
//! ## Example
//! ```
//! use arbor_core::{
//!     guard, Component, HistoryAdapter, HostComponent, MemoryHistory, Route, RouterSlot,
//! };
//! use std::sync::Arc;
//!
//! struct Home;
//! impl HostComponent for Home {}
//!
//! # futures::executor::block_on(async {
//! let history = Arc::new(MemoryHistory::new("/"));
//! let root = RouterSlot::builder()
//!     .name("root")
//!     .history(history.clone())
//!     .route(Route::component("home", Component::constructor(|| Home)).unwrap())
//!     .route(Route::redirect("", "/home").unwrap())
//!     .route(Route::component("admin", Component::constructor(|| Home))
//!         .unwrap()
//!         .guard(guard(|_| false)))
//!     .build();
//! root.connect();
//!
//! root.load().await;
//! assert_eq!(history.current_url(), "/home");
//! assert_eq!(root.current_route().unwrap().path(), "home");
//!
//! root.push("/admin").await.unwrap();
//! assert_eq!(root.current_route().unwrap().path(), "home");
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod component;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod fragment;
pub mod guard;
pub mod history;
pub mod host;
pub mod matcher;
pub mod resolver;
pub mod route;
pub mod slot;

#[cfg(test)]
mod testing;

// Re-exports
pub use component::{Component, Constructor, Loader, MAX_LOAD_DEPTH};
pub use config::{SlotConfig, DEFAULT_MAX_REDIRECTS};
pub use controller::{NavigationOutcome, NavigationPhase};
pub use error::{BoxError, Error, Result};
pub use event::{
    AsyncHandler, AsyncListeners, CancelReason, ChangeState, Handler, Listeners,
    NavigationEvent, NavigationEventKind, Subscription,
};
pub use fragment::{child_fragment, construct_absolute_path, resolve_target};
pub use guard::{async_guard, evaluate as evaluate_guards, guard};
pub use history::{
    append_query, parse_query, split_url, HistoryAdapter, HistoryEvent, HistoryEventKind,
    HistoryListener, MemoryHistory, StateData,
};
pub use host::{HostComponent, ScrollRestoration};
pub use matcher::{match_routes, RouteMatch, RoutingInfo};
pub use resolver::{resolve, Outcome};
pub use route::{
    resolver, Guard, Resolution, ResolveFn, Route, RouteData, RouteDefinition, RouteKind,
    SetupFn,
};
pub use slot::{RouterSlot, RouterSlotBuilder};

pub use arbor_path::{PathFragments, PathMatch, PathPattern, PatternError, RawMatch};
