//! Navigation state machine
//!
//! One navigation attempt for one slot:
//!
//! ```text
//! Idle -> Matching -> GuardChecking -> Resolving -> Committing -> Idle
//!             |             |              |
//!             v             v              v
//!          Failed       Cancelled    Cancelled / Failed
//! ```
//!
//! `navigationstart` is emitted on entering Matching. Every attempt then
//! emits exactly one of success, cancel or error, followed by
//! `navigationend`.
//!
//! A slot only tracks its latest attempt. When a newer navigation starts
//! while an older one is suspended in a guard or resolver, the older one
//! finishes as `Cancelled(Superseded)` and commits nothing.

use crate::event::{CancelReason, NavigationEvent};
use crate::matcher::match_routes;
use crate::resolver::{self, Outcome};
use crate::{guard, Error, RouterSlot, RoutingInfo};
use std::sync::Arc;

/// Controller phase of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NavigationPhase {
    #[default]
    Idle,
    Matching,
    GuardChecking,
    Resolving,
    Committing,
    Cancelled,
    Failed,
}

impl NavigationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationPhase::Idle => "idle",
            NavigationPhase::Matching => "matching",
            NavigationPhase::GuardChecking => "guard_checking",
            NavigationPhase::Resolving => "resolving",
            NavigationPhase::Committing => "committing",
            NavigationPhase::Cancelled => "cancelled",
            NavigationPhase::Failed => "failed",
        }
    }
}

/// How a navigation attempt ended
#[derive(Debug, Clone)]
pub enum NavigationOutcome {
    /// A new route was committed
    Committed(RoutingInfo),
    /// The committed route matched again; children were re-notified
    Unchanged(RoutingInfo),
    Cancelled {
        info: RoutingInfo,
        reason: CancelReason,
    },
    Failed {
        info: Option<RoutingInfo>,
        error: Arc<Error>,
    },
}

impl NavigationOutcome {
    /// Committed or unchanged
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            NavigationOutcome::Committed(_) | NavigationOutcome::Unchanged(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, NavigationOutcome::Cancelled { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, NavigationOutcome::Failed { .. })
    }

    pub fn info(&self) -> Option<&RoutingInfo> {
        match self {
            NavigationOutcome::Committed(info)
            | NavigationOutcome::Unchanged(info)
            | NavigationOutcome::Cancelled { info, .. } => Some(info),
            NavigationOutcome::Failed { info, .. } => info.as_ref(),
        }
    }

    pub fn cancel_reason(&self) -> Option<&CancelReason> {
        match self {
            NavigationOutcome::Cancelled { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            NavigationOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Run one navigation attempt of `slot` for `path`
pub(crate) async fn navigate(slot: &Arc<RouterSlot>, path: String) -> NavigationOutcome {
    let generation = slot.begin_navigation();
    slot.set_phase(NavigationPhase::Matching);
    tracing::debug!(slot = slot.name(), path = %path, "navigation started");
    slot.emit(&NavigationEvent::Start { path: path.clone() });

    let outcome = run(slot, &path, generation).await;

    finish(slot, path, generation, &outcome);
    outcome
}

async fn run(slot: &Arc<RouterSlot>, path: &str, generation: u64) -> NavigationOutcome {
    let matched = match match_routes(&slot.routes(), path) {
        Some(matched) => Arc::new(matched),
        None => {
            return failed(
                None,
                Error::NoRouteMatched {
                    path: path.to_string(),
                },
            )
        }
    };
    let info = RoutingInfo::new(slot.clone(), matched);
    let route = info.route().clone();

    slot.set_phase(NavigationPhase::GuardChecking);
    match guard::evaluate(route.guards(), &info).await {
        Ok(true) => {}
        Ok(false) => return cancelled(info, CancelReason::GuardRejected),
        Err(err) => return failed(Some(info), err),
    }
    if !slot.is_current(generation) {
        return cancelled(info, CancelReason::Superseded);
    }

    if slot.is_committed(&route) {
        tracing::debug!(slot = slot.name(), route = route.path(), "route unchanged");
        slot.update_match(info.matched.clone());
        slot.notify_children().await;
        return NavigationOutcome::Unchanged(info);
    }

    slot.set_phase(NavigationPhase::Resolving);
    let instance = match resolver::resolve(&route, &info).await {
        Outcome::Committed(instance) => instance,
        Outcome::Redirected(target) => {
            return cancelled(info, CancelReason::Redirected { target });
        }
        Outcome::RedirectPrevented(target) => {
            return cancelled(info, CancelReason::RedirectPrevented { target });
        }
        Outcome::ResolverHandled => return cancelled(info, CancelReason::ResolverHandled),
        Outcome::Error(err) => return failed(Some(info), err),
    };
    if !slot.is_current(generation) {
        return cancelled(info, CancelReason::Superseded);
    }

    slot.set_phase(NavigationPhase::Committing);
    if let Err(err) = slot.commit(&info, instance) {
        return failed(Some(info), err);
    }
    tracing::info!(
        slot = slot.name(),
        route = route.path(),
        consumed = %info.fragments().consumed,
        "route committed"
    );

    if route.scrolls_to_top() && slot.config().scroll_on_commit {
        if let Some(scroll) = slot.scroll() {
            scroll.scroll_to_top();
        }
    }

    slot.notify_children().await;
    NavigationOutcome::Committed(info)
}

fn cancelled(info: RoutingInfo, reason: CancelReason) -> NavigationOutcome {
    NavigationOutcome::Cancelled { info, reason }
}

fn failed(info: Option<RoutingInfo>, error: Error) -> NavigationOutcome {
    NavigationOutcome::Failed {
        info,
        error: Arc::new(error),
    }
}

fn finish(slot: &RouterSlot, path: String, generation: u64, outcome: &NavigationOutcome) {
    let (phase, event) = match outcome {
        NavigationOutcome::Committed(info) | NavigationOutcome::Unchanged(info) => {
            (NavigationPhase::Idle, NavigationEvent::Success(info.clone()))
        }
        NavigationOutcome::Cancelled { info, reason } => {
            tracing::debug!(slot = slot.name(), path = %path, ?reason, "navigation cancelled");
            (
                NavigationPhase::Cancelled,
                NavigationEvent::Cancel {
                    info: info.clone(),
                    reason: reason.clone(),
                },
            )
        }
        NavigationOutcome::Failed { info, error } => {
            tracing::warn!(slot = slot.name(), path = %path, error = %error, "navigation failed");
            (
                NavigationPhase::Failed,
                NavigationEvent::Error {
                    path: path.clone(),
                    info: info.clone(),
                    error: error.clone(),
                },
            )
        }
    };

    // A superseded attempt must not clobber the phase of the newer one
    let current = slot.is_current(generation);
    if current {
        slot.set_phase(phase);
    }
    slot.emit(&event);
    if current {
        slot.set_phase(NavigationPhase::Idle);
    }
    slot.emit(&NavigationEvent::End {
        path,
        info: outcome.info().cloned(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{failing_page, page, record, Journal, ScrollCounter};
    use crate::{async_guard, guard, BoxError, Component, Route, SlotConfig};
    use futures::channel::oneshot;
    use parking_lot::Mutex;

    fn slot_with(routes: Vec<Route>) -> Arc<RouterSlot> {
        let slot = RouterSlot::new(SlotConfig::new("root"));
        slot.add_routes(routes);
        slot
    }

    #[tokio::test]
    async fn test_commit_event_order() {
        let journal = Journal::default();
        let slot = slot_with(vec![Route::component("home", page("Home", &journal)).unwrap()]);
        let events = record(&slot);

        let outcome = slot.load_path("home").await;

        assert!(matches!(outcome, NavigationOutcome::Committed(_)));
        assert_eq!(
            events.kinds(),
            vec!["navigationstart", "navigationsuccess", "navigationend"]
        );
        assert_eq!(
            journal.entries(),
            vec!["construct Home", "bind Home", "mount Home"]
        );
        assert_eq!(slot.phase(), NavigationPhase::Idle);
        assert_eq!(slot.current_route().unwrap().path(), "home");
    }

    #[tokio::test]
    async fn test_no_route_matched_keeps_content() {
        let journal = Journal::default();
        let slot = slot_with(vec![Route::component("home", page("Home", &journal)).unwrap()]);
        slot.load_path("home").await;
        let events = record(&slot);

        let outcome = slot.load_path("missing").await;

        assert!(matches!(
            outcome.error(),
            Some(Error::NoRouteMatched { path }) if path == "missing"
        ));
        assert!(outcome.info().is_none());
        assert_eq!(
            events.kinds(),
            vec!["navigationstart", "navigationerror", "navigationend"]
        );
        assert_eq!(slot.current_route().unwrap().path(), "home");
        assert!(!journal.contains("unmount Home"));
    }

    #[tokio::test]
    async fn test_guard_rejection_is_cancel() {
        let journal = Journal::default();
        let slot = slot_with(vec![
            Route::component("home", page("Home", &journal)).unwrap(),
            Route::component("admin", page("Admin", &journal))
                .unwrap()
                .guard(guard(|_| false)),
        ]);
        slot.load_path("home").await;
        let events = record(&slot);

        let outcome = slot.load_path("admin").await;

        assert_eq!(outcome.cancel_reason(), Some(&CancelReason::GuardRejected));
        assert_eq!(
            events.kinds(),
            vec!["navigationstart", "navigationcancel", "navigationend"]
        );
        assert!(!journal.contains("construct Admin"));
        assert_eq!(slot.current_route().unwrap().path(), "home");
    }

    #[tokio::test]
    async fn test_guard_error_is_navigation_error() {
        let journal = Journal::default();
        let slot = slot_with(vec![Route::component("home", page("Home", &journal))
            .unwrap()
            .guard(async_guard(|_| async {
                Err::<bool, BoxError>("auth backend down".into())
            }))]);

        let outcome = slot.load_path("home").await;

        assert!(matches!(outcome.error(), Some(Error::Guard(_))));
        assert!(outcome.info().is_some());
        assert!(slot.current_route().is_none());
    }

    #[tokio::test]
    async fn test_same_route_is_not_remounted() {
        let journal = Journal::default();
        let slot = slot_with(vec![Route::component("users/:id", page("User", &journal)).unwrap()]);

        slot.load_path("users/1").await;
        let outcome = slot.load_path("users/2").await;

        assert!(matches!(outcome, NavigationOutcome::Unchanged(_)));
        assert!(outcome.is_success());
        assert_eq!(journal.count("construct User"), 1);
        assert_eq!(journal.count("mount User"), 1);
        assert_eq!(slot.current_match().unwrap().param("id"), Some("2"));
    }

    #[tokio::test]
    async fn test_switching_routes_unmounts_old_first() {
        let journal = Journal::default();
        let slot = slot_with(vec![
            Route::component("a", page("A", &journal)).unwrap(),
            Route::component("b", page("B", &journal)).unwrap(),
        ]);

        slot.load_path("a").await;
        journal.clear();
        slot.load_path("b").await;

        assert_eq!(
            journal.entries(),
            vec!["construct B", "bind B", "unmount A", "mount B"]
        );
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_instance() {
        let journal = Journal::default();
        let slot = slot_with(vec![
            Route::component("a", page("A", &journal)).unwrap(),
            Route::component(
                "broken",
                Component::lazy(|| async { Err::<Component, BoxError>("404".into()) }),
            )
            .unwrap(),
        ]);
        slot.load_path("a").await;

        let outcome = slot.load_path("broken").await;

        assert!(matches!(outcome.error(), Some(Error::Loader(_))));
        assert!(!journal.contains("unmount A"));
        assert_eq!(slot.current_route().unwrap().path(), "a");
        assert_eq!(slot.instance().unwrap().name(), "A");
    }

    #[tokio::test]
    async fn test_mount_failure_clears_route() {
        let journal = Journal::default();
        let slot = slot_with(vec![
            Route::component("a", page("A", &journal)).unwrap(),
            Route::component("b", failing_page("B", &journal)).unwrap(),
        ]);
        slot.load_path("a").await;

        let outcome = slot.load_path("b").await;

        assert!(matches!(outcome.error(), Some(Error::Mount(_))));
        assert_eq!(journal.count("unmount A"), 1);
        assert!(slot.current_route().is_none());
        assert!(slot.instance().is_none());

        // Nothing committed, so a retry of `a` remounts it
        assert!(matches!(
            slot.load_path("a").await,
            NavigationOutcome::Committed(_)
        ));
        assert_eq!(journal.count("unmount A"), 1);
    }

    #[tokio::test]
    async fn test_resolver_outcomes() {
        let journal = Journal::default();
        let slot = slot_with(vec![
            Route::component("page", page("Page", &journal)).unwrap(),
            Route::resolver("handled", |_| async { Ok::<_, BoxError>(false) }).unwrap(),
            Route::resolver("default", |_| async { Ok::<_, BoxError>(()) }).unwrap(),
        ]);
        slot.load_path("page").await;

        let handled = slot.load_path("handled").await;
        assert_eq!(handled.cancel_reason(), Some(&CancelReason::ResolverHandled));
        assert!(!journal.contains("unmount Page"));

        let default = slot.load_path("default").await;
        assert!(matches!(default, NavigationOutcome::Committed(_)));
        assert!(journal.contains("unmount Page"));
        assert!(slot.instance().is_none());
        assert_eq!(slot.current_route().unwrap().path(), "default");
    }

    #[tokio::test]
    async fn test_scroll_to_top_unless_opted_out() {
        let journal = Journal::default();
        let scroll = Arc::new(ScrollCounter::default());
        let slot = RouterSlot::builder()
            .name("root")
            .scroll(scroll.clone())
            .route(Route::component("a", page("A", &journal)).unwrap())
            .route(Route::component("b", page("B", &journal)).unwrap().keep_scroll())
            .build();

        slot.load_path("a").await;
        assert_eq!(scroll.count(), 1);
        slot.load_path("b").await;
        assert_eq!(scroll.count(), 1);
        // Unchanged routes do not scroll
        slot.load_path("b").await;
        slot.load_path("a").await;
        slot.load_path("a").await;
        assert_eq!(scroll.count(), 2);
    }

    #[tokio::test]
    async fn test_scroll_disabled_by_config() {
        let journal = Journal::default();
        let scroll = Arc::new(ScrollCounter::default());
        let slot = RouterSlot::builder()
            .config(SlotConfig::new("root").scroll_on_commit(false))
            .scroll(scroll.clone())
            .route(Route::component("a", page("A", &journal)).unwrap())
            .build();

        slot.load_path("a").await;
        assert_eq!(scroll.count(), 0);
    }

    #[tokio::test]
    async fn test_newer_navigation_supersedes_pending_one() {
        let journal = Journal::default();
        let (release, gate) = oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(gate)));

        let slow_guard = async_guard(move |_| {
            let gate = gate.lock().take();
            async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                Ok(true)
            }
        });
        let slot = slot_with(vec![
            Route::component("slow", page("Slow", &journal))
                .unwrap()
                .guard(slow_guard),
            Route::component("fast", page("Fast", &journal)).unwrap(),
        ]);

        let first = slot.load_path("slow");
        let second = async {
            let outcome = slot.load_path("fast").await;
            let _ = release.send(());
            outcome
        };
        let (first, second) = futures::join!(first, second);

        assert_eq!(first.cancel_reason(), Some(&CancelReason::Superseded));
        assert!(matches!(second, NavigationOutcome::Committed(_)));
        assert!(!journal.contains("construct Slow"));
        assert_eq!(slot.current_route().unwrap().path(), "fast");
        assert_eq!(slot.phase(), NavigationPhase::Idle);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(NavigationPhase::default(), NavigationPhase::Idle);
        assert_eq!(NavigationPhase::GuardChecking.as_str(), "guard_checking");
    }
}
