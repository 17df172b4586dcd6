//! Observer plumbing and lifecycle events
//!
//! Listeners register with `subscribe` and get a [`Subscription`] back.
//! Dropping the subscription (or calling `unsubscribe`) detaches the
//! listener. Emission works on a snapshot of the listener list, so handlers
//! may subscribe or unsubscribe while an event is being delivered.

use crate::{Error, RoutingInfo};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Async listener, awaited in registration order
pub type AsyncHandler<E> = Arc<dyn Fn(E) -> BoxFuture<'static, ()> + Send + Sync>;

/// Sync listener
pub type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Handle that detaches a listener when dropped
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wrap a detach callback
    pub fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Detach now
    pub fn unsubscribe(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}

struct Registry<H> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, H)>>,
}

impl<H: Clone + Send + 'static> Registry<H> {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        })
    }

    fn insert(self: &Arc<Self>, handler: H) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, handler));
        tracing::trace!(id, "listener attached");

        let registry = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.entries.lock().retain(|(entry, _)| *entry != id);
                tracing::trace!(id, "listener detached");
            }
        })
    }

    fn snapshot(&self) -> Vec<H> {
        self.entries.lock().iter().map(|(_, h)| h.clone()).collect()
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Sync event bus
pub struct Listeners<E> {
    registry: Arc<Registry<Handler<E>>>,
}

impl<E: 'static> Listeners<E> {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.registry.insert(Arc::new(handler))
    }

    pub fn emit(&self, event: &E) {
        for handler in self.registry.snapshot() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Async event bus; `emit` awaits every listener in turn
pub struct AsyncListeners<E> {
    registry: Arc<Registry<AsyncHandler<E>>>,
}

impl<E: Clone + Send + 'static> AsyncListeners<E> {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    pub fn subscribe(&self, handler: AsyncHandler<E>) -> Subscription {
        self.registry.insert(handler)
    }

    pub fn subscribe_fn<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.subscribe(Arc::new(move |event: E| handler(event).boxed()))
    }

    pub async fn emit(&self, event: E) {
        for handler in self.registry.snapshot() {
            handler(event.clone()).await;
        }
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Clone + Send + 'static> Default for AsyncListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parent-to-child cascade signal (`changestate`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeState;

/// Why a navigation stopped without committing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// A guard returned false
    GuardRejected,
    /// The route redirected elsewhere
    Redirected { target: String },
    /// The redirect's history replace was vetoed by `willchangestate`
    RedirectPrevented { target: String },
    /// A resolver route took over the navigation
    ResolverHandled,
    /// A newer navigation started on the same slot
    Superseded,
}

/// Lifecycle event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationEventKind {
    Start,
    Success,
    Cancel,
    Error,
    End,
}

impl NavigationEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationEventKind::Start => "navigationstart",
            NavigationEventKind::Success => "navigationsuccess",
            NavigationEventKind::Cancel => "navigationcancel",
            NavigationEventKind::Error => "navigationerror",
            NavigationEventKind::End => "navigationend",
        }
    }
}

impl fmt::Display for NavigationEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle event emitted by a slot
#[derive(Clone)]
pub enum NavigationEvent {
    /// Entering the matching phase
    Start { path: String },
    /// Committed, or same route re-confirmed
    Success(RoutingInfo),
    /// Stopped without committing
    Cancel { info: RoutingInfo, reason: CancelReason },
    /// Failed; `info` is missing when nothing matched
    Error {
        path: String,
        info: Option<RoutingInfo>,
        error: Arc<Error>,
    },
    /// Always last, after one of success/cancel/error
    End {
        path: String,
        info: Option<RoutingInfo>,
    },
}

impl NavigationEvent {
    pub fn kind(&self) -> NavigationEventKind {
        match self {
            NavigationEvent::Start { .. } => NavigationEventKind::Start,
            NavigationEvent::Success(_) => NavigationEventKind::Success,
            NavigationEvent::Cancel { .. } => NavigationEventKind::Cancel,
            NavigationEvent::Error { .. } => NavigationEventKind::Error,
            NavigationEvent::End { .. } => NavigationEventKind::End,
        }
    }

    /// Routing context, when a route had matched
    pub fn info(&self) -> Option<&RoutingInfo> {
        match self {
            NavigationEvent::Start { .. } => None,
            NavigationEvent::Success(info) | NavigationEvent::Cancel { info, .. } => Some(info),
            NavigationEvent::Error { info, .. } | NavigationEvent::End { info, .. } => {
                info.as_ref()
            }
        }
    }
}

impl fmt::Debug for NavigationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.kind().as_str());
        if let Some(info) = self.info() {
            s.field("route", &info.route().path());
        }
        match self {
            NavigationEvent::Start { path } | NavigationEvent::End { path, .. } => {
                s.field("path", path);
            }
            NavigationEvent::Cancel { reason, .. } => {
                s.field("reason", reason);
            }
            NavigationEvent::Error { path, error, .. } => {
                s.field("path", path).field("error", &error.to_string());
            }
            NavigationEvent::Success(_) => {}
        }
        s.finish()
    }
}
