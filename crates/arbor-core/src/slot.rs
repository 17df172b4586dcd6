//! Router slots and the slot tree
//!
//! A [`RouterSlot`] owns an ordered route table and the state of its last
//! commit. Slots form a tree through non-owning parent links. A root slot
//! listens to its history adapter; a child listens only to its parent's
//! `changestate` cascade, so one external navigation flows top-down once.

use crate::controller::{self, NavigationOutcome, NavigationPhase};
use crate::event::{AsyncListeners, ChangeState, Listeners, NavigationEvent, Subscription};
use crate::fragment::{self, child_fragment};
use crate::history::{HistoryAdapter, HistoryEvent};
use crate::{
    Error, HostComponent, Result, Route, RouteDefinition, RouteMatch, RoutingInfo,
    ScrollRestoration, SlotConfig,
};
use futures::future::FutureExt;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

#[derive(Default)]
struct SlotState {
    phase: NavigationPhase,
    route: Option<Arc<Route>>,
    matched: Option<Arc<RouteMatch>>,
    instance: Option<Arc<dyn HostComponent>>,
}

/// A node of the router tree
pub struct RouterSlot {
    config: SlotConfig,
    history: Option<Arc<dyn HistoryAdapter>>,
    scroll: Option<Arc<dyn ScrollRestoration>>,
    routes: RwLock<Vec<Arc<Route>>>,
    state: Mutex<SlotState>,
    parent: RwLock<Option<Weak<RouterSlot>>>,
    listener: Mutex<Option<Subscription>>,
    changes: AsyncListeners<ChangeState>,
    events: Listeners<NavigationEvent>,
    generation: AtomicU64,
    redirects: AtomicUsize,
}

/// Builder for a [`RouterSlot`]
#[derive(Default)]
pub struct RouterSlotBuilder {
    config: SlotConfig,
    history: Option<Arc<dyn HistoryAdapter>>,
    scroll: Option<Arc<dyn ScrollRestoration>>,
    routes: Vec<Route>,
}

impl RouterSlotBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn config(mut self, config: SlotConfig) -> Self {
        self.config = config;
        self
    }

    /// History adapter; only root slots listen to it
    pub fn history(mut self, history: Arc<dyn HistoryAdapter>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn scroll(mut self, scroll: Arc<dyn ScrollRestoration>) -> Self {
        self.scroll = Some(scroll);
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Build a detached slot; call [`RouterSlot::connect`] to start listening
    pub fn build(self) -> Arc<RouterSlot> {
        Arc::new(RouterSlot {
            config: self.config,
            history: self.history,
            scroll: self.scroll,
            routes: RwLock::new(self.routes.into_iter().map(Arc::new).collect()),
            state: Mutex::new(SlotState::default()),
            parent: RwLock::new(None),
            listener: Mutex::new(None),
            changes: AsyncListeners::new(),
            events: Listeners::new(),
            generation: AtomicU64::new(0),
            redirects: AtomicUsize::new(0),
        })
    }
}

/// Holds one level of redirect depth on a root slot
pub(crate) struct RedirectScope {
    slot: Arc<RouterSlot>,
}

impl Drop for RedirectScope {
    fn drop(&mut self) {
        self.slot.redirects.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RouterSlot {
    pub fn builder() -> RouterSlotBuilder {
        RouterSlotBuilder::default()
    }

    /// Detached slot with no history adapter and no routes
    pub fn new(config: SlotConfig) -> Arc<Self> {
        Self::builder().config(config).build()
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    // Route table

    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.routes.read().clone()
    }

    /// Append routes without navigating
    pub fn add_routes(&self, routes: impl IntoIterator<Item = Route>) {
        let mut table = self.routes.write();
        table.extend(routes.into_iter().map(Arc::new));
        tracing::debug!(slot = self.name(), routes = table.len(), "routes added");
    }

    /// Validate and append route definitions
    ///
    /// Either every definition is added or, on the first invalid one, none.
    pub fn add_definitions(
        &self,
        definitions: impl IntoIterator<Item = RouteDefinition>,
    ) -> Result<()> {
        let routes = definitions
            .into_iter()
            .map(Route::try_from)
            .collect::<Result<Vec<_>>>()?;
        self.add_routes(routes);
        Ok(())
    }

    /// Append routes and, when `navigate` is set, re-match the current path
    pub async fn add(
        self: &Arc<Self>,
        routes: impl IntoIterator<Item = Route>,
        navigate: bool,
    ) -> Option<NavigationOutcome> {
        self.add_routes(routes);
        if navigate {
            self.load().await
        } else {
            None
        }
    }

    /// Empty the route table; committed content stays until the next navigation
    pub fn clear(&self) {
        self.routes.write().clear();
        tracing::debug!(slot = self.name(), "routes cleared");
    }

    /// Re-match the current path
    ///
    /// Roots read it from their history adapter, children from their
    /// parent's match. `None` when there is nothing to match against.
    pub async fn load(self: &Arc<Self>) -> Option<NavigationOutcome> {
        let path = self.current_fragment()?;
        Some(self.load_path(path).await)
    }

    /// Navigate this slot to `path`
    pub async fn load_path(self: &Arc<Self>, path: impl Into<String>) -> NavigationOutcome {
        controller::navigate(self, path.into()).await
    }

    fn current_fragment(&self) -> Option<String> {
        if self.is_root() {
            return self.history.as_ref().map(|history| history.current_path());
        }
        let parent = self.parent()?;
        let matched = parent.current_match()?;
        Some(child_fragment(&matched))
    }

    // State

    pub fn current_match(&self) -> Option<Arc<RouteMatch>> {
        self.state.lock().matched.clone()
    }

    pub fn current_route(&self) -> Option<Arc<Route>> {
        self.state.lock().route.clone()
    }

    /// Mounted instance of the committed route
    pub fn instance(&self) -> Option<Arc<dyn HostComponent>> {
        self.state.lock().instance.clone()
    }

    pub fn phase(&self) -> NavigationPhase {
        self.state.lock().phase
    }

    // Tree

    pub fn parent(&self) -> Option<Arc<RouterSlot>> {
        self.parent.read().as_ref().and_then(Weak::upgrade)
    }

    /// Re-parent the slot
    ///
    /// The old subscription is torn down before the new one is attached, so
    /// assigning the same parent twice leaves a single live subscription.
    /// `None` makes the slot a root again.
    pub fn set_parent(self: &Arc<Self>, parent: Option<&Arc<RouterSlot>>) {
        self.disconnect();
        *self.parent.write() = parent.map(Arc::downgrade);
        tracing::debug!(
            slot = self.name(),
            parent = parent.map(|p| p.name()),
            "parent assigned"
        );
        self.connect();
    }

    /// Start listening: history signals for a root, the parent's cascade otherwise
    pub fn connect(self: &Arc<Self>) {
        self.disconnect();

        let weak = Arc::downgrade(self);
        let subscription = if self.is_root() {
            self.history.as_ref().map(|history| {
                history.subscribe(Arc::new(move |event: Arc<HistoryEvent>| {
                    let slot = weak.clone();
                    async move {
                        if !event.kind().is_navigation() {
                            return;
                        }
                        if let Some(slot) = slot.upgrade() {
                            slot.load().await;
                        }
                    }
                    .boxed()
                }))
            })
        } else {
            self.parent().map(|parent| {
                parent.on_change(move |_| {
                    let slot = weak.clone();
                    async move {
                        if let Some(slot) = slot.upgrade() {
                            slot.load().await;
                        }
                    }
                })
            })
        };

        *self.listener.lock() = subscription;
    }

    /// Stop listening
    pub fn disconnect(&self) {
        let previous = self.listener.lock().take();
        drop(previous);
    }

    /// No parent assigned
    pub fn is_root(&self) -> bool {
        self.parent.read().is_none()
    }

    pub fn root(self: &Arc<Self>) -> Arc<RouterSlot> {
        let mut slot = self.clone();
        while let Some(parent) = slot.parent() {
            slot = parent;
        }
        slot
    }

    /// Slot nested in the mounted instance
    pub fn child(&self) -> Option<Arc<RouterSlot>> {
        self.instance()?.child_slot()
    }

    /// History adapter of this slot or its nearest ancestor
    pub fn history(&self) -> Option<Arc<dyn HistoryAdapter>> {
        match &self.history {
            Some(history) => Some(history.clone()),
            None => self.parent()?.history(),
        }
    }

    /// Scroll handler of this slot or its nearest ancestor
    pub fn scroll(&self) -> Option<Arc<dyn ScrollRestoration>> {
        match &self.scroll {
            Some(scroll) => Some(scroll.clone()),
            None => self.parent()?.scroll(),
        }
    }

    // Observers

    /// Lifecycle events of this slot
    pub fn on_navigation<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&NavigationEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler)
    }

    /// `changestate` cascade, awaited after each commit or re-confirmation
    pub fn on_change<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(ChangeState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.changes.subscribe_fn(handler)
    }

    // Paths and navigation helpers

    /// Absolute path of `fragment` relative to this slot's position
    pub fn construct_absolute_path(&self, path: &str) -> String {
        fragment::construct_absolute_path(self, path)
    }

    /// Push `target` (relative targets resolve under this slot's ancestors)
    ///
    /// # Returns
    /// `Ok(false)` when a `willchangestate` listener vetoed the change
    pub async fn push(&self, target: &str) -> Result<bool> {
        let history = self.require_history()?;
        let url = fragment::resolve_target(self, target);
        Ok(history.push_state(None, "", &url).await)
    }

    /// Replace the current entry with `target`
    pub async fn replace(&self, target: &str) -> Result<bool> {
        let history = self.require_history()?;
        let url = fragment::resolve_target(self, target);
        Ok(history.replace_state(None, "", &url).await)
    }

    fn require_history(&self) -> Result<Arc<dyn HistoryAdapter>> {
        self.history().ok_or_else(|| Error::NoHistory {
            slot: self.name().to_string(),
        })
    }

    // Controller hooks

    pub(crate) fn begin_navigation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    pub(crate) fn set_phase(&self, phase: NavigationPhase) {
        self.state.lock().phase = phase;
        tracing::trace!(slot = self.name(), phase = phase.as_str(), "phase");
    }

    pub(crate) fn emit(&self, event: &NavigationEvent) {
        self.events.emit(event);
    }

    /// `route` is the committed route (pointer identity)
    pub(crate) fn is_committed(&self, route: &Arc<Route>) -> bool {
        self.state
            .lock()
            .route
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, route))
    }

    pub(crate) fn update_match(&self, matched: Arc<RouteMatch>) {
        self.state.lock().matched = Some(matched);
    }

    pub(crate) async fn notify_children(&self) {
        self.changes.emit(ChangeState).await;
    }

    /// Swap the mounted instance for `instance` and record the commit
    ///
    /// The previous instance is unmounted first and its nested slot stops
    /// following this slot's cascade. If the new one fails to mount, the
    /// slot is left with nothing committed.
    pub(crate) fn commit(
        &self,
        info: &RoutingInfo,
        instance: Option<Arc<dyn HostComponent>>,
    ) -> Result<()> {
        let previous = self.state.lock().instance.take();
        if let Some(previous) = previous {
            detach_child(&*previous);
            previous.unmount();
        }

        if let Some(instance) = &instance {
            if let Err(err) = instance.mount() {
                // Mount may have attached the nested slot before failing
                detach_child(&**instance);
                let mut state = self.state.lock();
                state.route = None;
                state.matched = None;
                return Err(Error::Mount(err));
            }
        }

        let mut state = self.state.lock();
        state.route = Some(info.route().clone());
        state.matched = Some(info.matched.clone());
        state.instance = instance;
        Ok(())
    }

    /// Take one level of redirect depth, `None` past `max_redirects`
    pub(crate) fn enter_redirect(self: &Arc<Self>) -> Option<RedirectScope> {
        let depth = self.redirects.fetch_add(1, Ordering::SeqCst) + 1;
        if depth > self.config.max_redirects {
            self.redirects.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(RedirectScope { slot: self.clone() })
    }

    #[cfg(test)]
    pub(crate) fn change_listener_count(&self) -> usize {
        self.changes.len()
    }
}

fn detach_child(instance: &dyn HostComponent) {
    if let Some(child) = instance.child_slot() {
        tracing::debug!(slot = child.name(), "nested slot detached");
        child.disconnect();
    }
}

impl Drop for RouterSlot {
    fn drop(&mut self) {
        if let Some(instance) = self.state.get_mut().instance.take() {
            instance.unmount();
        }
    }
}

impl fmt::Debug for RouterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RouterSlot")
            .field("name", &self.config.name)
            .field("routes", &self.routes.read().len())
            .field("phase", &state.phase)
            .field("route", &state.route.as_ref().map(|r| r.path().to_string()))
            .field("root", &self.is_root())
            .finish()
    }
}
