//! Test doubles: recording host components, event recorder, scroll counter

use crate::event::{NavigationEvent, Subscription};
use crate::matcher::match_routes;
use crate::{
    BoxError, Component, HostComponent, Route, RouterSlot, RoutingInfo, ScrollRestoration,
    SlotConfig,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Shared log of lifecycle calls
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().iter().any(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Host component logging `bind`, `mount` and `unmount`
pub struct Page {
    name: String,
    journal: Journal,
    fail_mount: bool,
    child: Option<Arc<RouterSlot>>,
    slot: Mutex<Option<Weak<RouterSlot>>>,
}

impl HostComponent for Page {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind_slot(&self, slot: Weak<RouterSlot>) {
        self.journal.push(format!("bind {}", self.name));
        *self.slot.lock() = Some(slot);
    }

    fn mount(&self) -> Result<(), BoxError> {
        // Layouts attach their nested slot once they are in the tree
        let owner = self.slot.lock().as_ref().and_then(Weak::upgrade);
        if let (Some(child), Some(owner)) = (&self.child, owner) {
            child.set_parent(Some(&owner));
        }

        if self.fail_mount {
            self.journal.push(format!("mount-failed {}", self.name));
            return Err(format!("{} refused to mount", self.name).into());
        }
        self.journal.push(format!("mount {}", self.name));
        Ok(())
    }

    fn unmount(&self) {
        self.journal.push(format!("unmount {}", self.name));
    }

    fn child_slot(&self) -> Option<Arc<RouterSlot>> {
        self.child.clone()
    }
}

fn constructor(
    name: &str,
    journal: &Journal,
    fail_mount: bool,
    child: Option<Arc<RouterSlot>>,
) -> Component {
    let name = name.to_string();
    let journal = journal.clone();
    Component::constructor(move || {
        journal.push(format!("construct {}", name));
        Page {
            name: name.clone(),
            journal: journal.clone(),
            fail_mount,
            child: child.clone(),
            slot: Mutex::new(None),
        }
    })
}

/// Page built anew on every commit
pub fn page(name: &str, journal: &Journal) -> Component {
    constructor(name, journal, false, None)
}

/// Page whose `mount` fails
pub fn failing_page(name: &str, journal: &Journal) -> Component {
    constructor(name, journal, true, None)
}

/// Page hosting `child`, which it parents to its own slot on mount
pub fn layout(name: &str, journal: &Journal, child: &Arc<RouterSlot>) -> Component {
    constructor(name, journal, false, Some(child.clone()))
}

/// Layout that attaches `child` and then fails to mount
pub fn failing_layout(name: &str, journal: &Journal, child: &Arc<RouterSlot>) -> Component {
    constructor(name, journal, true, Some(child.clone()))
}

/// Records every lifecycle event of a slot
pub struct Recorder {
    events: Arc<Mutex<Vec<NavigationEvent>>>,
    _subscription: Subscription,
}

impl Recorder {
    pub fn events(&self) -> Vec<NavigationEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.kind().as_str()).collect()
    }
}

pub fn record(slot: &Arc<RouterSlot>) -> Recorder {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let subscription = slot.on_navigation(move |event| sink.lock().push(event.clone()));
    Recorder {
        events,
        _subscription: subscription,
    }
}

#[derive(Default)]
pub struct ScrollCounter(AtomicUsize);

impl ScrollCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl ScrollRestoration for ScrollCounter {
    fn scroll_to_top(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Routing context for `route` matched against `fragment` on `slot`
pub fn info_on(slot: &Arc<RouterSlot>, route: Route, fragment: &str) -> RoutingInfo {
    let matched =
        match_routes(&[Arc::new(route)], fragment).expect("route matches fragment");
    RoutingInfo::new(slot.clone(), Arc::new(matched))
}

/// Routing context of a resolver route matched against its own pattern
pub fn info_for(pattern: &str) -> RoutingInfo {
    let slot = RouterSlot::new(SlotConfig::new("test"));
    let route = Route::resolver(pattern, |_| async { Ok::<_, BoxError>(()) })
        .expect("valid pattern");
    info_on(&slot, route, pattern)
}
