//! History adapter
//!
//! The engine never touches a platform history directly. Root slots read
//! the current URL from a [`HistoryAdapter`] and subscribe to its change
//! signals; redirects and navigation helpers request mutations through it.
//! [`MemoryHistory`] is an in-memory entry stack usable outside a browser
//! and in tests.

use crate::event::{AsyncHandler, AsyncListeners, Subscription};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Opaque state stored with a history entry
pub type StateData = Arc<dyn Any + Send + Sync>;

/// History listener
pub type HistoryListener = AsyncHandler<Arc<HistoryEvent>>;

/// History signal kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryEventKind {
    PushState,
    ReplaceState,
    PopState,
    /// Sent before push/replace; cancellable
    WillChangeState,
}

impl HistoryEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryEventKind::PushState => "pushstate",
            HistoryEventKind::ReplaceState => "replacestate",
            HistoryEventKind::PopState => "popstate",
            HistoryEventKind::WillChangeState => "willchangestate",
        }
    }

    /// The current URL changed
    pub fn is_navigation(&self) -> bool {
        !matches!(self, HistoryEventKind::WillChangeState)
    }
}

/// History signal
pub struct HistoryEvent {
    kind: HistoryEventKind,
    url: String,
    prevented: AtomicBool,
}

impl HistoryEvent {
    pub fn new(kind: HistoryEventKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            prevented: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> HistoryEventKind {
        self.kind
    }

    /// Target URL for `willchangestate`, new URL otherwise
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Cancel a pending change (only meaningful for `willchangestate`)
    pub fn prevent_default(&self) {
        self.prevented.store(true, Ordering::SeqCst);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.prevented.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for HistoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryEvent")
            .field("kind", &self.kind.as_str())
            .field("url", &self.url)
            .field("prevented", &self.is_default_prevented())
            .finish()
    }
}

/// Browsing history as seen by the engine
///
/// Every mutation notifies subscribers with the resulting change.
#[async_trait]
pub trait HistoryAdapter: Send + Sync {
    /// Current URL: path plus optional `?query`
    fn current_url(&self) -> String;

    fn current_path(&self) -> String {
        split_url(&self.current_url()).0.to_string()
    }

    fn current_query(&self) -> Option<String> {
        split_url(&self.current_url()).1.map(str::to_string)
    }

    /// Add an entry; false when a `willchangestate` listener vetoed it
    async fn push_state(&self, state: Option<StateData>, title: &str, url: &str) -> bool;

    /// Overwrite the current entry; false when vetoed
    async fn replace_state(&self, state: Option<StateData>, title: &str, url: &str) -> bool;

    async fn back(&self);

    async fn forward(&self);

    async fn go(&self, delta: isize);

    fn subscribe(&self, listener: HistoryListener) -> Subscription;
}

/// Split a URL into path and query, dropping any `#fragment`
///
/// ```
/// use arbor_core::split_url;
///
/// assert_eq!(split_url("/a/b?x=1#top"), ("/a/b", Some("x=1")));
/// assert_eq!(split_url("/a"), ("/a", None));
/// ```
pub fn split_url(url: &str) -> (&str, Option<&str>) {
    let url = url.split('#').next().unwrap_or(url);
    match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}

/// Append a query string to a target, keeping any query it already has
pub fn append_query(target: &str, query: &str) -> String {
    let query = query.trim_start_matches('?');
    if query.is_empty() {
        target.to_string()
    } else if target.contains('?') {
        format!("{}&{}", target, query)
    } else {
        format!("{}?{}", target, query)
    }
}

/// Split `a=1&b=2` into a map; later keys win, values are not decoded
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

struct Entry {
    url: String,
    title: String,
    state: Option<StateData>,
}

struct Stack {
    entries: Vec<Entry>,
    index: usize,
}

impl Stack {
    fn current(&self) -> &Entry {
        &self.entries[self.index]
    }
}

/// In-memory history
pub struct MemoryHistory {
    stack: Mutex<Stack>,
    listeners: AsyncListeners<Arc<HistoryEvent>>,
}

impl MemoryHistory {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            stack: Mutex::new(Stack {
                entries: vec![Entry {
                    url: initial_url.into(),
                    title: String::new(),
                    state: None,
                }],
                index: 0,
            }),
            listeners: AsyncListeners::new(),
        }
    }

    /// Number of entries in the stack, never zero
    pub fn entry_count(&self) -> usize {
        self.stack.lock().entries.len()
    }

    /// Position of the current entry
    pub fn index(&self) -> usize {
        self.stack.lock().index
    }

    pub fn urls(&self) -> Vec<String> {
        self.stack.lock().entries.iter().map(|e| e.url.clone()).collect()
    }

    pub fn title(&self) -> String {
        self.stack.lock().current().title.clone()
    }

    pub fn state(&self) -> Option<StateData> {
        self.stack.lock().current().state.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    async fn notify(&self, kind: HistoryEventKind, url: &str) -> bool {
        let event = Arc::new(HistoryEvent::new(kind, url));
        self.listeners.emit(event.clone()).await;
        !event.is_default_prevented()
    }

    async fn change(
        &self,
        kind: HistoryEventKind,
        state: Option<StateData>,
        title: &str,
        url: &str,
    ) -> bool {
        if !self.notify(HistoryEventKind::WillChangeState, url).await {
            tracing::debug!(url, kind = kind.as_str(), "history change prevented");
            return false;
        }

        {
            let mut stack = self.stack.lock();
            let entry = Entry {
                url: url.to_string(),
                title: title.to_string(),
                state,
            };
            if kind == HistoryEventKind::PushState {
                let next = stack.index + 1;
                stack.entries.truncate(next);
                stack.entries.push(entry);
                stack.index = next;
            } else {
                let index = stack.index;
                stack.entries[index] = entry;
            }
        }

        self.notify(kind, url).await;
        true
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

#[async_trait]
impl HistoryAdapter for MemoryHistory {
    fn current_url(&self) -> String {
        self.stack.lock().current().url.clone()
    }

    async fn push_state(&self, state: Option<StateData>, title: &str, url: &str) -> bool {
        self.change(HistoryEventKind::PushState, state, title, url).await
    }

    async fn replace_state(&self, state: Option<StateData>, title: &str, url: &str) -> bool {
        self.change(HistoryEventKind::ReplaceState, state, title, url).await
    }

    async fn back(&self) {
        self.go(-1).await;
    }

    async fn forward(&self) {
        self.go(1).await;
    }

    async fn go(&self, delta: isize) {
        let url = {
            let mut stack = self.stack.lock();
            let target = stack.index as isize + delta;
            if target < 0 || target as usize >= stack.entries.len() {
                return;
            }
            stack.index = target as usize;
            stack.current().url.clone()
        };
        self.notify(HistoryEventKind::PopState, &url).await;
    }

    fn subscribe(&self, listener: HistoryListener) -> Subscription {
        self.listeners.subscribe(listener)
    }
}
