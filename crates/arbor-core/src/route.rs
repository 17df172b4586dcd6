//! Route definitions
//!
//! A [`Route`] is a validated, compiled route: its pattern is compiled once
//! and its kind is exactly one of redirect, component or resolver.
//! [`RouteDefinition`] is the loose, data-shaped form; converting it with
//! `Route::try_from` performs the registration-time checks.

use crate::{BoxError, Component, Error, HostComponent, Result, RoutingInfo};
use arbor_path::{PathMatch, PathPattern};
use futures::future::{BoxFuture, FutureExt};
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Predicate that may veto a navigation
pub type Guard = Arc<
    dyn Fn(RoutingInfo) -> BoxFuture<'static, std::result::Result<bool, BoxError>> + Send + Sync,
>;

/// Custom resolution taking over a match
pub type ResolveFn = Arc<
    dyn Fn(RoutingInfo) -> BoxFuture<'static, std::result::Result<Resolution, BoxError>>
        + Send
        + Sync,
>;

/// Hook run on a freshly constructed instance, before it is mounted
pub type SetupFn = Arc<
    dyn Fn(&Arc<dyn HostComponent>, &RoutingInfo) -> std::result::Result<(), BoxError>
        + Send
        + Sync,
>;

/// Opaque route metadata
pub type RouteData = Arc<dyn Any + Send + Sync>;

/// What a resolver decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Keep the default handling (commit the route)
    Continue,
    /// The resolver handled the navigation itself
    Handled,
}

impl From<bool> for Resolution {
    fn from(proceed: bool) -> Self {
        if proceed {
            Resolution::Continue
        } else {
            Resolution::Handled
        }
    }
}

impl From<()> for Resolution {
    fn from(_: ()) -> Self {
        Resolution::Continue
    }
}

/// Wrap an async resolve function
pub fn resolver<F, Fut, R>(resolve: F) -> ResolveFn
where
    F: Fn(RoutingInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<R, BoxError>> + Send + 'static,
    R: Into<Resolution>,
{
    Arc::new(move |info: RoutingInfo| {
        let pending = resolve(info);
        async move { pending.await.map(Into::<Resolution>::into) }.boxed()
    })
}

/// Route variant
#[derive(Clone)]
pub enum RouteKind {
    Redirect {
        redirect_to: String,
        preserve_query: bool,
    },
    Component {
        component: Component,
        setup: Option<SetupFn>,
    },
    Resolver {
        resolve: ResolveFn,
    },
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Redirect { .. } => "redirect",
            RouteKind::Component { .. } => "component",
            RouteKind::Resolver { .. } => "resolver",
        }
    }
}

/// A compiled route
#[derive(Clone)]
pub struct Route {
    pattern: PathPattern,
    kind: RouteKind,
    data: Option<RouteData>,
    guards: SmallVec<[Guard; 2]>,
    fuzzy: bool,
    scroll_to_top: bool,
}

impl Route {
    /// Compile `path` and validate `kind`
    pub fn new(path: &str, kind: RouteKind) -> Result<Self> {
        if let RouteKind::Redirect { redirect_to, .. } = &kind {
            if redirect_to.trim().is_empty() {
                return Err(Error::InvalidRouteDefinition(format!(
                    "redirect route `{}` has an empty target",
                    path
                )));
            }
        }

        Ok(Self {
            pattern: PathPattern::compile(path)?,
            kind,
            data: None,
            guards: SmallVec::new(),
            fuzzy: false,
            scroll_to_top: true,
        })
    }

    pub fn redirect(path: &str, redirect_to: impl Into<String>) -> Result<Self> {
        Self::new(
            path,
            RouteKind::Redirect {
                redirect_to: redirect_to.into(),
                preserve_query: false,
            },
        )
    }

    pub fn component(path: &str, component: Component) -> Result<Self> {
        Self::new(
            path,
            RouteKind::Component {
                component,
                setup: None,
            },
        )
    }

    pub fn resolver<F, Fut, R>(path: &str, resolve: F) -> Result<Self>
    where
        F: Fn(RoutingInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, BoxError>> + Send + 'static,
        R: Into<Resolution>,
    {
        Self::new(
            path,
            RouteKind::Resolver {
                resolve: resolver(resolve),
            },
        )
    }

    /// Match as a prefix, leaving the rest to child slots
    pub fn fuzzy(mut self) -> Self {
        self.fuzzy = true;
        self
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn with_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.data = Some(Arc::new(data));
        self
    }

    /// Skip the scroll-to-top request on commit
    pub fn keep_scroll(mut self) -> Self {
        self.scroll_to_top = false;
        self
    }

    /// Append the current query to the redirect target
    ///
    /// Only meaningful on redirect routes. Other kinds are left untouched,
    /// and debug builds panic.
    pub fn preserve_query(mut self) -> Self {
        debug_assert!(
            matches!(self.kind, RouteKind::Redirect { .. }),
            "preserve_query only applies to redirect routes"
        );
        if let RouteKind::Redirect { preserve_query, .. } = &mut self.kind {
            *preserve_query = true;
        }
        self
    }

    /// Set the setup hook
    ///
    /// Only meaningful on component routes. Other kinds are left untouched,
    /// and debug builds panic.
    pub fn setup<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arc<dyn HostComponent>, &RoutingInfo) -> std::result::Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        debug_assert!(
            matches!(self.kind, RouteKind::Component { .. }),
            "setup only applies to component routes"
        );
        if let RouteKind::Component { setup, .. } = &mut self.kind {
            *setup = Some(Arc::new(hook));
        }
        self
    }

    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn kind(&self) -> &RouteKind {
        &self.kind
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    pub fn scrolls_to_top(&self) -> bool {
        self.scroll_to_top
    }

    /// Metadata downcast to `T`
    pub fn data<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.data.as_ref()?.downcast_ref::<T>()
    }

    pub(crate) fn match_fragment(&self, fragment: &str) -> Option<PathMatch> {
        self.pattern.matches(fragment, self.fuzzy)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path())
            .field("kind", &self.kind.as_str())
            .field("guards", &self.guards.len())
            .field("fuzzy", &self.fuzzy)
            .finish()
    }
}

/// Loose route definition, validated when converted into a [`Route`]
///
/// Exactly one of `redirect_to`, `component` and `resolve` must be set.
#[derive(Clone, Default)]
pub struct RouteDefinition {
    pub path: String,
    pub redirect_to: Option<String>,
    pub preserve_query: bool,
    pub component: Option<Component>,
    pub setup: Option<SetupFn>,
    pub resolve: Option<ResolveFn>,
    pub data: Option<RouteData>,
    pub guards: Vec<Guard>,
    pub fuzzy: bool,
    pub keep_scroll: bool,
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

impl TryFrom<RouteDefinition> for Route {
    type Error = Error;

    fn try_from(def: RouteDefinition) -> Result<Self> {
        let invalid = |reason: &str| {
            Error::InvalidRouteDefinition(format!("route `{}` {}", def.path, reason))
        };

        if def.setup.is_some() && def.component.is_none() {
            return Err(invalid("has a setup hook but no component"));
        }

        let kind = match (def.redirect_to.clone(), def.component.clone(), def.resolve.clone()) {
            (Some(redirect_to), None, None) => RouteKind::Redirect {
                redirect_to,
                preserve_query: def.preserve_query,
            },
            (None, Some(component), None) => RouteKind::Component {
                component,
                setup: def.setup.clone(),
            },
            (None, None, Some(resolve)) => RouteKind::Resolver { resolve },
            (None, None, None) => {
                return Err(invalid("declares none of redirect_to, component and resolve"));
            }
            _ => {
                return Err(invalid(
                    "declares more than one of redirect_to, component and resolve",
                ));
            }
        };

        let mut route = Route::new(&def.path, kind)?;
        route.data = def.data;
        route.guards = def.guards.into_iter().collect();
        route.fuzzy = def.fuzzy;
        route.scroll_to_top = !def.keep_scroll;
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blank;
    impl HostComponent for Blank {}

    #[test]
    fn test_redirect_needs_target() {
        assert!(matches!(
            Route::redirect("old", "  "),
            Err(Error::InvalidRouteDefinition(_))
        ));
        assert!(Route::redirect("old", "/new").is_ok());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(matches!(
            Route::component("users/:", Component::instance(Blank)),
            Err(Error::InvalidRouteDefinition(_))
        ));
    }

    #[test]
    fn test_builder_flags() {
        let route = Route::redirect("old", "/new")
            .unwrap()
            .fuzzy()
            .preserve_query()
            .keep_scroll()
            .with_data(42u32);

        assert_eq!(route.path(), "old");
        assert!(route.is_fuzzy());
        assert!(!route.scrolls_to_top());
        assert_eq!(route.data::<u32>(), Some(&42));
        assert_eq!(route.data::<String>(), None);
        assert!(matches!(
            route.kind(),
            RouteKind::Redirect {
                preserve_query: true,
                ..
            }
        ));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "preserve_query only applies to redirect routes")]
    fn test_preserve_query_on_component_route() {
        let _ = Route::component("home", Component::instance(Blank))
            .unwrap()
            .preserve_query();
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "setup only applies to component routes")]
    fn test_setup_on_redirect_route() {
        let _ = Route::redirect("old", "/new")
            .unwrap()
            .setup(|_: &Arc<dyn HostComponent>, _: &RoutingInfo| Ok(()));
    }

    #[test]
    fn test_definition_requires_exactly_one_kind() {
        let none = RouteDefinition::new("home");
        assert!(matches!(
            Route::try_from(none),
            Err(Error::InvalidRouteDefinition(msg)) if msg.contains("none")
        ));

        let both = RouteDefinition {
            redirect_to: Some("/x".to_string()),
            component: Some(Component::instance(Blank)),
            ..RouteDefinition::new("home")
        };
        assert!(matches!(
            Route::try_from(both),
            Err(Error::InvalidRouteDefinition(msg)) if msg.contains("more than one")
        ));

        let redirect = RouteDefinition {
            redirect_to: Some(String::new()),
            ..RouteDefinition::new("home")
        };
        assert!(Route::try_from(redirect).is_err());
    }

    #[test]
    fn test_definition_setup_without_component() {
        let setup: SetupFn = Arc::new(|_: &Arc<dyn HostComponent>, _: &RoutingInfo| Ok(()));
        let def = RouteDefinition {
            resolve: Some(resolver(|_| async { Ok::<_, BoxError>(()) })),
            setup: Some(setup),
            ..RouteDefinition::new("x")
        };
        assert!(Route::try_from(def).is_err());
    }

    #[test]
    fn test_definition_carries_options() {
        let def = RouteDefinition {
            component: Some(Component::instance(Blank)),
            fuzzy: true,
            keep_scroll: true,
            guards: vec![crate::guard(|_| true)],
            ..RouteDefinition::new("app")
        };
        let route = Route::try_from(def).unwrap();
        assert!(route.is_fuzzy());
        assert!(!route.scrolls_to_top());
        assert_eq!(route.guards().len(), 1);
        assert_eq!(route.kind().as_str(), "component");
    }

    #[test]
    fn test_resolution_from() {
        assert_eq!(Resolution::from(true), Resolution::Continue);
        assert_eq!(Resolution::from(false), Resolution::Handled);
        assert_eq!(Resolution::from(()), Resolution::Continue);
    }
}
