//! Route resolution
//!
//! Turns a matched route into an outcome the controller can commit or
//! cancel. Redirects go through the history adapter as a replace, component
//! routes are loaded and set up (not mounted), resolver routes defer to
//! their resolve function.

use crate::fragment::resolve_target;
use crate::history::append_query;
use crate::{Error, HostComponent, Resolution, Result, Route, RouteKind, RoutingInfo};
use std::fmt;
use std::sync::Arc;

/// Result of resolving a matched route
pub enum Outcome {
    /// History replaced the URL with `target`
    Redirected(String),
    /// A `willchangestate` listener vetoed the replace to `target`
    RedirectPrevented(String),
    /// Ready to commit; `None` for a resolver that kept default handling
    Committed(Option<Arc<dyn HostComponent>>),
    /// The resolve function handled the navigation itself
    ResolverHandled,
    /// Loading, construction, setup, resolve or redirect failed
    Error(Error),
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Redirected(target) => f.debug_tuple("Redirected").field(target).finish(),
            Outcome::RedirectPrevented(target) => {
                f.debug_tuple("RedirectPrevented").field(target).finish()
            }
            Outcome::Committed(instance) => f
                .debug_tuple("Committed")
                .field(&instance.as_ref().map(|i| i.name().to_string()))
                .finish(),
            Outcome::ResolverHandled => f.write_str("ResolverHandled"),
            Outcome::Error(err) => f.debug_tuple("Error").field(err).finish(),
        }
    }
}

/// Resolve `route` for the navigation described by `info`
pub async fn resolve(route: &Route, info: &RoutingInfo) -> Outcome {
    let resolved = match route.kind() {
        RouteKind::Redirect {
            redirect_to,
            preserve_query,
        } => redirect(info, redirect_to, *preserve_query).await,
        RouteKind::Component { component, setup } => {
            resolve_component(info, component, setup.as_ref()).await
        }
        RouteKind::Resolver { resolve } => match resolve(info.clone()).await {
            Ok(Resolution::Continue) => Ok(Outcome::Committed(None)),
            Ok(Resolution::Handled) => Ok(Outcome::ResolverHandled),
            Err(err) => Err(Error::Resolver(err)),
        },
    };

    resolved.unwrap_or_else(Outcome::Error)
}

async fn redirect(info: &RoutingInfo, redirect_to: &str, preserve_query: bool) -> Result<Outcome> {
    let slot = &info.slot;
    let history = slot.history().ok_or_else(|| Error::NoHistory {
        slot: slot.name().to_string(),
    })?;

    let mut target = resolve_target(slot, redirect_to);
    if preserve_query {
        if let Some(query) = history.current_query() {
            target = append_query(&target, &query);
        }
    }

    let root = slot.root();
    let _scope = root.enter_redirect().ok_or_else(|| {
        tracing::warn!(
            slot = slot.name(),
            target = %target,
            limit = root.config().max_redirects,
            "redirect loop detected"
        );
        Error::RedirectLoop {
            target: target.clone(),
            limit: root.config().max_redirects,
        }
    })?;

    tracing::debug!(slot = slot.name(), target = %target, "redirecting");
    // Nested navigation triggered by the replace completes before this returns
    if !history.replace_state(None, "", &target).await {
        tracing::debug!(slot = slot.name(), target = %target, "redirect prevented");
        return Ok(Outcome::RedirectPrevented(target));
    }
    Ok(Outcome::Redirected(target))
}

async fn resolve_component(
    info: &RoutingInfo,
    component: &crate::Component,
    setup: Option<&crate::SetupFn>,
) -> Result<Outcome> {
    let instance = component.load().await?;
    instance.bind_slot(Arc::downgrade(&info.slot));
    if let Some(setup) = setup {
        setup(&instance, info).map_err(Error::Setup)?;
    }
    tracing::debug!(
        slot = info.slot.name(),
        component = instance.name(),
        "component resolved"
    );
    Ok(Outcome::Committed(Some(instance)))
}
