//! Guard evaluation
//!
//! Guards run one after another in declaration order. The first `false`
//! stops evaluation and cancels the navigation. A guard error is a
//! navigation error, never a silent rejection.

use crate::{BoxError, Error, Guard, Result, RoutingInfo};
use futures::future::FutureExt;
use std::future::Future;
use std::sync::Arc;

/// Guard from a synchronous predicate
pub fn guard<F>(predicate: F) -> Guard
where
    F: Fn(&RoutingInfo) -> bool + Send + Sync + 'static,
{
    Arc::new(move |info: RoutingInfo| {
        let allowed = predicate(&info);
        async move { Ok(allowed) }.boxed()
    })
}

/// Guard from an async predicate
pub fn async_guard<F, Fut>(predicate: F) -> Guard
where
    F: Fn(RoutingInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<bool, BoxError>> + Send + 'static,
{
    Arc::new(move |info: RoutingInfo| predicate(info).boxed())
}

/// Run `guards` against `info`
///
/// # Returns
/// `Ok(true)` when every guard allowed the navigation (or there are none),
/// `Ok(false)` at the first rejection, `Err(Error::Guard)` if a guard failed.
pub async fn evaluate(guards: &[Guard], info: &RoutingInfo) -> Result<bool> {
    for (index, guard) in guards.iter().enumerate() {
        let allowed = guard(info.clone()).await.map_err(Error::Guard)?;
        if !allowed {
            tracing::debug!(
                slot = info.slot.name(),
                route = info.route().path(),
                index,
                "guard rejected navigation"
            );
            return Ok(false);
        }
    }
    Ok(true)
}
