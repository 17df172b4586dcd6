//! Fragment propagation between slots
//!
//! A slot consumes a prefix of its fragment and forwards the canonical form
//! of the rest to its child. Walking the other way, the consumed fragments
//! of all ancestors rebuild an absolute path.

use crate::history::split_url;
use crate::{RouteMatch, RouterSlot};
use arbor_path::{canonicalize, join};

/// Fragment handed to the child of a slot that produced `parent`
pub fn child_fragment(parent: &RouteMatch) -> String {
    canonicalize(&parent.fragments.rest)
}

/// Absolute path of `fragment` as seen from `slot`
///
/// Prefixes every ancestor's consumed fragment, root first. Matching the
/// result from the root walks the same chain of routes.
pub fn construct_absolute_path(slot: &RouterSlot, fragment: &str) -> String {
    let mut consumed = Vec::new();
    let mut ancestor = slot.parent();
    while let Some(parent) = ancestor {
        if let Some(m) = parent.current_match() {
            consumed.push(m.fragments.consumed.clone());
        }
        ancestor = parent.parent();
    }
    consumed.reverse();

    join(
        consumed
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(fragment)),
    )
}

/// Resolve a link or redirect target against `slot`
///
/// Absolute targets (leading `/`) are only canonicalized; relative ones
/// are placed under the slot's ancestors. A query survives unchanged.
pub fn resolve_target(slot: &RouterSlot, target: &str) -> String {
    let (path, query) = split_url(target);
    let path = if path.starts_with('/') {
        canonicalize(path)
    } else {
        construct_absolute_path(slot, path)
    };

    match query {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    }
}
