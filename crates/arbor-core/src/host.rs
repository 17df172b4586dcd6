//! Capabilities the engine needs from the host UI

use crate::{BoxError, RouterSlot};
use std::sync::{Arc, Weak};

/// A concrete page/view mounted by a component route
///
/// The engine constructs it, hands it a back-reference to its owning slot,
/// runs the route's setup hook, then mounts it. Rendering is up to the host.
pub trait HostComponent: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Receive the owning slot; called once per navigation, before setup
    fn bind_slot(&self, _slot: Weak<RouterSlot>) {}

    /// Attach to the slot's container
    fn mount(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Detach from the slot's container
    fn unmount(&self) {}

    /// Nested slot living inside this component, if any
    fn child_slot(&self) -> Option<Arc<RouterSlot>> {
        None
    }
}

/// Scroll side effect issued after a successful commit
pub trait ScrollRestoration: Send + Sync {
    fn scroll_to_top(&self);
}
