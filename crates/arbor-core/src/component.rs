//! Component loaders
//!
//! A component route may hold a ready instance, a constructor, an async
//! loader, or a module wrapper carrying a default export. All forms
//! normalize to one constructed instance.

use crate::{BoxError, Error, HostComponent, Result};
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Loader/module nesting allowed before giving up
pub const MAX_LOAD_DEPTH: usize = 8;

/// Builds a fresh instance
pub type Constructor =
    Arc<dyn Fn() -> std::result::Result<Arc<dyn HostComponent>, BoxError> + Send + Sync>;

/// Produces another component form asynchronously (lazy import)
pub type Loader =
    Arc<dyn Fn() -> BoxFuture<'static, std::result::Result<Component, BoxError>> + Send + Sync>;

/// Component source of a component route
#[derive(Clone)]
pub enum Component {
    /// Already constructed, passed through
    Instance(Arc<dyn HostComponent>),
    /// Constructed on every commit
    Constructor(Constructor),
    /// Awaited, then normalized again
    Loader(Loader),
    /// Module-like wrapper; only the default export is used
    Module { default: Box<Component> },
}

impl Component {
    pub fn instance<C: HostComponent + 'static>(component: C) -> Self {
        Component::Instance(Arc::new(component))
    }

    pub fn shared(component: Arc<dyn HostComponent>) -> Self {
        Component::Instance(component)
    }

    /// Infallible constructor
    pub fn constructor<F, C>(construct: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: HostComponent + 'static,
    {
        let construct: Constructor = Arc::new(move || {
            let component: Arc<dyn HostComponent> = Arc::new(construct());
            Ok(component)
        });
        Component::Constructor(construct)
    }

    pub fn try_constructor<F>(construct: F) -> Self
    where
        F: Fn() -> std::result::Result<Arc<dyn HostComponent>, BoxError> + Send + Sync + 'static,
    {
        Component::Constructor(Arc::new(construct))
    }

    pub fn lazy<F, Fut>(load: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Component, BoxError>> + Send + 'static,
    {
        let load: Loader = Arc::new(move || load().boxed());
        Component::Loader(load)
    }

    pub fn module(default: Component) -> Self {
        Component::Module {
            default: Box::new(default),
        }
    }

    /// Normalize to a single constructed instance
    pub async fn load(&self) -> Result<Arc<dyn HostComponent>> {
        let mut current = self.clone();
        for _ in 0..MAX_LOAD_DEPTH {
            current = match current {
                Component::Instance(instance) => return Ok(instance),
                Component::Constructor(construct) => return construct().map_err(Error::Construct),
                Component::Loader(load) => load().await.map_err(Error::Loader)?,
                Component::Module { default } => *default,
            };
        }
        Err(Error::Loader(
            format!("component did not resolve within {} steps", MAX_LOAD_DEPTH).into(),
        ))
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Instance(instance) => write!(f, "Instance({})", instance.name()),
            Component::Constructor(_) => f.write_str("Constructor"),
            Component::Loader(_) => f.write_str("Loader"),
            Component::Module { default } => write!(f, "Module({:?})", default),
        }
    }
}
