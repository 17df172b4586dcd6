//! Error types for arbor-core

use arbor_path::PatternError;
use thiserror::Error;

/// Boxed error returned by user code: guards, resolvers, loaders, hooks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for arbor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the navigation engine
///
/// Only `InvalidRouteDefinition` is returned synchronously. Everything else
/// is reported through `navigationerror` and the navigation outcome.
#[derive(Debug, Error)]
pub enum Error {
    /// No route of the slot matched the fragment
    #[error("No route matched: {path}")]
    NoRouteMatched { path: String },

    /// Route rejected at registration time
    #[error("Invalid route definition: {0}")]
    InvalidRouteDefinition(String),

    /// A guard failed (a `false` guard is a cancellation, not this)
    #[error("Guard error: {0}")]
    Guard(#[source] BoxError),

    /// Custom resolve function failed
    #[error("Resolver error: {0}")]
    Resolver(#[source] BoxError),

    /// Component loader failed
    #[error("Loader error: {0}")]
    Loader(#[source] BoxError),

    /// Component constructor failed
    #[error("Construct error: {0}")]
    Construct(#[source] BoxError),

    /// Route setup hook failed
    #[error("Setup error: {0}")]
    Setup(#[source] BoxError),

    /// Host component refused to mount
    #[error("Mount error: {0}")]
    Mount(#[source] BoxError),

    /// Too many chained redirects
    #[error("Redirect loop: {target} exceeds {limit} chained redirects")]
    RedirectLoop { target: String, limit: usize },

    /// Redirect or navigation helper with no history adapter in reach
    #[error("No history adapter reachable from slot {slot}")]
    NoHistory { slot: String },
}

impl From<PatternError> for Error {
    fn from(err: PatternError) -> Self {
        Error::InvalidRouteDefinition(err.to_string())
    }
}
