use std::sync::Arc;

use crate::Context;

/// A request handler or middleware.
///
/// Both share the same shape: they receive the [`Context`] of the current
/// request and write the response through it. A middleware calls
/// [`Context::next`] to run the rest of the chain; code placed after that
/// call runs once the downstream handlers have finished.
pub type HandlerFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Wraps a function or closure into a [`HandlerFunc`].
pub fn handler_fn<F>(f: F) -> HandlerFunc
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}
