//! Middleware: functions from handler to handler.
//!
//! A [`Middleware`] wraps a handler into another one, adding behaviour before
//! or after the inner call. [`Middlewares`] keeps them in registration order
//! and applies them first to last, so the first registered middleware ends up
//! innermost and the last registered one sees the request first.

use std::fmt;
use std::sync::Arc;

use spool_http::handler::Handler;

/// A wrapper that turns a handler into another.
pub trait Middleware: Send + Sync {
    fn wrap(&self, handler: Arc<dyn Handler>) -> Arc<dyn Handler>;
}

impl<F> Middleware for F
where
    F: Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync,
{
    fn wrap(&self, handler: Arc<dyn Handler>) -> Arc<dyn Handler> {
        self(handler)
    }
}

/// An ordered list of [`Middleware`]; applying an empty list is the identity.
#[derive(Default)]
pub struct Middlewares {
    inner: Vec<Box<dyn Middleware>>,
}

impl Middlewares {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a middleware that wraps around every one added before it.
    pub fn push(&mut self, middleware: impl Middleware + 'static) {
        self.inner.push(Box::new(middleware));
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Middleware for Middlewares {
    fn wrap(&self, handler: Arc<dyn Handler>) -> Arc<dyn Handler> {
        self.inner.iter().fold(handler, |handler, middleware| middleware.wrap(handler))
    }
}

impl fmt::Debug for Middlewares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middlewares").field("len", &self.inner.len()).finish()
    }
}
