//! Prefix routing table.
//!
//! Handlers are registered under a path prefix. Resolution tries prefixes from
//! the longest to the shortest, so `/files/` wins over `/` for `/files/a`.
//! The root prefix `/` is special: it only matches the path `/` itself, never
//! acting as a catch-all.

use std::fmt;
use std::sync::Arc;

use spool_http::handler::Handler;

/// The root prefix, matched exactly.
const ROOT: &str = "/";

#[derive(Default)]
pub struct Router {
    items: Vec<RouterItem>,
}

struct RouterItem {
    prefix: String,
    handler: Arc<dyn Handler>,
}

impl RouterItem {
    fn matches(&self, path: &str) -> bool {
        if self.prefix == ROOT { path == ROOT } else { path.starts_with(&self.prefix) }
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `prefix`, replacing any handler already
    /// registered under exactly the same prefix.
    pub fn register<H>(&mut self, prefix: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        let prefix = prefix.into();
        let handler: Arc<dyn Handler> = Arc::new(handler);

        match self.items.iter_mut().find(|item| item.prefix == prefix) {
            Some(item) => item.handler = handler,
            None => {
                self.items.push(RouterItem { prefix, handler });
                // stable, equal lengths keep registration order
                self.items.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
            }
        }
        self
    }

    /// Builder flavour of [`Router::register`].
    pub fn route<H>(mut self, prefix: impl Into<String>, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        self.register(prefix, handler);
        self
    }

    /// Finds the handler with the longest matching prefix.
    pub fn resolve(&self, path: &str) -> Option<&Arc<dyn Handler>> {
        self.items.iter().find(|item| item.matches(path)).map(|item| &item.handler)
    }

    /// Registered prefixes in resolution order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.prefix.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("prefixes", &self.prefixes().collect::<Vec<_>>()).finish()
    }
}
