//! Request handler traits and utilities.
//!
//! A [`Handler`] turns a [`Request`] into a [`Response`] or an error. Handlers
//! are object safe so they can be stored as `Arc<dyn Handler>` in a routing
//! table and wrapped by middleware at runtime.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::protocol::{BoxError, Request, Response};

#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, req: Request) -> Result<Response, BoxError>;
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn call(&self, req: Request) -> Result<Response, BoxError> {
        (**self).call(req).await
    }
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Box<H> {
    async fn call(&self, req: Request) -> Result<Response, BoxError> {
        (**self).call(req).await
    }
}

/// A [`Handler`] backed by an async function or closure.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<Err, F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Err: Into<BoxError>,
    Fut: Future<Output = Result<Response, Err>> + Send,
{
    async fn call(&self, req: Request) -> Result<Response, BoxError> {
        (self.f)(req).await.map_err(Into::into)
    }
}

pub fn make_handler<F, Err, Ret>(f: F) -> HandlerFn<F>
where
    Err: Into<BoxError>,
    Ret: Future<Output = Result<Response, Err>>,
    F: Fn(Request) -> Ret,
{
    HandlerFn { f }
}
