//! A prefix-routed HTTP server with gzip compression, built on `spool-http`.
//!
//! Handlers are registered in a [`Router`] under path prefixes and wrapped
//! by [`Middleware`] such as [`GzipMiddleware`]. The [`Server`] accepts TCP
//! connections and serves one request on each.
//!
//! # Example
//!
//! ```no_run
//! use spool_web::encoding::GzipMiddleware;
//! use spool_web::{endpoint, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     Server::builder()
//!         .address("127.0.0.1:4221")
//!         .router(endpoint::router("/tmp"))
//!         .wrap(GzipMiddleware::new())
//!         .build()?
//!         .start()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod encoding;
pub mod endpoint;
pub mod router;
pub mod server;
pub mod wrapper;

pub use encoding::GzipMiddleware;
pub use router::Router;
pub use server::{Server, ServerBuilder, ServerError};
pub use wrapper::{Middleware, Middlewares};
