//! A minimal asynchronous HTTP/1.1 engine: one request per connection.
//!
//! This crate reads a request head off a connection, hands the request to a
//! [`handler::Handler`], and streams the response back, releasing whatever
//! backs the response body once it has been written. It is built on tokio and
//! tokio-util codecs.
//!
//! # Features
//!
//! - Strict line-based request head parsing
//! - Asynchronous I/O using tokio
//! - Streaming response bodies with an explicit release step
//! - Handler failures and panics turned into `500` responses
//! - Optional per-read and per-write deadlines
//!
//! # Example
//!
//! ```no_run
//! use std::error::Error;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//! use spool_http::connection::HttpConnection;
//! use spool_http::handler::make_handler;
//! use spool_http::protocol::{Request, Response};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer);
//!             match connection.process(handler).await {
//!                 Ok(_) => info!("finished process, connection shutdown"),
//!                 Err(e) => error!("service has error, cause {}, connection shutdown", e),
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request) -> Result<Response, Box<dyn Error + Send + Sync>> {
//!     info!("request path {}", request.path());
//!     Ok(Response::text("Hello World!\r\n"))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: the per-connection state machine
//! - [`protocol`]: request, response and body types, and errors
//! - [`codec`]: request head decoding and response encoding
//! - [`handler`]: the handler trait and function adaptor
//!
//! # Limitations
//!
//! - HTTP/1.1 only, no keep-alive: the connection closes after one response
//! - No TLS and no chunked transfer encoding
//! - Maximum request head size: 8KB

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
