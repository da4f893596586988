//! HTTP connection handling module
//!
//! [`HttpConnection`] runs the per-connection protocol: decode one request
//! head, invoke the handler, stream the response back and release its body.
//! There is no keep-alive: each connection carries exactly one exchange.

mod http_connection;

pub use http_connection::HttpConnection;
