//! HTTP request handling implementation.
//!
//! A request is decoded in two pieces: the [`RequestHeader`] (request line plus
//! header block) produced by the codec, and the [`ReqBody`] which is whatever
//! remains on the connection once the header block has been consumed.

use http::header::AsHeaderName;
use http::{HeaderMap, Method};

use crate::protocol::body::ReqBody;

/// The first line of a request, e.g. `GET /index.html HTTP/1.1`.
///
/// The method is kept as sent (it is not normalized), the path always starts
/// with `/`, and the protocol version is an opaque token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: Method,
    path: String,
    version: String,
}

impl RequestLine {
    pub fn new(method: Method, path: impl Into<String>, version: impl Into<String>) -> Self {
        Self { method, path: path.into(), version: version.into() }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Represents an HTTP request header: the request line and the header block.
///
/// Header names are lower case, a repeated header keeps its last value.
#[derive(Debug, Clone)]
pub struct RequestHeader {
    line: RequestLine,
    headers: HeaderMap,
}

impl RequestHeader {
    pub fn new(line: RequestLine, headers: HeaderMap) -> Self {
        Self { line, headers }
    }

    /// Attaches a body to this header, converting it into a full [`Request`].
    pub fn body(self, body: ReqBody) -> Request {
        Request { header: self, body }
    }

    pub fn method(&self) -> &Method {
        self.line.method()
    }

    pub fn path(&self) -> &str {
        self.line.path()
    }

    pub fn version(&self) -> &str {
        self.line.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// A parsed request owned by the connection worker for the lifetime of one exchange.
///
/// The body is positioned right after the header block. It is not guaranteed
/// to reach EOF, so consumers read exactly as many bytes as they expect
/// (usually what `content-length` declares).
#[derive(Debug)]
pub struct Request {
    header: RequestHeader,
    body: ReqBody,
}

impl Request {
    pub fn header(&self) -> &RequestHeader {
        &self.header
    }

    pub fn method(&self) -> &Method {
        self.header.method()
    }

    pub fn path(&self) -> &str {
        self.header.path()
    }

    pub fn version(&self) -> &str {
        self.header.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.header.headers()
    }

    /// Returns the value of a header as a string slice.
    ///
    /// Values that are not visible ASCII are treated as absent.
    pub fn header_str<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.header.headers().get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body_mut(&mut self) -> &mut ReqBody {
        &mut self.body
    }
}
