//! HTTP response types.
//!
//! Every constructor here returns a fresh value with its own header map, so a
//! response built for one request can never leak header mutations into another.

use std::borrow::Cow;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::protocol::body::ResponseBody;

/// The version written when a head does not carry one.
pub const DEFAULT_VERSION: &str = "HTTP/1.1";

const TEXT_PLAIN: HeaderValue = HeaderValue::from_static("text/plain");

/// Status line and headers of a response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    version: Option<String>,
    status: StatusCode,
    reason: Option<Cow<'static, str>>,
    headers: HeaderMap,
}

impl ResponseHead {
    pub fn new(status: StatusCode) -> Self {
        Self { version: None, status, reason: None, headers: HeaderMap::new() }
    }

    /// Returns the protocol version, falling back to `HTTP/1.1` when unset.
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the reason phrase, falling back to the canonical one for the status.
    pub fn reason(&self) -> &str {
        match &self.reason {
            Some(reason) => reason,
            None => self.status.canonical_reason().unwrap_or(""),
        }
    }

    pub fn set_reason(&mut self, reason: impl Into<Cow<'static, str>>) {
        self.reason = Some(reason.into());
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

/// A response head with an optional streaming body.
///
/// Whoever holds the response owns its body and must either stream it out
/// and release it, or drop it; both paths free whatever backs the body.
#[derive(Debug)]
pub struct Response {
    head: ResponseHead,
    body: Option<ResponseBody>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self { head: ResponseHead::new(status), body: None }
    }

    pub fn from_parts(head: ResponseHead, body: Option<ResponseBody>) -> Self {
        Self { head, body }
    }

    /// `200 OK` without a body.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// `201 Created` without a body.
    pub fn created() -> Self {
        Self::new(StatusCode::CREATED)
    }

    /// `404 Not Found` without a body.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// `500 Internal Server Error` without a body.
    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// `200 OK` carrying `body` as `text/plain` with a matching `content-length`.
    pub fn text(body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self::ok()
            .header(CONTENT_TYPE, TEXT_PLAIN)
            .header(CONTENT_LENGTH, HeaderValue::from(body.len()))
            .body(ResponseBody::once(body))
    }

    /// Sets a header, replacing any previous value under the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.head.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: ResponseBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    pub fn head_mut(&mut self) -> &mut ResponseHead {
        &mut self.head
    }

    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn into_parts(self) -> (ResponseHead, Option<ResponseBody>) {
        (self.head, self.body)
    }
}
