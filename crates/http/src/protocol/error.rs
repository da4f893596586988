use std::error::Error;
use std::io;
use thiserror::Error;

/// The error type handlers return, anything that can be boxed and sent across tasks.
pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed request line: '{line}'")]
    MalformedRequestLine { line: String },

    #[error("malformed header line: '{line}'")]
    MalformedHeader { line: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("invalid http method: '{method}'")]
    InvalidMethod { method: String },

    #[error("invalid request path: '{path}'")]
    InvalidPath { path: String },

    #[error("truncated headers")]
    TruncatedHeaders,

    #[error("connection closed before a request line was received")]
    ConnectionClosed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed_request_line<S: ToString>(line: S) -> Self {
        Self::MalformedRequestLine { line: line.to_string() }
    }

    pub fn malformed_header<S: ToString>(line: S) -> Self {
        Self::MalformedHeader { line: line.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn invalid_method<S: ToString>(method: S) -> Self {
        Self::InvalidMethod { method: method.to_string() }
    }

    pub fn invalid_path<S: ToString>(path: S) -> Self {
        Self::InvalidPath { path: path.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
