//! The built-in routes.
//!
//! | prefix        | behaviour                                          |
//! |---------------|----------------------------------------------------|
//! | `/`           | `200` with no body                                 |
//! | `/user-agent` | echoes the `user-agent` request header             |
//! | `/echo/`      | echoes the path argument                           |
//! | `/files/`     | serves (`GET`) or stores (`POST`) a file by name   |

mod files;

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use bytes::Bytes;
use http::header::{InvalidHeaderValue, USER_AGENT};
use spool_http::handler::make_handler;
use spool_http::protocol::{Request, Response};
use thiserror::Error;

use crate::router::Router;

pub use files::FilesEndpoint;

#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("'{path}' does not contain a path argument")]
    MissingPathArg { path: String },

    #[error("no 'content-length' header in request")]
    MissingContentLength,

    #[error("invalid 'content-length' header '{value}': {source}")]
    InvalidContentLength { value: String, source: ParseIntError },

    #[error("invalid file name: {name}")]
    InvalidFileName { name: String },

    #[error("invalid header value: {source}")]
    InvalidHeader {
        #[from]
        source: InvalidHeaderValue,
    },

    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl EndpointError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// A router with every built-in route, serving files out of `directory`.
pub fn router(directory: impl Into<PathBuf>) -> Router {
    Router::new()
        .route("/", make_handler(root))
        .route("/user-agent", make_handler(user_agent))
        .route("/echo/", make_handler(echo))
        .route("/files/", FilesEndpoint::new(directory))
}

pub async fn root(_req: Request) -> Result<Response, EndpointError> {
    Ok(Response::ok())
}

/// Responds with the `user-agent` header, or an empty body when there is none.
///
/// The value is echoed byte for byte, including bytes outside visible ASCII.
pub async fn user_agent(req: Request) -> Result<Response, EndpointError> {
    let agent = req.headers().get(USER_AGENT).map(|value| Bytes::copy_from_slice(value.as_bytes()));
    Ok(Response::text(agent.unwrap_or_default()))
}

pub async fn echo(req: Request) -> Result<Response, EndpointError> {
    let arg = path_arg(req.path())?.to_owned();
    Ok(Response::text(arg))
}

/// Returns everything after the first path segment.
///
/// `/echo/a/b` yields `a/b`. A path with a single segment, or an empty
/// remainder as in `/echo/`, has no argument.
pub fn path_arg(path: &str) -> Result<&str, EndpointError> {
    match path.trim_start_matches('/').split_once('/') {
        Some((_, arg)) if !arg.is_empty() => Ok(arg),
        _ => Err(EndpointError::MissingPathArg { path: path.to_owned() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
    use http::{HeaderMap, HeaderValue, Method, StatusCode};
    use http_body_util::BodyExt;
    use spool_http::protocol::body::ReqBody;
    use spool_http::protocol::{RequestHeader, RequestLine};

    fn request(path: &str, headers: HeaderMap) -> Request {
        RequestHeader::new(RequestLine::new(Method::GET, path, "HTTP/1.1"), headers).body(ReqBody::empty())
    }

    async fn body_string(response: Response) -> String {
        let (_, body) = response.into_parts();
        match body {
            Some(body) => String::from_utf8(body.collect().await.unwrap().to_bytes().to_vec()).unwrap(),
            None => String::new(),
        }
    }

    #[test]
    fn path_args() {
        assert_eq!(path_arg("/echo/hello").unwrap(), "hello");
        assert_eq!(path_arg("/echo/a/b").unwrap(), "a/b");
        assert_eq!(path_arg("//files/x.txt").unwrap(), "x.txt");
        assert!(matches!(path_arg("/echo"), Err(EndpointError::MissingPathArg { .. })));
        assert!(matches!(path_arg("/echo/"), Err(EndpointError::MissingPathArg { .. })));
        assert!(path_arg("/").is_err());
    }

    #[tokio::test]
    async fn root_is_empty_ok() {
        let response = root(request("/", HeaderMap::new())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.has_body());
    }

    #[tokio::test]
    async fn echo_returns_arg() {
        let response = echo(request("/echo/hello", HeaderMap::new())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "5");
        assert_eq!(body_string(response).await, "hello");
    }

    #[tokio::test]
    async fn echo_without_arg_fails() {
        assert!(echo(request("/echo/", HeaderMap::new())).await.is_err());
    }

    #[tokio::test]
    async fn user_agent_echoes_header() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("foo/1.0"));

        let response = user_agent(request("/user-agent", headers)).await.unwrap();
        assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "7");
        assert_eq!(body_string(response).await, "foo/1.0");
    }

    #[tokio::test]
    async fn user_agent_echoes_non_ascii_bytes() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_bytes("café/1.0".as_bytes()).unwrap());

        let response = user_agent(request("/user-agent", headers)).await.unwrap();
        assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "9");
        assert_eq!(body_string(response).await, "café/1.0");
    }

    #[tokio::test]
    async fn user_agent_missing_is_empty() {
        let response = user_agent(request("/user-agent", HeaderMap::new())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "0");
        assert_eq!(body_string(response).await, "");
    }

    #[test]
    fn router_has_builtin_routes() {
        let router = router(".");
        assert_eq!(router.prefixes().collect::<Vec<_>>(), vec!["/user-agent", "/files/", "/echo/", "/"]);
    }
}
