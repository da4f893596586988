//! The listening server.
//!
//! A [`Server`] owns the routing table and the middleware chain, and is itself
//! the [`Handler`] every connection is processed with: it resolves the request
//! path, wraps the matched handler with the middleware chain and invokes it.
//! A path no prefix matches gets a bare `404` without running any middleware.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use spool_http::connection::HttpConnection;
use spool_http::handler::Handler;
use spool_http::protocol::{BoxError, HttpError, ParseError, Request, Response};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::select;
use tracing::{debug, error, info, warn};

use crate::router::Router;
use crate::wrapper::{Middleware, Middlewares};

/// Pause after a failed accept, so a persistent error such as fd exhaustion
/// does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("address must be set")]
    MissingAddress,

    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: std::io::Error },
}

#[derive(Debug, Default)]
pub struct ServerBuilder {
    router: Option<Router>,
    address: Option<String>,
    middlewares: Middlewares,
    io_timeout: Option<Duration>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// The address to listen on, e.g. `localhost:4221`.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Adds a middleware around every routed handler. The first one added is
    /// the innermost.
    pub fn wrap(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Deadline for reading the request head and for each write.
    pub fn io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = Some(io_timeout);
        self
    }

    pub fn build(self) -> Result<Server, ServerError> {
        let address = self.address.ok_or(ServerError::MissingAddress)?;
        Ok(Server {
            router: self.router.unwrap_or_default(),
            address,
            middlewares: self.middlewares,
            io_timeout: self.io_timeout,
        })
    }
}

#[derive(Debug)]
pub struct Server {
    router: Router,
    address: String,
    middlewares: Middlewares,
    io_timeout: Option<Duration>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Binds the configured address and serves until the process ends.
    pub async fn start(self) -> Result<(), ServerError> {
        self.start_until(std::future::pending()).await
    }

    /// Binds the configured address and serves until `shutdown` completes.
    pub async fn start_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let tcp_listener = TcpListener::bind(self.address.as_str())
            .await
            .map_err(|source| ServerError::Bind { address: self.address.clone(), source })?;

        info!(address = %self.address, "start listening");
        self.serve(tcp_listener, shutdown).await;
        Ok(())
    }

    /// Accepts connections on `tcp_listener` until `shutdown` completes.
    ///
    /// Every connection is processed on its own task; connections already
    /// accepted keep running after the loop stops.
    pub async fn serve<F>(self, tcp_listener: TcpListener, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let handler = Arc::new(self);
        tokio::pin!(shutdown);

        loop {
            let (tcp_stream, remote_addr) = select! {
                biased;
                () = &mut shutdown => {
                    info!("shutdown requested, stop accepting");
                    return;
                }
                accepted = tcp_listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        warn!(cause = %e, "failed to accept, retry after {ACCEPT_BACKOFF:?}");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
            };

            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                match AssertUnwindSafe(serve_connection(tcp_stream, handler)).catch_unwind().await {
                    Ok(Ok(())) => debug!(%remote_addr, "finished process, connection shutdown"),
                    Ok(Err(HttpError::RequestError { source: ParseError::ConnectionClosed })) => {
                        debug!(%remote_addr, "connection closed without a request")
                    }
                    Ok(Err(e)) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
                    Err(_) => error!(%remote_addr, "connection task panicked, connection shutdown"),
                }
            });
        }
    }
}

async fn serve_connection(tcp_stream: TcpStream, handler: Arc<Server>) -> Result<(), HttpError> {
    let io_timeout = handler.io_timeout;
    let (reader, writer) = tcp_stream.into_split();
    HttpConnection::new(reader, writer).with_io_timeout(io_timeout).process(handler).await
}

#[async_trait]
impl Handler for Server {
    async fn call(&self, req: Request) -> Result<Response, BoxError> {
        let Some(handler) = self.router.resolve(req.path()) else {
            debug!(path = req.path(), "no route matched, respond with 404");
            return Ok(Response::not_found());
        };

        let handler = self.middlewares.wrap(Arc::clone(handler));
        handler.call(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::GzipMiddleware;
    use crate::endpoint;
    use flate2::read::GzDecoder;
    use indoc::indoc;
    use std::collections::HashMap;
    use std::io::Read;
    use std::net::SocketAddr;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    struct TestServer {
        addr: SocketAddr,
        files: TempDir,
        spool: TempDir,
        stop: Option<oneshot::Sender<()>>,
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(stop) = self.stop.take() {
                let _ = stop.send(());
            }
        }
    }

    async fn spawn_server() -> TestServer {
        let files = tempfile::tempdir().unwrap();
        let spool = tempfile::tempdir().unwrap();

        let server = Server::builder()
            .address("127.0.0.1:0")
            .router(endpoint::router(files.path()))
            .wrap(GzipMiddleware::with_spool_dir(spool.path()))
            .io_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        tokio::spawn(server.serve(listener, async move {
            let _ = stopped.await;
        }));

        TestServer { addr, files, spool, stop: Some(stop) }
    }

    struct RawResponse {
        status_line: String,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    }

    async fn exchange(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request).await.unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        received
    }

    async fn send(addr: SocketAddr, request: &str) -> RawResponse {
        parse(&exchange(addr, request.as_bytes()).await)
    }

    fn parse(raw: &[u8]) -> RawResponse {
        let split = raw.windows(4).position(|w| w == b"\r\n\r\n").expect("response has no head terminator");
        let head = std::str::from_utf8(&raw[..split]).unwrap();
        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap().to_owned();
        let headers = lines
            .map(|line| {
                let (name, value) = line.split_once(": ").unwrap();
                (name.to_owned(), value.to_owned())
            })
            .collect();
        RawResponse { status_line, headers, body: raw[split + 4..].to_vec() }
    }

    #[tokio::test]
    async fn root_is_ok() {
        let server = spawn_server().await;
        let response = send(server.addr, "GET / HTTP/1.1\r\n\r\n").await;

        assert_eq!(response.status_line, "HTTP/1.1 200 OK");
        assert_eq!(response.headers["connection"], "close");
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn echo() {
        let server = spawn_server().await;
        let response = send(server.addr, "GET /echo/hello HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

        assert_eq!(response.status_line, "HTTP/1.1 200 OK");
        assert_eq!(response.headers["content-type"], "text/plain");
        assert_eq!(response.headers["content-length"], "5");
        assert_eq!(response.body, b"hello");
    }

    #[tokio::test]
    async fn user_agent() {
        let server = spawn_server().await;
        let request = indoc! {"
            GET /user-agent HTTP/1.1\r
            Host: localhost\r
            User-Agent: foo/1.0\r
            \r
        "};
        let response = send(server.addr, request).await;

        assert_eq!(response.status_line, "HTTP/1.1 200 OK");
        assert_eq!(response.body, b"foo/1.0");
    }

    #[tokio::test]
    async fn user_agent_non_ascii() {
        let server = spawn_server().await;
        let response = send(server.addr, "GET /user-agent HTTP/1.1\r\nUser-Agent: café/1.0\r\n\r\n").await;

        assert_eq!(response.status_line, "HTTP/1.1 200 OK");
        assert_eq!(response.headers["content-length"], "9");
        assert_eq!(response.body, "café/1.0".as_bytes());
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let server = spawn_server().await;
        let response = send(server.addr, "GET /files/missing.txt HTTP/1.1\r\n\r\n").await;

        assert_eq!(response.status_line, "HTTP/1.1 404 Not Found");
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn upload_then_download() {
        let server = spawn_server().await;
        let response = send(server.addr, "POST /files/new.txt HTTP/1.1\r\ncontent-length: 3\r\n\r\nabc").await;
        assert_eq!(response.status_line, "HTTP/1.1 201 Created");
        assert_eq!(std::fs::read(server.files.path().join("new.txt")).unwrap(), b"abc");

        let response = send(server.addr, "GET /files/new.txt HTTP/1.1\r\n\r\n").await;
        assert_eq!(response.status_line, "HTTP/1.1 200 OK");
        assert_eq!(response.headers["content-type"], "application/octet-stream");
        assert_eq!(response.body, b"abc");
    }

    #[tokio::test]
    async fn upload_without_content_length_is_500() {
        let server = spawn_server().await;
        let response = send(server.addr, "POST /files/new.txt HTTP/1.1\r\n\r\n").await;

        assert_eq!(response.status_line, "HTTP/1.1 500 Internal Server Error");
        assert!(!server.files.path().join("new.txt").exists());
    }

    #[tokio::test]
    async fn gzip_echo() {
        let server = spawn_server().await;
        let response = send(server.addr, "GET /echo/zzz HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n").await;

        assert_eq!(response.status_line, "HTTP/1.1 200 OK");
        assert_eq!(response.headers["content-encoding"], "gzip");
        assert_eq!(response.headers["content-length"], response.body.len().to_string());
        assert_ne!(response.body.len(), 3);

        let mut decoded = String::new();
        GzDecoder::new(&response.body[..]).read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, "zzz");
        assert_eq!(std::fs::read_dir(server.spool.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unknown_paths_are_404() {
        let server = spawn_server().await;
        for path in ["/x", "/echo", "/unknown/path"] {
            let response = send(server.addr, &format!("GET {path} HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n")).await;
            assert_eq!(response.status_line, "HTTP/1.1 404 Not Found", "path {path}");
            assert!(!response.headers.contains_key("content-encoding"));
        }
    }

    #[tokio::test]
    async fn echo_without_arg_is_500() {
        let server = spawn_server().await;
        let response = send(server.addr, "GET /echo/ HTTP/1.1\r\n\r\n").await;
        assert_eq!(response.status_line, "HTTP/1.1 500 Internal Server Error");
    }

    #[tokio::test]
    async fn malformed_request_gets_no_response() {
        let server = spawn_server().await;
        assert!(exchange(server.addr, b"GARBAGE\r\n\r\n").await.is_empty());
        assert!(exchange(server.addr, b"GET / HTTP/1.1\r\nno-colon-here\r\n\r\n").await.is_empty());
    }

    #[tokio::test]
    async fn idle_connection_does_not_block_others() {
        let server = spawn_server().await;
        let _idle = TcpStream::connect(server.addr).await.unwrap();

        let response = send(server.addr, "GET /echo/still-serving HTTP/1.1\r\n\r\n").await;
        assert_eq!(response.body, b"still-serving");
    }

    #[tokio::test]
    async fn shutdown_stops_accepting() {
        let server = Server::builder().address("127.0.0.1:0").build().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let (stop, stopped) = oneshot::channel::<()>();
        let serving = tokio::spawn(server.serve(listener, async move {
            let _ = stopped.await;
        }));

        stop.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), serving).await.unwrap().unwrap();
    }

    #[test]
    fn build_requires_address() {
        assert!(matches!(Server::builder().build(), Err(ServerError::MissingAddress)));
    }

    #[tokio::test]
    async fn start_reports_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = taken.local_addr().unwrap().to_string();

        let server = Server::builder().address(address).build().unwrap();
        assert!(matches!(server.start().await, Err(ServerError::Bind { .. })));
    }
}
