use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH};
use http::{HeaderMap, HeaderValue};
use http_body::Body;
use http_body_util::BodyExt;
use spool_http::handler::Handler;
use spool_http::protocol::body::ResponseBody;
use spool_http::protocol::{BoxError, Request, Response};
use thiserror::Error;
use tracing::{trace, warn};

use super::Writer;
use super::spool::SpooledBody;
use crate::wrapper::Middleware;

const GZIP: HeaderValue = HeaderValue::from_static("gzip");

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("failed to create spool file in {}: {source}", .dir.display())]
    Spool { dir: PathBuf, source: io::Error },

    #[error("failed to read response body: {source}")]
    Body { source: io::Error },

    #[error("gzip compression failed: {source}")]
    Compress { source: io::Error },

    #[error("failed to write spool file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Gzip-compresses response bodies when the request accepts it.
///
/// A response is compressed only if the request's `accept-encoding` lists
/// `gzip` and the response carries a non-empty body. The compressed body is
/// written to a temporary file in the spool directory and then streamed from
/// there, with `content-encoding` and `content-length` describing the
/// compressed bytes. Any failure while compressing becomes a handler error.
#[derive(Debug, Clone)]
pub struct GzipMiddleware {
    spool_dir: Arc<Path>,
    level: Compression,
}

impl GzipMiddleware {
    /// Spools into the system temporary directory.
    pub fn new() -> Self {
        Self::with_spool_dir(std::env::temp_dir())
    }

    pub fn with_spool_dir(dir: impl Into<PathBuf>) -> Self {
        let dir: PathBuf = dir.into();
        Self { spool_dir: Arc::from(dir), level: Compression::default() }
    }

    pub fn level(mut self, level: Compression) -> Self {
        self.level = level;
        self
    }
}

impl Default for GzipMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for GzipMiddleware {
    fn wrap(&self, handler: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(GzipHandler { handler, spool_dir: Arc::clone(&self.spool_dir), level: self.level })
    }
}

struct GzipHandler {
    handler: Arc<dyn Handler>,
    spool_dir: Arc<Path>,
    level: Compression,
}

#[async_trait]
impl Handler for GzipHandler {
    async fn call(&self, req: Request) -> Result<Response, BoxError> {
        let accept_gzip = accepts_gzip(req.headers());
        let response = self.handler.call(req).await?;

        let (mut head, body) = response.into_parts();
        let body = match body {
            Some(body) if accept_gzip && body.size_hint().exact() != Some(0) => body,
            body => return Ok(Response::from_parts(head, body)),
        };

        let (spool, len) = compress(body, &self.spool_dir, self.level).await?;
        trace!(path = %spool.path().display(), len, "spooled gzip body");

        head.headers_mut().insert(CONTENT_ENCODING, GZIP);
        head.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(len));
        Ok(Response::from_parts(head, Some(ResponseBody::stream(spool, Some(len)))))
    }
}

/// Whether `accept-encoding` lists `gzip` as one of its comma separated tokens.
fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim() == "gzip")
}

/// Compresses `body` into a new spool file, releasing `body` whatever the outcome.
async fn compress(mut body: ResponseBody, dir: &Path, level: Compression) -> Result<(SpooledBody, u64), EncodeError> {
    let result = spool_gzip(&mut body, dir, level).await;
    if let Err(e) = body.release() {
        warn!(cause = %e, "failed to release uncompressed response body");
    }
    result
}

async fn spool_gzip(body: &mut ResponseBody, dir: &Path, level: Compression) -> Result<(SpooledBody, u64), EncodeError> {
    let mut spool =
        SpooledBody::create(dir).await.map_err(|source| EncodeError::Spool { dir: dir.to_path_buf(), source })?;
    let spool_path = spool.path().to_path_buf();
    let write_error = |source| EncodeError::Write { path: spool_path.clone(), source };

    let mut encoder = GzEncoder::new(Writer::new(), level);
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|source| EncodeError::Body { source })?;
        let Ok(data) = frame.into_data() else {
            continue;
        };

        encoder.write_all(&data).map_err(|source| EncodeError::Compress { source })?;
        let compressed = encoder.get_mut().take();
        if !compressed.is_empty() {
            spool.write_all(&compressed).await.map_err(write_error)?;
        }
    }

    let tail = encoder.finish().map_err(|source| EncodeError::Compress { source })?.take();
    spool.write_all(&tail).await.map_err(write_error)?;
    let len = spool.rewind().await.map_err(write_error)?;
    Ok((spool, len))
}
