use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderValue, Method};
use spool_http::handler::Handler;
use spool_http::protocol::body::ResponseBody;
use spool_http::protocol::{BoxError, Request, Response};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{EndpointError, path_arg};

/// Serves files from a directory on `GET` and stores them on `POST`.
///
/// The name is the path argument after `/files/`. It may contain
/// subdirectories but must stay inside the directory: names with `..`, a
/// root, or a drive prefix are rejected. Any method other than `POST` is
/// served as a `GET`.
#[derive(Debug, Clone)]
pub struct FilesEndpoint {
    directory: PathBuf,
}

impl FilesEndpoint {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        relative.components().all(|c| matches!(c, Component::Normal(_))).then(|| self.directory.join(relative))
    }

    async fn download(&self, name: &str) -> Result<Response, EndpointError> {
        let Some(path) = self.resolve(name) else {
            debug!(name, "rejected file name, respond with 404");
            return Ok(Response::not_found());
        };

        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "file not found");
                return Ok(Response::not_found());
            }
            Err(e) => return Err(EndpointError::io(path, e)),
        };

        let metadata = file.metadata().await.map_err(|e| EndpointError::io(&path, e))?;
        if !metadata.is_file() {
            debug!(path = %path.display(), "not a regular file");
            return Ok(Response::not_found());
        }

        let len = metadata.len();
        Ok(Response::ok()
            .header(CONTENT_TYPE, HeaderValue::from_str(mime::APPLICATION_OCTET_STREAM.as_ref())?)
            .header(CONTENT_LENGTH, HeaderValue::from(len))
            .body(ResponseBody::stream(file, Some(len))))
    }

    async fn upload(&self, name: &str, mut req: Request) -> Result<Response, EndpointError> {
        let path = self.resolve(name).ok_or_else(|| EndpointError::InvalidFileName { name: name.to_owned() })?;
        let len = content_length(&req)?;

        let mut file = File::create(&path).await.map_err(|e| EndpointError::io(&path, e))?;
        let written = async {
            req.body_mut().copy_exact(len, &mut file).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(remove) = fs::remove_file(&path).await {
                warn!(path = %path.display(), cause = %remove, "failed to remove partial upload");
            }
            return Err(EndpointError::io(path, e));
        }

        debug!(path = %path.display(), len, "stored upload");
        Ok(Response::created())
    }
}

#[async_trait]
impl Handler for FilesEndpoint {
    async fn call(&self, req: Request) -> Result<Response, BoxError> {
        let name = path_arg(req.path())?.to_owned();
        let response = if req.method() == Method::POST {
            self.upload(&name, req).await?
        } else {
            self.download(&name).await?
        };
        Ok(response)
    }
}

fn content_length(req: &Request) -> Result<u64, EndpointError> {
    let value = req.header_str(CONTENT_LENGTH).ok_or(EndpointError::MissingContentLength)?;
    value.trim().parse().map_err(|source| EndpointError::InvalidContentLength { value: value.to_owned(), source })
}
