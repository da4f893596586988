use std::io::{self, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use spool_http::protocol::body::BodyStream;
use tempfile::{Builder, TempPath};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWriteExt, ReadBuf};

const SPOOL_PREFIX: &str = "spool-gzip-";

/// A temporary file holding a compressed body.
///
/// It is written once, rewound, then read back as a response body. The file
/// is deleted by [`BodyStream::release`], or on drop if it is never released.
#[derive(Debug)]
pub(crate) struct SpooledBody {
    file: File,
    path: TempPath,
}

impl SpooledBody {
    pub(crate) async fn create(dir: &Path) -> io::Result<Self> {
        let dir = dir.to_path_buf();
        let temp = tokio::task::spawn_blocking(move || Builder::new().prefix(SPOOL_PREFIX).tempfile_in(dir))
            .await
            .map_err(io::Error::other)??;

        let (file, path) = temp.into_parts();
        Ok(Self { file: File::from_std(file), path })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data).await
    }

    /// Flushes pending writes and seeks back to the start, returning the file size.
    pub(crate) async fn rewind(&mut self) -> io::Result<u64> {
        self.file.flush().await?;
        let len = self.file.metadata().await?.len();
        self.file.seek(SeekFrom::Start(0)).await?;
        Ok(len)
    }
}

impl AsyncRead for SpooledBody {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_read(cx, buf)
    }
}

impl BodyStream for SpooledBody {
    fn release(self: Box<Self>) -> io::Result<()> {
        let Self { file, path } = *self;
        drop(file);
        path.close()
    }
}
