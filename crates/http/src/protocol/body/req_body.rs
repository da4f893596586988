use std::fmt;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};

/// The request body: a byte stream positioned right after the header block.
///
/// Bytes the decoder already buffered past the blank line are served first,
/// then reads fall through to the connection itself. The stream is not
/// guaranteed to end, a client may keep the socket open after sending its
/// payload, so read exactly the amount you expect via [`ReqBody::copy_exact`].
pub struct ReqBody {
    inner: Pin<Box<dyn AsyncRead + Send>>,
}

impl ReqBody {
    /// Creates a body from bytes already buffered off the connection followed by the connection reader.
    pub fn new<R>(buffered: Bytes, reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self { inner: Box::pin(Cursor::new(buffered).chain(reader)) }
    }

    /// A body that holds exactly `bytes` and then ends.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self { inner: Box::pin(Cursor::new(bytes.into())) }
    }

    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// Copies exactly `len` bytes of the body into `writer`.
    ///
    /// # Errors
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] when the body ends before
    /// `len` bytes were read, or with any error from either side of the copy.
    pub async fn copy_exact<W>(&mut self, len: u64, writer: &mut W) -> io::Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut limited = (&mut self.inner).take(len);
        let copied = tokio::io::copy(&mut limited, writer).await?;
        if copied < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("request body ended after {copied} of {len} bytes"),
            ));
        }
        Ok(copied)
    }
}

impl AsyncRead for ReqBody {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        self.get_mut().inner.as_mut().poll_read(cx, buf)
    }
}

impl fmt::Debug for ReqBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqBody").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn buffered_bytes_come_before_the_reader() {
        let (mut client, server) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut client, b"def").await.unwrap();

        let mut body = ReqBody::new(Bytes::from_static(b"abc"), server);
        let mut out = Vec::new();
        let copied = body.copy_exact(5, &mut out).await.unwrap();

        assert_eq!(copied, 5);
        assert_eq!(out, b"abcde");
    }

    #[tokio::test]
    async fn copy_exact_does_not_wait_for_eof() {
        // the client half stays open: reading past the declared length would hang
        let (mut client, server) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut client, b"abc").await.unwrap();

        let mut body = ReqBody::new(Bytes::new(), server);
        let mut out = Vec::new();
        body.copy_exact(3, &mut out).await.unwrap();

        assert_eq!(out, b"abc");
        drop(client);
    }

    #[tokio::test]
    async fn short_body_is_unexpected_eof() {
        let mut body = ReqBody::from_bytes("ab");
        let mut out = Vec::new();
        let err = body.copy_exact(3, &mut out).await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
