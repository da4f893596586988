use std::fmt;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};
use tokio::io::AsyncRead;
use tokio_util::io::poll_read_buf;

/// Read size used when pulling frames out of a [`BodyStream`].
const CHUNK_SIZE: usize = 8 * 1024;

/// A readable byte source with an explicit release step.
///
/// `release` closes the source and frees whatever backs it, reporting any
/// failure to do so. Dropping a stream without releasing it must free the
/// same resources, silently.
pub trait BodyStream: AsyncRead + Send + Unpin {
    fn release(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl BodyStream for tokio::fs::File {}

impl BodyStream for Cursor<Bytes> {}

/// The body of a response, either a single in-memory chunk or a stream.
///
/// It is read at most once. After the last frame, call [`ResponseBody::release`]
/// to close the underlying stream; dropping the body has the same effect on
/// paths that cannot report errors.
pub struct ResponseBody {
    kind: Kind,
}

enum Kind {
    Once(Option<Bytes>),
    Stream { reader: Box<dyn BodyStream>, len: Option<u64>, buf: BytesMut, eof: bool },
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self { kind: Kind::Once(None) }
    }

    pub fn once(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Self::empty();
        }
        Self { kind: Kind::Once(Some(bytes)) }
    }

    /// Wraps a stream; `len` is the exact number of bytes it yields, if known.
    pub fn stream<S>(reader: S, len: Option<u64>) -> Self
    where
        S: BodyStream + 'static,
    {
        Self { kind: Kind::Stream { reader: Box::new(reader), len, buf: BytesMut::new(), eof: false } }
    }

    /// Closes the underlying stream, returning any error from freeing its resources.
    pub fn release(self) -> io::Result<()> {
        match self.kind {
            Kind::Once(_) => Ok(()),
            Kind::Stream { reader, .. } => reader.release(),
        }
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            Kind::Once(bytes) => Poll::Ready(bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            Kind::Stream { reader, buf, eof, .. } => {
                if *eof {
                    return Poll::Ready(None);
                }

                buf.reserve(CHUNK_SIZE);
                match ready!(poll_read_buf(Pin::new(reader), cx, buf)) {
                    Ok(0) => {
                        *eof = true;
                        Poll::Ready(None)
                    }
                    Ok(_) => Poll::Ready(Some(Ok(Frame::data(buf.split().freeze())))),
                    Err(e) => Poll::Ready(Some(Err(e))),
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Once(bytes) => bytes.is_none(),
            Kind::Stream { eof, .. } => *eof,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Once(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Once(None) => SizeHint::with_exact(0),
            Kind::Stream { len: Some(len), .. } => SizeHint::with_exact(*len),
            Kind::Stream { len: None, .. } => SizeHint::default(),
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Once(bytes) => f.debug_tuple("ResponseBody::Once").field(bytes).finish(),
            Kind::Stream { len, .. } => f.debug_struct("ResponseBody::Stream").field("len", len).finish_non_exhaustive(),
        }
    }
}
