use std::any::Any;
use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{FutureExt, SinkExt, StreamExt};
use http::header::CONNECTION;
use http::HeaderValue;
use http_body_util::BodyExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, warn};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::body::{ReqBody, ResponseBody};
use crate::protocol::{HttpError, Message, ParseError, PayloadItem, RequestHeader, Response, ResponseHead, SendError};

const CONNECTION_CLOSE: HeaderValue = HeaderValue::from_static("close");

/// An HTTP connection that serves exactly one request and then closes.
///
/// The exchange walks these states in order:
///
/// 1. **ReadingRequestLine / ReadingHeaders**: decode the head. A parse error,
///    an I/O error or a peer that closes without sending anything ends the
///    connection with no response, there is nobody to address it to yet.
/// 2. **Invoking**: hand the [`Request`](crate::protocol::Request) to the
///    handler. Bytes read past the header block become the front of the
///    request body. The first body frame is pulled before anything is
///    queued. If the handler fails or panics, or its body fails on that first
///    frame, nothing has been written yet, so a best-effort `500` is sent.
/// 3. **WritingResponse**: write the head, then stream the body frame by
///    frame. A failure here cannot be recovered since the client may hold a
///    partial response; it is returned as a [`SendError`].
///
/// The response body is released once the writer is done with it, or dropped
/// (which frees it as well) on any failure.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    io_timeout: Option<Duration>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            io_timeout: None,
        }
    }

    /// Sets a deadline applied to reading the request head and to every write.
    pub fn with_io_timeout(mut self, io_timeout: Option<Duration>) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        let header = match timed(self.io_timeout, self.framed_read.next()).await {
            Ok(Some(Ok(header))) => header,
            Ok(Some(Err(e))) => {
                warn!(cause = %e, "can't parse request head, close connection");
                return Err(e.into());
            }
            Ok(None) => {
                debug!("connection closed before sending a request");
                return Err(ParseError::ConnectionClosed.into());
            }
            Err(e) => {
                warn!(cause = %e, "timed out reading request head");
                return Err(ParseError::io(e).into());
            }
        };

        let Self { framed_read, mut framed_write, io_timeout } = self;
        let prepared = match invoke(handler, header, framed_read).await {
            Some(response) => match prepare(response).await {
                Ok(prepared) => Some(prepared),
                Err(e) => {
                    error!(cause = %e, "response body failed before anything was written, respond with 500");
                    None
                }
            },
            None => None,
        };

        match prepared {
            Some(prepared) => do_send_response(&mut framed_write, io_timeout, prepared).await,
            None => {
                let (head, _) = Response::internal_error().into_parts();
                let error_response = Prepared { head, body: None };
                do_send_response(&mut framed_write, io_timeout, error_response).await.inspect_err(|e| {
                    error!(cause = %e, "failed to send 500 response");
                })
            }
        }
    }
}

/// Runs the handler; failures and panics are logged here and reported as `None`.
async fn invoke<H, R>(handler: Arc<H>, header: RequestHeader, framed_read: FramedRead<R, RequestDecoder>) -> Option<Response>
where
    H: Handler + ?Sized,
    R: AsyncRead + Send + Unpin + 'static,
{
    let method = header.method().clone();
    let path = header.path().to_owned();

    let parts = framed_read.into_parts();
    let request = header.body(ReqBody::new(parts.read_buf.freeze(), parts.io));

    match AssertUnwindSafe(handler.call(request)).catch_unwind().await {
        Ok(Ok(response)) => Some(response),
        Ok(Err(e)) => {
            error!(%method, %path, cause = %e, "handle request error, respond with 500");
            None
        }
        Err(panic) => {
            error!(%method, %path, cause = panic_message(&*panic), "handler panicked, respond with 500");
            None
        }
    }
}

/// A response whose body, if any, has yielded its first frame.
struct Prepared {
    head: ResponseHead,
    body: Option<(Option<Bytes>, ResponseBody)>,
}

/// Pulls the first body frame while a failure can still be answered with a `500`.
///
/// On error the body is dropped, which frees it.
async fn prepare(response: Response) -> io::Result<Prepared> {
    let (head, body) = response.into_parts();
    let Some(mut body) = body else {
        return Ok(Prepared { head, body: None });
    };

    let first = match body.frame().await {
        Some(Ok(frame)) => frame.into_data().ok(),
        Some(Err(e)) => return Err(e),
        None => None,
    };
    Ok(Prepared { head, body: Some((first, body)) })
}

async fn do_send_response<W>(framed_write: &mut FramedWrite<W, ResponseEncoder>, io_timeout: Option<Duration>, prepared: Prepared) -> Result<(), HttpError>
where
    W: AsyncWrite + Unpin,
{
    let Prepared { mut head, body } = prepared;
    if !head.headers().contains_key(CONNECTION) {
        head.headers_mut().insert(CONNECTION, CONNECTION_CLOSE);
    }

    let header = Message::<ResponseHead, Bytes>::Header(head);
    let Some((first, mut body)) = body else {
        // using send instead of feed, the head is all there is and must reach the peer
        send_timed(io_timeout, framed_write.send(header)).await?;
        return Ok(());
    };

    // a failure below drops the body, which frees it just like release does
    send_timed(io_timeout, framed_write.feed(header)).await?;
    if let Some(data) = first {
        send_timed(io_timeout, framed_write.send(Message::<ResponseHead, Bytes>::Payload(PayloadItem::Chunk(data)))).await?;
    }
    send_body(framed_write, io_timeout, &mut body).await?;

    if let Err(e) = body.release() {
        warn!(cause = %e, "failed to release response body");
    }
    Ok(())
}

async fn send_body<W>(framed_write: &mut FramedWrite<W, ResponseEncoder>, io_timeout: Option<Duration>, body: &mut ResponseBody) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| SendError::invalid_body(format!("resolve response body error: {e}")))?;
        if let Ok(data) = frame.into_data() {
            send_timed(io_timeout, framed_write.send(Message::<ResponseHead, Bytes>::Payload(PayloadItem::Chunk(data)))).await?;
        }
    }

    send_timed(io_timeout, framed_write.feed(Message::<ResponseHead, Bytes>::Payload(PayloadItem::Eof))).await?;
    send_timed(io_timeout, SinkExt::<Message<ResponseHead, Bytes>>::flush(framed_write)).await
}

async fn send_timed<F>(io_timeout: Option<Duration>, fut: F) -> Result<(), SendError>
where
    F: Future<Output = Result<(), SendError>>,
{
    timed(io_timeout, fut).await.map_err(SendError::io)?
}

async fn timed<F: Future>(io_timeout: Option<Duration>, fut: F) -> io::Result<F::Output> {
    match io_timeout {
        Some(duration) => tokio::time::timeout(duration, fut)
            .await
            .map_err(|_elapsed| io::Error::new(io::ErrorKind::TimedOut, format!("no progress within {duration:?}"))),
        None => Ok(fut.await),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
