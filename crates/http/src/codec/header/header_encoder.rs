//! HTTP response head encoder.
//!
//! Serialization is deterministic: the status line, then every header as
//! `name: value\r\n` in map iteration order, then the blank line. Header values
//! are written as they are; keeping them free of CR/LF is the caller's job,
//! which `http::HeaderValue` already enforces on construction.

use crate::protocol::{ResponseHead, SendError};

use bytes::{BufMut, Bytes, BytesMut};

use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 1024;

/// Encoder for HTTP response heads implementing the [`Encoder`] trait.
#[derive(Debug, Default)]
pub struct HeaderEncoder;

impl Encoder<ResponseHead> for HeaderEncoder {
    type Error = SendError;

    /// Writes the status line, the headers and the terminating blank line into `dst`.
    fn encode(&mut self, head: ResponseHead, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write_head(&head, dst)?;
        Ok(())
    }
}

/// Serializes a response head to its wire bytes.
pub fn serialize_head(head: &ResponseHead) -> Bytes {
    let mut dst = BytesMut::new();
    // writing into memory cannot fail
    let _ = write_head(head, &mut dst);
    dst.freeze()
}

fn write_head(head: &ResponseHead, dst: &mut BytesMut) -> io::Result<()> {
    dst.reserve(INIT_HEADER_SIZE);
    write!(FastWrite(dst), "{} {} {}\r\n", head.version(), head.status().as_str(), head.reason())?;

    for (header_name, header_value) in head.headers() {
        dst.put_slice(header_name.as_ref());
        dst.put_slice(b": ");
        dst.put_slice(header_value.as_ref());
        dst.put_slice(b"\r\n");
    }
    dst.put_slice(b"\r\n");
    Ok(())
}

/// Fast writer implementation for writing to BytesMut.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
