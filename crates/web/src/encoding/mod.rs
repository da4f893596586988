//! Response compression.
//!
//! [`GzipMiddleware`] compresses response bodies for clients that accept gzip.
//! The compressed bytes are spooled to a temporary file rather than held in
//! memory, and that file is deleted once the body has been written or dropped.

mod encoder;
mod spool;

use bytes::{Bytes, BytesMut};
use std::io;

pub use encoder::{EncodeError, GzipMiddleware};

/// In-memory sink the compressor writes into, drained after every chunk.
pub(crate) struct Writer {
    buf: BytesMut,
}

impl Writer {
    fn new() -> Self {
        Self { buf: BytesMut::with_capacity(4096) }
    }

    fn take(&mut self) -> Bytes {
        self.buf.split().freeze()
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
