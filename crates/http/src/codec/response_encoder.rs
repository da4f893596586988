use crate::codec::header::HeaderEncoder;
use crate::protocol::{Message, PayloadItem, ResponseHead, SendError};
use bytes::{Buf, BytesMut};
use std::io;
use std::io::ErrorKind;
use tokio_util::codec::Encoder;
use tracing::error;

/// Encodes a response as one head followed by raw body chunks.
///
/// There is no transfer framing: chunks are copied as they are and the body
/// length is whatever `content-length` the handler declared. A payload before
/// the head, or a second head before `Eof`, is rejected.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
    head_sent: bool,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: Buf> Encoder<Message<ResponseHead, D>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<ResponseHead, D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header(head) => {
                if self.head_sent {
                    error!("expect payload item but receive response head");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                }

                self.head_sent = true;
                self.header_encoder.encode(head, dst)
            }

            Message::Payload(payload_item) => {
                if !self.head_sent {
                    error!("expect response header but receive payload item");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                }

                match payload_item {
                    PayloadItem::Chunk(mut data) => {
                        while data.has_remaining() {
                            let chunk = data.chunk();
                            let len = chunk.len();
                            dst.extend_from_slice(chunk);
                            data.advance(len);
                        }
                    }
                    PayloadItem::Eof => self.head_sent = false,
                }
                Ok(())
            }
        }
    }
}
