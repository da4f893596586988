use bytes::{Buf, Bytes};

/// Represents a HTTP message that can either be a header or payload.
///
/// The response encoder consumes a stream of these: exactly one `Header`
/// followed by zero or more `Payload` chunks and a final `Eof`.
pub enum Message<T, Data: Buf = Bytes> {
    /// Contains the header information of type `T`
    Header(T),
    /// Contains a chunk of payload data or EOF marker
    Payload(PayloadItem<Data>),
}

/// Represents an item in the HTTP message payload stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A chunk of payload data
    Chunk(Data),
    /// Marks the end of the payload stream
    Eof,
}
