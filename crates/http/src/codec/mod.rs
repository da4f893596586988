//! HTTP codec module for decoding request heads and encoding responses
//!
//! # Architecture
//!
//! - Request handling:
//!   - [`RequestDecoder`]: Decodes the request line and header block, line by line
//!   - [`parse_request_line`] / [`parse_header_line`]: the strict line parsers it uses
//!
//! - Response handling:
//!   - [`ResponseEncoder`]: Encodes the response head followed by raw body chunks
//!   - [`serialize_head`]: the head encoding on its own
//!
//! # Example
//!
//! ```no_run
//! use spool_http::codec::{RequestDecoder, ResponseEncoder};
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! // Decode incoming request
//! let mut decoder = RequestDecoder::new();
//! let mut request_buffer = BytesMut::new();
//! let request = decoder.decode(&mut request_buffer);
//!
//! // Encode outgoing response
//! let mut encoder = ResponseEncoder::new();
//! // ... encode response ...
//! ```

mod header;
mod request_decoder;
mod response_encoder;

pub use header::{parse_header_line, parse_request_line, serialize_head, HeaderEncoder};
pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
