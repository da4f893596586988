//! HTTP head processing: parsing request lines and header lines, and
//! serializing response heads.
//!
//! # Components
//!
//! - [`parse_request_line`] / [`parse_header_line`]: strict line parsers used
//!   by the request decoder
//! - [`HeaderEncoder`]: Encodes a [`ResponseHead`](crate::protocol::ResponseHead) to bytes
//! - [`serialize_head`]: the same encoding into a fresh buffer

mod header_decoder;
mod header_encoder;

pub(crate) use header_decoder::trim_line_end;
pub use header_decoder::{parse_header_line, parse_request_line};
pub use header_encoder::{serialize_head, HeaderEncoder};
