//! HTTP request decoder module
//!
//! Decodes the head of a request (request line plus header block) from a
//! streaming buffer, one line at a time. The body is not framed here: once the
//! blank line is seen the decoder yields a [`RequestHeader`] and the bytes that
//! follow stay in the buffer for the caller to hand to the request body.
//!
//! # Example
//!
//! ```no_run
//! use spool_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! let header = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(header.path(), "/");
//! ```

use crate::codec::header::{parse_header_line, parse_request_line, trim_line_end};
use crate::ensure;
use crate::protocol::{ParseError, RequestHeader, RequestLine};
use bytes::BytesMut;
use http::HeaderMap;
use std::mem;
use tokio_util::codec::Decoder;
use tracing::trace;

/// Maximum size in bytes allowed for the request line plus the header block
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// A decoder for HTTP request heads.
///
/// # State Machine
///
/// - `RequestLine`: waiting for the first line
/// - `Headers`: request line parsed, collecting header lines until the blank line
///
/// Once a head is returned the decoder is back in `RequestLine`.
#[derive(Debug, Default)]
pub struct RequestDecoder {
    state: DecodeState,
    consumed: usize,
}

#[derive(Debug, Default)]
enum DecodeState {
    #[default]
    RequestLine,
    Headers { line: RequestLine, headers: HeaderMap },
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` instance
    pub fn new() -> Self {
        Self::default()
    }

    fn is_idle(&self) -> bool {
        self.consumed == 0 && matches!(self.state, DecodeState::RequestLine)
    }
}

impl Decoder for RequestDecoder {
    type Item = RequestHeader;
    type Error = ParseError;

    /// Attempts to decode a request head from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(header))`: the blank line was reached
    /// - `Ok(None)`: Need more data to proceed
    /// - `Err(_)`: Encountered a parsing error or the head exceeded the size limit
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(end) = src.iter().position(|b| *b == b'\n') else {
                let pending = self.consumed + src.len();
                ensure!(pending <= MAX_HEADER_BYTES, ParseError::too_large_header(pending, MAX_HEADER_BYTES));
                return Ok(None);
            };

            self.consumed += end + 1;
            ensure!(self.consumed <= MAX_HEADER_BYTES, ParseError::too_large_header(self.consumed, MAX_HEADER_BYTES));

            let raw = src.split_to(end + 1);
            let line = std::str::from_utf8(&raw).map_err(|e| ParseError::invalid_header(format!("line is not utf-8: {e}")))?;
            let line = trim_line_end(line);

            match mem::take(&mut self.state) {
                DecodeState::RequestLine => {
                    let request_line = parse_request_line(line)?;
                    trace!(method = %request_line.method(), path = request_line.path(), "parsed request line");
                    self.state = DecodeState::Headers { line: request_line, headers: HeaderMap::new() };
                }

                DecodeState::Headers { line: request_line, headers } if line.is_empty() => {
                    trace!(head_size = self.consumed, header_count = headers.len(), "parsed request head");
                    self.consumed = 0;
                    return Ok(Some(RequestHeader::new(request_line, headers)));
                }

                DecodeState::Headers { line: request_line, mut headers } => {
                    let (name, value) = parse_header_line(line)?;
                    // a repeated header keeps the last value
                    headers.insert(name, value);
                    self.state = DecodeState::Headers { line: request_line, headers };
                }
            }
        }
    }

    /// Decodes what is left once the peer stops sending.
    ///
    /// An idle decoder with an empty buffer means the peer closed without
    /// sending anything and yields `Ok(None)`. Anything else short of a blank
    /// line is [`ParseError::TruncatedHeaders`].
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(header) = self.decode(src)? {
            return Ok(Some(header));
        }

        if self.is_idle() && src.is_empty() {
            return Ok(None);
        }
        Err(ParseError::TruncatedHeaders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ACCEPT, HOST, USER_AGENT};
    use http::Method;
    use indoc::indoc;

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let mut buf = BytesMut::from(str);

        let header = RequestDecoder::new().decode(&mut buf).unwrap().unwrap();

        assert_eq!(header.method(), &Method::GET);
        assert_eq!(header.version(), "HTTP/1.1");
        assert_eq!(header.path(), "/index.html");

        assert_eq!(header.headers().len(), 3);
        assert_eq!(header.headers().get(ACCEPT).unwrap(), "*/*");
        assert_eq!(header.headers().get(HOST).unwrap(), "127.0.0.1:8080");
        assert_eq!(header.headers().get(USER_AGENT).unwrap(), "curl/7.79.1");
        assert!(buf.is_empty());
    }

    #[test]
    fn body_bytes_stay_in_buffer() {
        let str = indoc! {r##"
        POST /files/a.txt HTTP/1.1
        Content-Length: 3

        abc"##};

        let mut bytes = BytesMut::from(str);
        let header = RequestDecoder::new().decode(&mut bytes).unwrap();

        assert!(header.is_some());
        assert_eq!(&bytes[..], &b"abc"[..]);
    }

    #[test]
    fn crlf_line_endings() {
        let mut buf = BytesMut::from("GET /echo/abc HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n");
        let header = RequestDecoder::new().decode(&mut buf).unwrap().unwrap();

        assert_eq!(header.path(), "/echo/abc");
        assert_eq!(header.headers().get("accept-encoding").unwrap(), "gzip");
    }

    #[test]
    fn partial_input_waits_for_more() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("GET / HTTP/1.1\r\nHo");

        assert!(decoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"st: a\r\n\r\n");
        let header = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.headers().get(HOST).unwrap(), "a");
    }

    #[test]
    fn last_duplicate_header_wins() {
        let mut buf = BytesMut::from("GET / HTTP/1.1\r\nX-Tag: one\r\nx-tag: two\r\n\r\n");
        let header = RequestDecoder::new().decode(&mut buf).unwrap().unwrap();

        assert_eq!(header.headers().get_all("x-tag").iter().count(), 1);
        assert_eq!(header.headers().get("x-tag").unwrap(), "two");
    }

    #[test]
    fn header_without_separator_is_an_error() {
        let mut buf = BytesMut::from("GET / HTTP/1.1\r\nHost\r\n\r\n");
        let result = RequestDecoder::new().decode(&mut buf);

        assert!(matches!(result, Err(ParseError::MalformedHeader { .. })));
    }

    #[test]
    fn malformed_request_line_is_an_error() {
        let mut buf = BytesMut::from("GET /\r\n\r\n");
        let result = RequestDecoder::new().decode(&mut buf);

        assert!(matches!(result, Err(ParseError::MalformedRequestLine { .. })));
    }

    #[test]
    fn eof_before_blank_line_is_truncated() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("GET / HTTP/1.1\r\nHost: a\r\n");

        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert!(matches!(decoder.decode_eof(&mut buf), Err(ParseError::TruncatedHeaders)));
    }

    #[test]
    fn eof_inside_request_line_is_truncated() {
        let mut buf = BytesMut::from("GET / HT");
        assert!(matches!(RequestDecoder::new().decode_eof(&mut buf), Err(ParseError::TruncatedHeaders)));
    }

    #[test]
    fn eof_without_input_is_not_an_error() {
        let mut buf = BytesMut::new();
        assert!(RequestDecoder::new().decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn oversized_head_is_rejected() {
        let mut buf = BytesMut::from("GET / HTTP/1.1\r\n");
        buf.extend_from_slice(format!("X-Big: {}\r\n", "a".repeat(MAX_HEADER_BYTES)).as_bytes());

        let result = RequestDecoder::new().decode(&mut buf);
        assert!(matches!(result, Err(ParseError::TooLargeHeader { .. })));
    }
}
