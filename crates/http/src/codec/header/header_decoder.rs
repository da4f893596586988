//! Line parsers for the request head.
//!
//! The wire format is strict and simple:
//!
//! - the request line is exactly three tokens separated by single spaces
//! - each header line is split on the first `": "`; a line without one is an error
//!
//! Both parsers accept the line with or without its trailing CRLF.

use http::{HeaderName, HeaderValue, Method};

use crate::protocol::{ParseError, RequestLine};

/// Strips any trailing CR and LF characters.
#[inline]
pub(crate) fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Parses a request line such as `GET /index.html HTTP/1.1`.
///
/// # Errors
///
/// - [`ParseError::MalformedRequestLine`] unless the line splits into exactly three tokens
/// - [`ParseError::InvalidMethod`] if the method is not a valid token
/// - [`ParseError::InvalidPath`] if the path does not start with `/`
pub fn parse_request_line(line: &str) -> Result<RequestLine, ParseError> {
    let line = trim_line_end(line);

    let mut tokens = line.split(' ');
    let (Some(method), Some(path), Some(version), None) = (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(ParseError::malformed_request_line(line));
    };

    let method = Method::from_bytes(method.as_bytes()).map_err(|_| ParseError::invalid_method(method))?;
    if !path.starts_with('/') {
        return Err(ParseError::invalid_path(path));
    }

    Ok(RequestLine::new(method, path, version))
}

/// Parses a single `Name: value` header line, the name folded to lower case.
///
/// # Errors
///
/// - [`ParseError::MalformedHeader`] if the line has no `": "` separator
/// - [`ParseError::InvalidHeader`] if the name or value contains forbidden bytes
pub fn parse_header_line(line: &str) -> Result<(HeaderName, HeaderValue), ParseError> {
    let line = trim_line_end(line);

    let Some((name, value)) = line.split_once(": ") else {
        return Err(ParseError::malformed_header(line));
    };

    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ParseError::invalid_header(format!("header name '{name}': {e}")))?;
    let value =
        HeaderValue::from_str(value).map_err(|e| ParseError::invalid_header(format!("value of '{name}': {e}")))?;

    Ok((name, value))
}
