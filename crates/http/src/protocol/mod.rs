//! Core HTTP protocol abstractions.
//!
//! # Architecture
//!
//! - **Message Handling** ([`message`]): the items fed to the response encoder
//!   - [`Message`]: Represents either a head or a payload chunk
//!   - [`PayloadItem`]: A payload chunk or EOF
//!
//! - **Request Processing** ([`request`]):
//!   - [`RequestLine`]: method, path and version of the first line
//!   - [`RequestHeader`]: request line plus lower-cased header map
//!   - [`Request`]: header plus the [`body::ReqBody`] stream
//!
//! - **Response Processing** ([`response`]):
//!   - [`ResponseHead`]: version, status, reason phrase and headers
//!   - [`Response`]: head plus an optional [`body::ResponseBody`]
//!
//! - **Error Handling** ([`error`]):
//!   - [`HttpError`]: Top-level error type of a connection
//!   - [`ParseError`]: Request parsing errors
//!   - [`SendError`]: Response sending errors

mod message;
pub use message::Message;
pub use message::PayloadItem;

mod request;
pub use request::Request;
pub use request::RequestHeader;
pub use request::RequestLine;

mod response;
pub use response::Response;
pub use response::ResponseHead;
pub use response::DEFAULT_VERSION;

mod error;
pub use error::BoxError;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;
