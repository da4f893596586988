//! Request and response bodies.
//!
//! - [`ReqBody`]: the raw remainder of the connection after the header block,
//!   with an exact-length copy helper since the stream need not end.
//! - [`ResponseBody`]: an `http_body::Body` over either one in-memory chunk or
//!   a [`BodyStream`], a readable source that must be released after use.
//!
//! Release is scoped: [`ResponseBody::release`] reports errors on the normal
//! path, and dropping the body frees the same resources on every other path.

mod req_body;
mod resp_body;

pub use req_body::ReqBody;
pub use resp_body::BodyStream;
pub use resp_body::ResponseBody;
