//! HTTP request parser module.
//!
//! This module reads an HTTP/1.0 request off a connection one line at a time:
//! the request line is split into method and target, and the header block is
//! either drained or scanned for `Content-Length`.

mod error;
mod headers;
mod line;
mod method;
mod request;

// Re-export public items
pub use error::Error;
pub use headers::{drain_headers, find_content_length};
pub use line::{read_line, Line, LineEnd};
pub use method::Method;
pub use request::{parse_request_line, RequestLine, MAX_TOKEN_LENGTH};
