//! Request line parsing and representation.

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::str::FromStr;

use crate::parser::error::Error;
use crate::parser::line::is_space;
use crate::parser::method::Method;

/// Longest method or target token taken from a request line.
pub const MAX_TOKEN_LENGTH: usize = 255;

/// The parsed first line of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// The HTTP method
    pub method: Method,
    /// The request target with any query string removed, as raw bytes
    pub path: OsString,
    /// The raw bytes after `?`, only ever set for GET
    pub query_string: Option<OsString>,
}

impl RequestLine {
    /// Whether the request line alone already forces CGI dispatch: a GET with
    /// a query string, or any POST.
    pub fn requires_cgi(&self) -> bool {
        self.method == Method::POST || self.query_string.is_some()
    }
}

/// Parse a request line such as `GET /index.html HTTP/1.0`.
///
/// The method is everything up to the first whitespace byte and the target
/// is the next whitespace-delimited token; each is capped at
/// [`MAX_TOKEN_LENGTH`] bytes. Anything after the target is ignored. For GET,
/// a `?` in the target splits off the query string verbatim, without any
/// percent-decoding. The target bytes are kept as-is, UTF-8 or not.
///
/// # Errors
///
/// Returns [`Error::UnsupportedMethod`] for any method other than GET or
/// POST, including the empty method of a blank line.
pub fn parse_request_line(line: &[u8]) -> Result<RequestLine, Error> {
    let (method, rest) = take_token(line);
    let method = Method::from_str(&String::from_utf8_lossy(method))?;

    let start = rest.iter().position(|b| !is_space(*b)).unwrap_or(rest.len());
    let (target, _) = take_token(&rest[start..]);

    let (path, query_string) = match method {
        Method::GET => match target.iter().position(|b| *b == b'?') {
            Some(at) => (
                OsStr::from_bytes(&target[..at]).to_os_string(),
                Some(OsStr::from_bytes(&target[at + 1..]).to_os_string()),
            ),
            None => (OsStr::from_bytes(target).to_os_string(), None),
        },
        Method::POST => (OsStr::from_bytes(target).to_os_string(), None),
    };

    Ok(RequestLine {
        method,
        path,
        query_string,
    })
}

/// Split off the leading run of non-whitespace bytes, at most
/// [`MAX_TOKEN_LENGTH`] of them.
fn take_token(bytes: &[u8]) -> (&[u8], &[u8]) {
    let end = bytes
        .iter()
        .take(MAX_TOKEN_LENGTH)
        .position(|b| is_space(*b))
        .unwrap_or_else(|| bytes.len().min(MAX_TOKEN_LENGTH));
    bytes.split_at(end)
}
