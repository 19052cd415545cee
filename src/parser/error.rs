//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur while reading an HTTP request off a connection.
#[derive(Debug, Error)]
pub enum Error {
    /// The request method is neither GET nor POST.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A POST request ended its header block without `Content-Length`.
    #[error("POST request without Content-Length header")]
    MissingContentLength,
}
