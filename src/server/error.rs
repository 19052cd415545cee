//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::Error as ParserError;

/// Errors that can occur while serving a connection.
///
/// By the time one of these is returned from a connection handler the client
/// has already been sent whatever response the failure calls for.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be parsed or is not supported.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The resolved target does not exist or could not be opened.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The CGI program could not be started.
    #[error("Cannot execute CGI program {0}: {1}")]
    CannotExecute(String, std::io::Error),
}
