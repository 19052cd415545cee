//! A minimal HTTP/1.0 server for static files and CGI programs.
//!
//! Every connection carries exactly one request. The request line decides
//! what happens to it:
//!
//! - A method other than GET or POST gets a 501 page.
//! - A target that does not exist under the document root gets a 404 page.
//! - A POST, a GET with a query string, or any target with an execute bit set
//!   is run as a CGI program. The program receives `REQUEST_METHOD` plus
//!   either `QUERY_STRING` or `CONTENT_LENGTH` in its environment, the POST
//!   body on stdin, and its stdout is relayed to the client after the
//!   server's bare `HTTP/1.0 200 OK` status line.
//! - Anything else is streamed back as a static file.
//!
//! # Examples
//!
//! ## Parsing a request line
//!
//! ```
//! use std::ffi::OsStr;
//! use microhttp_cgi::{parse_request_line, Method};
//!
//! let request = parse_request_line(b"GET /cgi-bin/echo?x=1&y=2 HTTP/1.0").unwrap();
//! assert_eq!(request.method, Method::GET);
//! assert_eq!(request.path, "/cgi-bin/echo");
//! assert_eq!(request.query_string.as_deref(), Some(OsStr::new("x=1&y=2")));
//! assert!(request.requires_cgi());
//! ```
//!
//! ## Running a server
//!
//! ```no_run
//! use microhttp_cgi::{HttpServer, ServerConfig};
//!
//! # async fn run() -> Result<(), microhttp_cgi::ServerError> {
//! let config = ServerConfig {
//!     addr: "127.0.0.1:0".parse().unwrap(),
//!     document_root: "httpdocs".into(),
//!     ..ServerConfig::default()
//! };
//! HttpServer::new(config).start().await
//! # }
//! ```

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{parse_request_line, Error as ParserError, Method, RequestLine};
pub use server::{Error as ServerError, HttpResponse, HttpServer, ServerConfig, StatusCode};
