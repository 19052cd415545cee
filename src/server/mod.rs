//! HTTP server implementation for microhttp-cgi.
//!
//! This module resolves parsed requests against the document root and either
//! streams a static file or hands the connection to a CGI program.

mod cgi;
mod config;
mod error;
mod http_server;
mod response;
mod static_files;
mod target;
mod tests;

// Re-export public items
pub use cgi::{execute_cgi, CgiInput, CgiInvocation};
pub use config::ServerConfig;
pub use error::Error;
pub use http_server::HttpServer;
pub use response::{HttpResponse, StatusCode, SERVER_IDENTIFIER};
pub use static_files::serve_file;
pub use target::{resolve_target, Target, TargetKind};
