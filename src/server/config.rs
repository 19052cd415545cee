//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to. Port 0 lets the OS pick a free port.
    pub addr: SocketAddr,
    /// Directory that request paths are resolved against.
    pub document_root: PathBuf,
    /// Document served for directory targets and targets ending in `/`.
    pub default_document: String,
    /// Line buffer size; lines are cut at one byte less than this.
    pub max_line_length: usize,
    /// Chunk size used when streaming static files.
    pub chunk_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 6379)),
            document_root: PathBuf::from("httpdocs"),
            default_document: "test.html".to_string(),
            max_line_length: 1024,
            chunk_size: 1024,
        }
    }
}
