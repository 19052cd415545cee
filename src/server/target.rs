//! Mapping request paths onto the document root.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use log::debug;

use crate::parser::RequestLine;
use crate::server::config::ServerConfig;

/// Any of the owner, group or other execute bits.
const EXECUTE_BITS: u32 = 0o111;

/// What the single metadata lookup found at the resolved path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Nothing exists at the path.
    Missing,
    /// The path is a directory; the target now names its default document.
    Directory,
    /// Anything else that exists.
    File {
        /// Whether any execute bit is set.
        executable: bool,
    },
}

/// A request path resolved against the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// The filesystem path to serve or execute.
    pub path: PathBuf,
    /// What was found at the path.
    pub kind: TargetKind,
}

impl Target {
    /// Decide between the CGI executor and the static file server.
    ///
    /// Directory targets are always served statically. An executable file is
    /// always run as a CGI program; any other file is run only when the
    /// request line asks for it.
    pub fn requires_cgi(&self, request: &RequestLine) -> bool {
        match self.kind {
            TargetKind::Missing | TargetKind::Directory => false,
            TargetKind::File { executable } => executable || request.requires_cgi(),
        }
    }
}

/// Resolve `request_path` under the configured document root.
///
/// The path is appended to the root as-is, so `/a/b` under `httpdocs` becomes
/// `httpdocs/a/b`. A path ending in `/` gets the default document appended
/// directly. The result is stat'ed exactly once; a directory gets
/// `/<default document>` appended without another lookup.
pub async fn resolve_target(config: &ServerConfig, request_path: impl AsRef<OsStr>) -> Target {
    let request_path = request_path.as_ref();
    let mut raw = config.document_root.clone().into_os_string();
    raw.push(request_path);
    if request_path.as_bytes().ends_with(b"/") {
        raw.push(&config.default_document);
    }
    let mut path = PathBuf::from(raw);

    let kind = match tokio::fs::metadata(&path).await {
        Err(e) => {
            debug!("No target at {}: {e}", path.display());
            TargetKind::Missing
        }
        Ok(metadata) if metadata.is_dir() => {
            path.push(&config.default_document);
            TargetKind::Directory
        }
        Ok(metadata) => TargetKind::File {
            executable: metadata.permissions().mode() & EXECUTE_BITS != 0,
        },
    };

    Target { path, kind }
}
