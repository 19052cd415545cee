//! CGI program execution.
//!
//! A CGI program is started with its stdin and stdout connected to pipes.
//! The server sends the bare `200 OK` status line itself; everything else the
//! client sees, from the remaining headers to the body, is whatever the
//! program writes to stdout.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::{debug, error, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};

use crate::parser::{drain_headers, find_content_length, Method, RequestLine};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::response::{HttpResponse, StatusCode};

/// What a CGI program is handed besides its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CgiInput {
    /// GET: the raw query string bytes, exported as `QUERY_STRING`.
    Query(OsString),
    /// POST: the body length, exported as `CONTENT_LENGTH`. The body itself
    /// arrives on stdin.
    Body {
        /// Value parsed from the `Content-Length` header.
        content_length: i64,
    },
}

/// A single CGI program run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgiInvocation {
    /// The resolved executable path, also passed as `argv[0]`.
    pub program: PathBuf,
    /// Request context for the program.
    pub input: CgiInput,
}

impl CgiInvocation {
    /// The request method this invocation was built for.
    pub fn method(&self) -> Method {
        match self.input {
            CgiInput::Query(_) => Method::GET,
            CgiInput::Body { .. } => Method::POST,
        }
    }

    /// Number of body bytes to relay to the program's stdin.
    pub fn body_length(&self) -> u64 {
        match self.input {
            CgiInput::Query(_) => 0,
            CgiInput::Body { content_length } => u64::try_from(content_length).unwrap_or(0),
        }
    }

    /// Build the command: no arguments beyond `argv[0]`, the inherited
    /// environment plus `REQUEST_METHOD` and exactly one of `QUERY_STRING`
    /// or `CONTENT_LENGTH`, stdin and stdout piped.
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.env("REQUEST_METHOD", self.method().as_str());
        match &self.input {
            CgiInput::Query(query) => {
                command.env("QUERY_STRING", query);
            }
            CgiInput::Body { content_length } => {
                command.env("CONTENT_LENGTH", content_length.to_string());
            }
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        command
    }
}

/// Run the CGI program at `program` for `request`.
///
/// The rest of the header block is consumed first: drained for GET, scanned
/// for `Content-Length` for POST. A POST without one gets a 400 page and no
/// process is started. Then the bare status line is sent, the program is
/// spawned, the POST body is copied to its stdin, and its stdout is copied to
/// the client until end of stream. The child is always reaped before
/// returning; its exit status is only logged.
///
/// A spawn that fails for lack of processes, memory or file descriptors sends
/// a 500 page. Any other spawn failure is the program failing to exec: it
/// produces no output, exactly like a program that legitimately prints
/// nothing.
pub async fn execute_cgi<S>(
    stream: &mut S,
    program: &Path,
    request: &RequestLine,
    config: &ServerConfig,
) -> Result<(), Error>
where
    S: tokio::io::AsyncBufRead + AsyncWrite + Unpin,
{
    let input = match request.method {
        Method::GET => {
            drain_headers(stream, config.max_line_length).await;
            CgiInput::Query(request.query_string.clone().unwrap_or_default())
        }
        Method::POST => match find_content_length(stream, config.max_line_length).await {
            Ok(content_length) => CgiInput::Body { content_length },
            Err(e) => {
                stream.write_all(&HttpResponse::bad_request().to_bytes()).await?;
                return Err(Error::ParseError(e));
            }
        },
    };
    let invocation = CgiInvocation {
        program: program.to_path_buf(),
        input,
    };

    stream.write_all(StatusCode::Ok.status_line().as_bytes()).await?;

    let mut child = match invocation.command().spawn() {
        Ok(child) => child,
        Err(e) if is_provisioning_failure(&e) => {
            stream.write_all(&HttpResponse::cannot_execute().to_bytes()).await?;
            return Err(Error::CannotExecute(program.display().to_string(), e));
        }
        Err(e) => {
            warn!("CGI program {} failed to exec: {e}", program.display());
            return Ok(());
        }
    };
    debug!("Started CGI program {} for {}", program.display(), invocation.method());

    let relayed = relay(stream, &mut child, invocation.body_length(), config.chunk_size).await;

    match child.wait().await {
        Ok(status) => debug!("CGI program {} exited with {status}", program.display()),
        Err(e) => error!("Failed to reap CGI program {}: {e}", program.display()),
    }

    relayed
}

/// Copy `body_length` bytes from the client to the child's stdin, close it,
/// then copy the child's stdout to the client until end of stream.
async fn relay<S>(
    stream: &mut S,
    child: &mut Child,
    body_length: u64,
    chunk_size: usize,
) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Some(stdin) = child.stdin.take() {
        let mut body = (&mut *stream).take(body_length);
        copy_body(&mut body, stdin, chunk_size).await?;
    }

    if let Some(mut stdout) = child.stdout.take() {
        let sent = tokio::io::copy(&mut stdout, stream).await?;
        debug!("Relayed {sent} bytes of CGI output");
    }
    stream.flush().await?;

    Ok(())
}

/// Copy the request body into the child's stdin and close it.
///
/// A child that exits without reading its stdin does not fail the request:
/// the rest of the body is still consumed from the client but discarded.
async fn copy_body<R>(body: &mut R, mut stdin: ChildStdin, chunk_size: usize) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0; chunk_size.max(1)];
    let mut child_reading = true;
    loop {
        let n = body.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if !child_reading {
            continue;
        }
        if let Err(e) = stdin.write_all(&buf[..n]).await {
            if e.kind() != io::ErrorKind::BrokenPipe {
                return Err(e);
            }
            debug!("CGI program closed its stdin early");
            child_reading = false;
        }
    }
    Ok(())
}

/// Whether a `spawn` error came from creating the pipes or forking the
/// child, as opposed to the child's `exec`. Everything `exec` can report
/// (ENOENT, EACCES, ENOEXEC, ETXTBSY, ELOOP, E2BIG, ...) counts as an exec
/// failure, as do errors raised before any system call.
fn is_provisioning_failure(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::EAGAIN | libc::ENOMEM | libc::EMFILE | libc::ENFILE)
    )
}
