//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;

use crate::parser::{drain_headers, parse_request_line, read_line, Error as ParserError};
use crate::server::cgi::execute_cgi;
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::response::HttpResponse;
use crate::server::static_files::serve_file;
use crate::server::target::{resolve_target, TargetKind};

/// An HTTP server.
#[derive(Clone)]
pub struct HttpServer {
    /// The server configuration, shared read-only with every connection.
    pub config: Arc<ServerConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Bind the listening socket.
    ///
    /// With port 0 the OS assigns a free port; the logged address is the one
    /// actually bound.
    pub async fn bind(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        let addr = listener.local_addr()?;
        info!("Server listening on http://{addr}");
        info!(
            "Serving {} (default document {})",
            self.config.document_root.display(),
            self.config.default_document
        );
        Ok(listener)
    }

    /// Bind the listening socket and serve until Ctrl+C.
    pub async fn start(&self) -> Result<(), Error> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Accept connections on `listener` until Ctrl+C.
    ///
    /// Every connection gets its own detached task. Nothing tracks or limits
    /// the tasks, and requests still in flight at shutdown are not awaited.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Error> {
        let shutdown = signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = &mut shutdown => {
                    match result {
                        Ok(()) => info!("Received Ctrl+C, shutting down"),
                        Err(e) => error!("Error setting up Ctrl+C handler: {e}"),
                    }
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => self.handle_new_connection(socket, addr),
                        Err(e) => {
                            if Self::handle_accept_error(e).await {
                                break;
                            }
                        }
                    }
                }
            }
        }

        info!("Server shutdown complete");
        Ok(())
    }

    /// Spawn the detached task that serves one connection.
    fn handle_new_connection(&self, mut socket: TcpStream, addr: SocketAddr) {
        info!("New connection from {addr}");
        let config = Arc::clone(&self.config);

        tokio::spawn(async move {
            match Self::handle_connection(&mut socket, &config).await {
                Ok(()) => debug!("Finished request from {addr}"),
                Err(e @ (Error::NotFound(_) | Error::ParseError(_))) => {
                    warn!("Request from {addr} rejected: {e}")
                }
                Err(e) => error!("Error handling connection from {addr}: {e}"),
            }
        });
    }

    /// Handle accept errors. Returns true if the accept loop should stop.
    async fn handle_accept_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        // For other errors, wait a bit before retrying
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        false
    }

    /// Serve exactly one request on `socket`, then shut down its write half.
    ///
    /// Reads the request line and either rejects it (501), answers 404 for a
    /// missing target, serves the target as a static file, or runs it as a CGI
    /// program. Whatever response the failure calls for has already been sent
    /// when an error is returned.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        config: &ServerConfig,
    ) -> Result<(), Error> {
        let mut stream = BufReader::new(socket);
        let result = Self::dispatch(&mut stream, config).await;

        if let Err(e) = stream.shutdown().await {
            debug!("Error closing connection: {e}");
        }
        result
    }

    async fn dispatch<S>(stream: &mut S, config: &ServerConfig) -> Result<(), Error>
    where
        S: tokio::io::AsyncBufRead + AsyncWrite + Unpin,
    {
        let line = read_line(stream, config.max_line_length).await;
        if line.is_empty() && line.is_closed() {
            debug!("Connection closed before a request line arrived");
            return Ok(());
        }

        let request = match parse_request_line(&line.bytes) {
            Ok(request) => request,
            Err(e @ ParserError::UnsupportedMethod(_)) => {
                stream.write_all(&HttpResponse::unimplemented().to_bytes()).await?;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        let target = resolve_target(config, &request.path).await;
        debug!(
            "{} {} resolved to {} ({:?})",
            request.method,
            request.path.to_string_lossy(),
            target.path.display(),
            target.kind
        );

        if target.kind == TargetKind::Missing {
            drain_headers(stream, config.max_line_length).await;
            stream.write_all(&HttpResponse::not_found().to_bytes()).await?;
            return Err(Error::NotFound(target.path.display().to_string()));
        }

        if target.requires_cgi(&request) {
            execute_cgi(stream, &target.path, &request, config).await
        } else {
            serve_file(stream, &target.path, config).await.map(|_| ())
        }
    }
}
