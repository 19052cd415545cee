//! Static file serving.

use std::path::Path;

use log::{debug, warn};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::parser::drain_headers;
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::response::HttpResponse;

/// Serve the file at `path` to the client.
///
/// The remaining request headers are drained first. If the file cannot be
/// opened a 404 page is sent instead. Otherwise the 200 header block is sent
/// followed by the file's bytes, streamed in `config.chunk_size` chunks.
/// Every file is labelled `text/html`.
///
/// Returns the number of body bytes sent.
pub async fn serve_file<S>(stream: &mut S, path: &Path, config: &ServerConfig) -> Result<u64, Error>
where
    S: tokio::io::AsyncBufRead + AsyncWrite + Unpin,
{
    drain_headers(stream, config.max_line_length).await;

    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            warn!("Cannot open {}: {e}", path.display());
            stream.write_all(&HttpResponse::not_found().to_bytes()).await?;
            return Err(Error::NotFound(path.display().to_string()));
        }
    };

    stream.write_all(&HttpResponse::file_headers().to_bytes()).await?;

    let mut buf = vec![0; config.chunk_size.max(1)];
    let mut sent = 0u64;
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        stream.write_all(&buf[..n]).await?;
        sent += n as u64;
    }
    stream.flush().await?;

    debug!("Sent {sent} bytes from {}", path.display());
    Ok(sent)
}
