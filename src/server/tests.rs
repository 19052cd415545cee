//! Tests for the HTTP server implementation.

#[cfg(test)]
mod server_tests {
    use std::io::{self, Cursor};
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::{AsyncRead, AsyncWrite, BufReader, ReadBuf};

    use crate::parser::{parse_request_line, Error as ParserError, Method};
    use crate::server::{
        resolve_target, serve_file, CgiInput, CgiInvocation, Error, HttpResponse, HttpServer,
        ServerConfig, StatusCode, TargetKind,
    };

    // Mock TcpStream for testing
    struct MockTcpStream {
        read_data: Cursor<Vec<u8>>,
        write_data: Vec<u8>,
        shut_down: bool,
    }

    impl MockTcpStream {
        fn new(read_data: impl Into<Vec<u8>>) -> Self {
            Self {
                read_data: Cursor::new(read_data.into()),
                write_data: Vec::new(),
                shut_down: false,
            }
        }

        fn written_data(&self) -> &[u8] {
            &self.write_data
        }
    }

    impl AsyncRead for MockTcpStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            let n = std::io::Read::read(&mut this.read_data, buf.initialize_unfilled())?;
            buf.advance(n);
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockTcpStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            this.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            self.get_mut().shut_down = true;
            Poll::Ready(Ok(()))
        }
    }

    fn fixture_root() -> PathBuf {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/httpdocs");
        // Checkouts do not always keep the execute bits.
        for entry in std::fs::read_dir(root.join("cgi-bin")).unwrap() {
            let path = entry.unwrap().path();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        for document in ["plain.txt", "test.html", "sub/test.html"] {
            std::fs::set_permissions(root.join(document), std::fs::Permissions::from_mode(0o644))
                .unwrap();
        }
        root
    }

    fn config_for(document_root: &Path) -> ServerConfig {
        ServerConfig {
            addr: "127.0.0.1:0".parse().unwrap(),
            document_root: document_root.to_path_buf(),
            ..ServerConfig::default()
        }
    }

    async fn request(config: &ServerConfig, raw: &[u8]) -> (Result<(), Error>, MockTcpStream) {
        let mut stream = MockTcpStream::new(raw);
        let result = HttpServer::handle_connection(&mut stream, config).await;
        (result, stream)
    }

    fn cgi_response(body: &str) -> Vec<u8> {
        let mut expected = StatusCode::Ok.status_line().into_bytes();
        expected.extend_from_slice(body.as_bytes());
        expected
    }

    #[test]
    fn test_server_creation() {
        let config = ServerConfig {
            addr: "127.0.0.1:8080".parse().unwrap(),
            document_root: PathBuf::from("public"),
            default_document: "index.html".to_string(),
            max_line_length: 512,
            chunk_size: 4096,
        };

        let server = HttpServer::new(config.clone());
        assert_eq!(server.config.addr, config.addr);
        assert_eq!(server.config.document_root, config.document_root);
        assert_eq!(server.config.default_document, "index.html");
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.addr.port(), 6379);
        assert_eq!(config.document_root, PathBuf::from("httpdocs"));
        assert_eq!(config.default_document, "test.html");
        assert_eq!(config.max_line_length, 1024);
    }

    #[tokio::test]
    async fn test_unsupported_method_gets_501() {
        // The document root does not exist, so touching it would give 404.
        let config = config_for(Path::new("/nonexistent/document/root"));
        let (result, stream) = request(&config, b"PUT /index.html HTTP/1.0\r\n\r\n").await;

        assert!(matches!(
            result,
            Err(Error::ParseError(ParserError::UnsupportedMethod(ref m))) if m == "PUT"
        ));
        assert_eq!(stream.written_data(), HttpResponse::unimplemented().to_bytes());
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_blank_request_line_gets_501() {
        let config = config_for(Path::new("/nonexistent/document/root"));
        let (result, stream) = request(&config, b"\r\n").await;

        assert!(result.is_err());
        assert_eq!(stream.written_data(), HttpResponse::unimplemented().to_bytes());
    }

    #[tokio::test]
    async fn test_closed_connection_gets_no_response() {
        let config = config_for(Path::new("/nonexistent/document/root"));
        let (result, stream) = request(&config, b"").await;

        assert!(result.is_ok());
        assert!(stream.written_data().is_empty());
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_missing_target_drains_headers_and_gets_404() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let (result, stream) = request(
            &config,
            b"GET /missing.html HTTP/1.0\r\nHost: localhost\r\nAccept: */*\r\n\r\n",
        )
        .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(stream.written_data(), HttpResponse::not_found().to_bytes());
    }

    #[tokio::test]
    async fn test_static_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        // Binary content spanning several chunks, with CR/LF bytes inside.
        let content: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(dir.path().join("data.bin"), &content).unwrap();
        let config = config_for(dir.path());

        let (result, stream) = request(&config, b"GET /data.bin HTTP/1.0\r\nHost: x\r\n\r\n").await;

        assert!(result.is_ok());
        let header = HttpResponse::file_headers().to_bytes();
        let written = stream.written_data();
        assert!(written.starts_with(&header));
        assert_eq!(&written[header.len()..], &content[..]);
    }

    #[tokio::test]
    async fn test_static_file_is_always_text_html() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body {}").unwrap();
        let config = config_for(dir.path());

        let (_, stream) = request(&config, b"GET /style.css HTTP/1.0\r\n\r\n").await;
        let response = String::from_utf8_lossy(stream.written_data()).into_owned();
        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/html\r\n\r\nbody {}"));
    }

    #[tokio::test]
    async fn test_trailing_slash_serves_default_document() {
        let root = fixture_root();
        let config = config_for(&root);

        let target = resolve_target(&config, "/").await;
        assert_eq!(target.path, root.join("test.html"));
        assert_eq!(target.kind, TargetKind::File { executable: false });

        let target = resolve_target(&config, "/sub/").await;
        assert_eq!(target.path, root.join("sub/test.html"));
        assert!(!target.path.to_string_lossy().contains("//"));

        let (result, stream) = request(&config, b"GET / HTTP/1.0\r\n\r\n").await;
        assert!(result.is_ok());
        let response = String::from_utf8_lossy(stream.written_data()).into_owned();
        assert!(response.ends_with("<html><body>index</body></html>\n"));
    }

    #[tokio::test]
    async fn test_directory_serves_default_document_statically() {
        let root = fixture_root();
        let config = config_for(&root);

        let target = resolve_target(&config, "/sub").await;
        assert_eq!(target.path, root.join("sub").join("test.html"));
        assert_eq!(target.kind, TargetKind::Directory);

        let (result, stream) = request(&config, b"GET /sub HTTP/1.0\r\n\r\n").await;
        assert!(result.is_ok());
        let response = String::from_utf8_lossy(stream.written_data()).into_owned();
        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(response.ends_with("<html><body>sub index</body></html>\n"));
    }

    #[tokio::test]
    async fn test_directory_without_default_document_gets_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        let config = config_for(dir.path());

        let (result, stream) = request(&config, b"GET /empty HTTP/1.0\r\n\r\n").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(stream.written_data(), HttpResponse::not_found().to_bytes());
    }

    #[tokio::test]
    async fn test_executable_bit_forces_cgi() {
        let root = fixture_root();
        let config = config_for(&root);

        let target = resolve_target(&config, "/cgi-bin/env.cgi").await;
        assert_eq!(target.kind, TargetKind::File { executable: true });

        let (result, stream) = request(&config, b"GET /cgi-bin/env.cgi HTTP/1.0\r\n\r\n").await;
        assert!(result.is_ok());
        let program = root.join("cgi-bin/env.cgi");
        let expected = format!("GET||unset|{}", program.display());
        assert_eq!(stream.written_data(), cgi_response(&expected));
    }

    #[tokio::test]
    async fn test_get_query_string_is_passed_verbatim() {
        let config = config_for(&fixture_root());
        let (result, stream) = request(
            &config,
            b"GET /cgi-bin/echo_query.cgi?x=1&y=2 HTTP/1.0\r\nHost: localhost\r\n\r\n",
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(stream.written_data(), cgi_response("x=1&y=2"));
    }

    #[tokio::test]
    async fn test_post_exports_content_length() {
        let config = config_for(&fixture_root());
        let (result, stream) = request(
            &config,
            b"POST /cgi-bin/echo_length.cgi HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello",
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(stream.written_data(), cgi_response("5"));
    }

    #[tokio::test]
    async fn test_post_environment_has_no_query_string() {
        let root = fixture_root();
        let config = config_for(&root);
        let (_, stream) = request(
            &config,
            b"POST /cgi-bin/env.cgi HTTP/1.0\r\nContent-Length: 0\r\n\r\n",
        )
        .await;

        let program = root.join("cgi-bin/env.cgi");
        let expected = format!("POST|unset|0|{}", program.display());
        assert_eq!(stream.written_data(), cgi_response(&expected));
    }

    #[tokio::test]
    async fn test_post_body_is_relayed_to_stdin() {
        let config = config_for(&fixture_root());
        let (result, stream) = request(
            &config,
            b"POST /cgi-bin/echo_body.cgi HTTP/1.0\r\nHost: x\r\nContent-Length: 11\r\n\r\nhello worldEXTRA",
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(
            stream.written_data(),
            cgi_response("Content-Type: text/plain\r\n\r\nhello world")
        );
    }

    #[tokio::test]
    async fn test_large_post_body_round_trips_through_cgi() {
        let config = config_for(&fixture_root());
        let body = "0123456789".repeat(3000);
        let raw = format!(
            "POST /cgi-bin/echo_body.cgi HTTP/1.0\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );

        let (result, stream) = request(&config, raw.as_bytes()).await;
        assert!(result.is_ok());
        let expected = format!("Content-Type: text/plain\r\n\r\n{body}");
        assert_eq!(stream.written_data(), cgi_response(&expected));
    }

    #[tokio::test]
    async fn test_child_ignoring_stdin_still_answers() {
        let config = config_for(&fixture_root());
        let body = "x".repeat(200_000);
        let raw = format!(
            "POST /cgi-bin/ignore_stdin.cgi HTTP/1.0\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );

        let (result, stream) = request(&config, raw.as_bytes()).await;
        assert!(result.is_ok());
        assert_eq!(stream.written_data(), cgi_response("done"));
    }

    #[tokio::test]
    async fn test_post_without_content_length_gets_400() {
        let config = config_for(&fixture_root());
        let (result, stream) = request(
            &config,
            b"POST /cgi-bin/echo_body.cgi HTTP/1.0\r\nHost: x\r\n\r\nhello",
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::ParseError(ParserError::MissingContentLength))
        ));
        // The status line is only sent right before spawning, so its absence
        // shows no process was started.
        assert_eq!(stream.written_data(), HttpResponse::bad_request().to_bytes());
    }

    #[tokio::test]
    async fn test_post_to_missing_target_gets_404() {
        let config = config_for(&fixture_root());
        let (result, stream) = request(
            &config,
            b"POST /cgi-bin/nope.cgi HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello",
        )
        .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(stream.written_data(), HttpResponse::not_found().to_bytes());
    }

    #[tokio::test]
    async fn test_exec_failure_sends_only_status_line() {
        // A query string forces CGI dispatch, but plain.txt cannot be exec'd.
        let config = config_for(&fixture_root());
        let (result, stream) = request(&config, b"GET /plain.txt?x=1 HTTP/1.0\r\n\r\n").await;

        assert!(result.is_ok());
        assert_eq!(stream.written_data(), cgi_response(""));
    }

    #[tokio::test]
    async fn test_executable_without_interpreter_sends_only_status_line() {
        // The execute bit forces CGI dispatch, but the kernel cannot run the file.
        let config = config_for(&fixture_root());
        let (result, stream) =
            request(&config, b"GET /cgi-bin/no_shebang.cgi HTTP/1.0\r\n\r\n").await;

        assert!(result.is_ok());
        assert_eq!(stream.written_data(), cgi_response(""));
    }

    #[tokio::test]
    async fn test_non_utf8_query_string_reaches_program_unchanged() {
        let config = config_for(&fixture_root());
        let (result, stream) = request(
            &config,
            b"GET /cgi-bin/echo_query.cgi?name=\xff\xfe%41 HTTP/1.0\r\n\r\n",
        )
        .await;

        assert!(result.is_ok());
        let mut expected = StatusCode::Ok.status_line().into_bytes();
        expected.extend_from_slice(b"name=\xff\xfe%41");
        assert_eq!(stream.written_data(), expected);
    }

    #[tokio::test]
    async fn test_serve_file_open_failure_gets_404() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let mut stream = BufReader::new(MockTcpStream::new(b"Host: x\r\n\r\n".to_vec()));

        let result = serve_file(&mut stream, &dir.path().join("gone.html"), &config).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(stream.get_ref().written_data(), HttpResponse::not_found().to_bytes());
    }

    #[test]
    fn test_cgi_invocation_environment() {
        let get = CgiInvocation {
            program: PathBuf::from("httpdocs/echo.cgi"),
            input: CgiInput::Query("a=b".into()),
        };
        assert_eq!(get.method(), Method::GET);
        assert_eq!(get.body_length(), 0);

        let post = CgiInvocation {
            program: PathBuf::from("httpdocs/echo.cgi"),
            input: CgiInput::Body { content_length: 42 },
        };
        assert_eq!(post.method(), Method::POST);
        assert_eq!(post.body_length(), 42);

        let negative = CgiInvocation {
            program: PathBuf::from("httpdocs/echo.cgi"),
            input: CgiInput::Body { content_length: -3 },
        };
        assert_eq!(negative.body_length(), 0);
    }

    #[tokio::test]
    async fn test_target_decision_table() {
        let root = fixture_root();
        let config = config_for(&root);

        let plain = resolve_target(&config, "/plain.txt").await;
        let script = resolve_target(&config, "/cgi-bin/env.cgi").await;
        let directory = resolve_target(&config, "/sub").await;

        let get = parse_request_line(b"GET /x HTTP/1.0").unwrap();
        let get_query = parse_request_line(b"GET /x?q HTTP/1.0").unwrap();
        let post = parse_request_line(b"POST /x HTTP/1.0").unwrap();

        assert!(!plain.requires_cgi(&get));
        assert!(plain.requires_cgi(&get_query));
        assert!(plain.requires_cgi(&post));
        assert!(script.requires_cgi(&get));
        assert!(!directory.requires_cgi(&get));
        assert!(!directory.requires_cgi(&post));
    }
}
