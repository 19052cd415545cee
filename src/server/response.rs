//! HTTP response types and the canned pages the server sends.

/// Value of the `Server` header on every formatted response.
pub const SERVER_IDENTIFIER: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP status codes this server emits, with its reason phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 200,
    BadRequest = 400,
    NotFound = 404,
    InternalServerError = 500,
    NotImplemented = 501,
}

impl StatusCode {
    /// Get the reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "BAD REQUEST",
            StatusCode::NotFound => "NOT FOUND",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Method Not Implemented",
        }
    }

    /// The numeric status code.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// The full status line, including its CRLF.
    pub fn status_line(&self) -> String {
        format!("HTTP/1.0 {} {}\r\n", self.as_u16(), self.reason_phrase())
    }
}

/// Represents an HTTP response.
///
/// Headers keep their insertion order.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// The HTTP status code
    pub status: StatusCode,
    /// The HTTP headers
    pub headers: Vec<(String, String)>,
    /// The response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a new HTTP response with the given status code and the
    /// `Server` header.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: vec![("Server".to_string(), SERVER_IDENTIFIER.to_string())],
            body: Vec::new(),
        }
    }

    /// Set the response body with a string.
    pub fn with_body_string(mut self, body: impl Into<String>) -> Self {
        self.body = body.into().into_bytes();
        self
    }

    /// Add a header, replacing any existing one with the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(existing) => existing.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Set the content type.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Convert the response to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.status.status_line().into_bytes();

        for (name, value) in &self.headers {
            bytes.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }

        // Add the empty line that separates headers from body
        bytes.extend_from_slice(b"\r\n");

        bytes.extend_from_slice(&self.body);

        bytes
    }

    /// Header block sent ahead of a static file. The file bytes follow it.
    pub fn file_headers() -> Self {
        Self::new(StatusCode::Ok).with_content_type("text/html")
    }

    /// 400 page for a POST without `Content-Length`.
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BadRequest)
            .with_content_type("text/html")
            .with_body_string(
                "<P>Your browser sent a bad request, such as a POST without a Content-Length.\r\n",
            )
    }

    /// 404 page for a missing or unreadable target.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NotFound)
            .with_content_type("text/html")
            .with_body_string(concat!(
                "<HTML><TITLE>Not Found</TITLE>\r\n",
                "<BODY><P>The server could not fulfill your request because the resource ",
                "specified is unavailable or nonexistent.\r\n",
                "</BODY></HTML>\r\n",
            ))
    }

    /// 500 page for a CGI program that could not be started.
    pub fn cannot_execute() -> Self {
        Self::new(StatusCode::InternalServerError)
            .with_content_type("text/html")
            .with_body_string("<P>Error prohibited CGI execution.\r\n")
    }

    /// 501 page for a method other than GET or POST.
    pub fn unimplemented() -> Self {
        Self::new(StatusCode::NotImplemented)
            .with_content_type("text/html")
            .with_body_string(concat!(
                "<HTML><HEAD><TITLE>Method Not Implemented</TITLE></HEAD>\r\n",
                "<BODY><P>HTTP request method not supported.</P></BODY></HTML>\r\n",
            ))
    }
}
