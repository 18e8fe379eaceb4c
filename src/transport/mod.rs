//! Transport primitive - one HTTP request, one fully buffered response.
//!
//! The transport layer has no protocol knowledge: it performs exactly one
//! request and hands back the complete body, status code, headers and any
//! session cookies the server set. It does not retry, does not follow
//! redirects and does not interpret status codes - that is the protocol
//! engine's job.
//!
//! # Example
//!
//! ```ignore
//! use batchexec_client::transport::{HttpTransport, Transport, TransportRequest};
//!
//! let transport = HttpTransport::new();
//! let response = transport
//!     .fetch(TransportRequest::get("example.com", "/"))
//!     .await?;
//! assert_eq!(response.status, 200);
//! ```

mod cookie;
mod http;

use std::collections::HashMap;
use std::future::Future;

use bytes::Bytes;

use crate::error::TransportError;

pub use cookie::{parse_set_cookie, Cookie};
pub use http::{HttpTransport, DEFAULT_TIMEOUT};

/// HTTP method for a transport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET request, no body.
    Get,
    /// POST request, optional body.
    Post,
}

impl Method {
    /// Method name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Protocol scheme for a transport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// TLS (the default).
    #[default]
    Https,
    /// Plaintext.
    Http,
}

impl Scheme {
    /// Scheme name as it appears in a URL.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

/// A single request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Protocol scheme (HTTPS unless overridden).
    pub scheme: Scheme,
    /// Target host.
    pub host: String,
    /// Request path, including any query string.
    pub path: String,
    /// Header name/value pairs, sent in order.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<String>,
}

impl TransportRequest {
    /// Create a request with the given method, host and path.
    pub fn new(method: Method, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            scheme: Scheme::default(),
            host: host.into(),
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Create a GET request.
    pub fn get(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(Method::Get, host, path)
    }

    /// Create a POST request.
    pub fn post(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(Method::Post, host, path)
    }

    /// Override the protocol scheme.
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Append a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Full request URL.
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme.as_str(), self.host, self.path)
    }
}

/// A fully buffered response from a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, keyed by lowercase header name.
    pub headers: HashMap<String, String>,
    /// Complete response body.
    pub body: Bytes,
    /// Parsed `Set-Cookie` headers, in arrival order.
    pub cookies: Vec<Cookie>,
}

impl TransportResponse {
    /// Response body as UTF-8 text.
    pub fn text(&self) -> std::result::Result<&str, TransportError> {
        std::str::from_utf8(&self.body).map_err(|_| TransportError::InvalidBody)
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// A request/response primitive capable of one HTTP round trip.
///
/// The protocol engine is generic over this seam; tests drive it with a
/// scripted in-memory implementation.
pub trait Transport: Send + Sync {
    /// Perform exactly one request and buffer the full response.
    fn fetch(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = std::result::Result<TransportResponse, TransportError>> + Send;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn fetch(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = std::result::Result<TransportResponse, TransportError>> + Send {
        (**self).fetch(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_default_scheme() {
        let request = TransportRequest::get("example.com", "/path?x=1");
        assert_eq!(request.url(), "https://example.com/path?x=1");
        assert_eq!(request.method, Method::Get);
    }

    #[test]
    fn test_request_url_http_scheme() {
        let request = TransportRequest::post("example.com", "/").scheme(Scheme::Http);
        assert_eq!(request.url(), "http://example.com/");
    }

    #[test]
    fn test_request_builder_headers_and_body() {
        let request = TransportRequest::post("example.com", "/submit")
            .header("content-type", "text/plain")
            .header("accept", "*/*")
            .body("payload");

        assert_eq!(
            request.headers,
            vec![
                ("content-type".to_string(), "text/plain".to_string()),
                ("accept".to_string(), "*/*".to_string()),
            ]
        );
        assert_eq!(request.body.as_deref(), Some("payload"));
    }

    #[test]
    fn test_response_text_valid_utf8() {
        let response = TransportResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from_static(b"hello"),
            cookies: Vec::new(),
        };
        assert_eq!(response.text().unwrap(), "hello");
    }

    #[test]
    fn test_response_text_invalid_utf8() {
        let response = TransportResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from_static(&[0xff, 0xfe]),
            cookies: Vec::new(),
        };
        assert!(response.text().is_err());
    }

    #[test]
    fn test_response_header_lookup_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/html".to_string());
        let response = TransportResponse {
            status: 200,
            headers,
            body: Bytes::new(),
            cookies: Vec::new(),
        };

        assert_eq!(response.header("Content-Type"), Some("text/html"));
        assert_eq!(response.header("x-missing"), None);
    }
}
