//! HTTP request and response messages as plain data.
//!
//! # Design
//! `Request` is built by the caller and serialized to the exact HTTP/1.x
//! wire format (CRLF line endings are mandatory and reproduced exactly).
//! `Response` is assembled incrementally by the fetcher and immutable once
//! returned. All fields use owned types so values can be moved freely
//! between threads.

use std::borrow::Cow;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
        }
    }
}

/// HTTP protocol version on the request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

/// A single HTTP request described as plain data.
///
/// `host` feeds the `Host` header (the connect target is supplied
/// separately to `HttpFetcher::fetch`). Headers are kept as an ordered
/// sequence and written in insertion order.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub host: String,
    pub version: Version,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, host: &str, path: &str, version: Version) -> Self {
        Self {
            method,
            path: path.to_string(),
            host: host.to_string(),
            version,
            headers: Vec::new(),
        }
    }

    /// HTTP/1.1 GET with `Connection: close`, forcing server-driven close
    /// framing when the response declares no length. The sensible default
    /// for a single-shot client.
    pub fn get(host: &str, path: &str) -> Self {
        Self::new(Method::Get, host, path, Version::Http11)
            .with_header("Connection", "close")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Serialize to the exact wire format: request line, headers, blank line.
    ///
    /// A `Host` header is synthesized from `self.host` unless the caller
    /// already supplied one. HTTP/1.1 always gets it (required by the
    /// protocol, even if empty); HTTP/1.0 only when `host` is non-empty.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256);
        out.extend_from_slice(self.method.as_str().as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.path.as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.version.as_str().as_bytes());
        out.extend_from_slice(b"\r\n");

        let caller_set_host = self
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("host"));
        if !caller_set_host && (self.version == Version::Http11 || !self.host.is_empty()) {
            out.extend_from_slice(b"Host: ");
            out.extend_from_slice(self.host.as_bytes());
            out.extend_from_slice(b"\r\n");
        }

        for (name, value) in &self.headers {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }

        out.extend_from_slice(b"\r\n");
        out
    }
}

/// A fully framed HTTP response.
///
/// `status` is the parsed three-digit code from `status_line`. Headers are
/// in arrival order. `body` holds raw bytes under whichever framing the
/// server declared.
#[derive(Debug, Clone)]
pub struct Response {
    pub status_line: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// First header value with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
