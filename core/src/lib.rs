//! Blocking HTTP/1.x request-response client core.
//!
//! # Overview
//! Sends a single well-formed request over a connected byte stream and reads
//! the response until the server signals completion — by `Content-Length`, by
//! the chunked terminator, or by closing the connection. One fetch is one
//! connection: no pooling, no redirects, no retries.
//!
//! # Design
//! - `HttpFetcher` drives the protocol; all I/O goes through the `Transport`
//!   trait, so the engine can be exercised against scripted byte streams in
//!   tests without touching the network.
//! - `Request` and `Response` are plain data with owned fields.
//! - Each fetch exclusively owns its connection for the lifetime of the call;
//!   dropping the transport closes it on every exit path, success or error.
//! - Errors are typed: `Connection`, `Timeout`, `Protocol`. A fetch either
//!   returns a fully framed `Response` or the first error encountered.

pub mod error;
pub mod fetcher;
pub mod http;
pub mod transport;

pub use error::FetchError;
pub use fetcher::HttpFetcher;
pub use http::{Method, Request, Response, Version};
pub use transport::{TcpTransport, Transport};
