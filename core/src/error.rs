//! Error types for the fetch client.
//!
//! # Design
//! Three categories, matching what a caller can actually act on: the
//! transport failed (`Connection`), the transport made no progress within
//! the configured bound (`Timeout`), or the peer spoke something that is not
//! valid HTTP/1.x framing (`Protocol`). There is no partial-success variant;
//! a fetch either yields a fully framed response or one of these.

use std::fmt;
use std::io;

/// Errors returned by `HttpFetcher`.
#[derive(Debug)]
pub enum FetchError {
    /// The transport could not be established or failed mid-stream
    /// (unreachable peer, resolver failure, connection reset).
    Connection(io::Error),

    /// No bytes within the connect or read deadline.
    Timeout,

    /// The response violates HTTP/1.x framing expectations: malformed
    /// status line, header block over the cap, unsatisfiable
    /// `Content-Length`, or broken chunk framing.
    Protocol(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Connection(e) => write!(f, "connection failed: {e}"),
            FetchError::Timeout => write!(f, "timed out waiting for the peer"),
            FetchError::Protocol(msg) => write!(f, "protocol violation: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Connection(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FetchError {
    /// Socket read/write timeouts surface as `TimedOut` or `WouldBlock`
    /// depending on the platform; both mean "no progress within the bound".
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FetchError::Timeout,
            _ => FetchError::Connection(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_out_io_error_maps_to_timeout() {
        let e = io::Error::new(io::ErrorKind::TimedOut, "read timed out");
        assert!(matches!(FetchError::from(e), FetchError::Timeout));
    }

    #[test]
    fn would_block_io_error_maps_to_timeout() {
        let e = io::Error::new(io::ErrorKind::WouldBlock, "resource unavailable");
        assert!(matches!(FetchError::from(e), FetchError::Timeout));
    }

    #[test]
    fn other_io_errors_map_to_connection() {
        let e = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err = FetchError::from(e);
        assert!(matches!(err, FetchError::Connection(_)));
    }

    #[test]
    fn connection_error_exposes_source() {
        use std::error::Error;
        let err = FetchError::Connection(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(err.source().is_some());
    }

    #[test]
    fn display_includes_protocol_detail() {
        let err = FetchError::Protocol("missing status line".to_string());
        assert_eq!(err.to_string(), "protocol violation: missing status line");
    }
}
