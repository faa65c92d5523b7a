//! The connected-byte-stream boundary between the protocol engine and the
//! operating system's network stack.
//!
//! # Design
//! `HttpFetcher` never touches a socket directly; it drives a `Transport`.
//! Production code uses `TcpTransport`, tests use scripted implementations
//! that replay canned reads. Closing is ownership: dropping a transport
//! releases the connection, so every exit path of a fetch — success,
//! timeout, protocol error — tears the connection down.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::FetchError;

/// A connected, bidirectional byte stream.
pub trait Transport {
    /// Write the whole buffer, retrying partial writes until all bytes are
    /// sent or the stream errors.
    fn write_all(&mut self, buf: &[u8]) -> Result<(), FetchError>;

    /// Read up to `buf.len()` bytes. `Ok(0)` means the peer closed the
    /// stream; a read deadline expiring surfaces as `FetchError::Timeout`.
    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, FetchError>;
}

/// `Transport` over a real TCP connection.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to `host:port`, trying each resolved address with
    /// `connect_timeout`, then install `read_timeout` on the socket for all
    /// subsequent reads and writes.
    ///
    /// Name resolution is delegated to `ToSocketAddrs`; a resolver failure
    /// propagates as `FetchError::Connection`.
    pub fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, FetchError> {
        let addrs = (host, port).to_socket_addrs().map_err(FetchError::Connection)?;

        let mut last_err: Option<FetchError> = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, connect_timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(read_timeout))
                        .map_err(FetchError::Connection)?;
                    stream
                        .set_write_timeout(Some(read_timeout))
                        .map_err(FetchError::Connection)?;
                    log::debug!("connected to {addr}");
                    return Ok(Self { stream });
                }
                Err(e) => last_err = Some(e.into()),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            FetchError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{host}:{port} resolved to no addresses"),
            ))
        }))
    }
}

impl Transport for TcpTransport {
    fn write_all(&mut self, buf: &[u8]) -> Result<(), FetchError> {
        self.stream.write_all(buf)?;
        self.stream.flush()?;
        Ok(())
    }

    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, FetchError> {
        Ok(self.stream.read(buf)?)
    }
}
