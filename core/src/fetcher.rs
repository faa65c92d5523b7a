//! The fetch engine: send one request, read one fully framed response.
//!
//! # Design
//! `fetch` owns a `TcpTransport` for exactly the duration of the call;
//! `fetch_via` is the protocol itself over any `Transport`, which is what
//! the unit tests drive with scripted streams. The end of the body is
//! decided from the response headers, in priority order: chunked
//! transfer coding, then `Content-Length`, then connection close — where
//! end-of-stream is the completion signal, not an error.

use std::time::Duration;

use crate::error::FetchError;
use crate::http::{Method, Request, Response};
use crate::transport::{TcpTransport, Transport};

/// Hard cap on the accumulated status line + header block.
const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Bound on each individual read from the transport.
const READ_CHUNK: usize = 4096;

/// How the end of the response body is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    /// No body at all: HEAD responses and 1xx/204/304 statuses.
    None,
    /// Size-prefixed segments until the zero-length terminator chunk.
    Chunked,
    /// Exactly this many bytes follow the header block.
    Length(usize),
    /// Body ends when the peer closes the connection.
    Close,
}

/// Single-shot blocking HTTP/1.x client.
///
/// Holds no mutable state; each `fetch` exclusively owns its own connection,
/// so concurrent fetches from independent threads need no coordination.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
        }
    }

    /// Open a connection to `host:port`, send `request`, and read the
    /// response to completion. The connection is closed on every exit path,
    /// success or failure, when the transport drops.
    pub fn fetch(&self, request: &Request, host: &str, port: u16) -> Result<Response, FetchError> {
        let mut transport =
            TcpTransport::connect(host, port, self.connect_timeout, self.read_timeout)?;
        self.fetch_via(request, &mut transport)
    }

    /// Run the request-response exchange over an already connected stream.
    pub fn fetch_via<T: Transport>(
        &self,
        request: &Request,
        transport: &mut T,
    ) -> Result<Response, FetchError> {
        transport.write_all(&request.to_bytes())?;

        let mut buf = Vec::with_capacity(READ_CHUNK);
        let header_end = read_head(transport, &mut buf)?;
        let (status_line, status, headers) = parse_head(&buf[..header_end - 4])?;
        log::debug!("{status_line}");

        let leftover = buf.split_off(header_end);
        let framing = decide_framing(request.method, status, &headers)?;
        log::debug!("body framing: {framing:?}");

        let body = match framing {
            Framing::None => Vec::new(),
            Framing::Chunked => read_chunked_body(transport, leftover)?,
            Framing::Length(len) => read_exact_body(transport, leftover, len)?,
            Framing::Close => read_until_close(transport, leftover)?,
        };
        log::debug!("response complete: {} body bytes", body.len());

        Ok(Response {
            status_line,
            status,
            headers,
            body,
        })
    }
}

/// Accumulate bounded reads until the blank line ends the header block.
/// Returns the index just past the `CRLF CRLF` terminator.
fn read_head<T: Transport>(transport: &mut T, buf: &mut Vec<u8>) -> Result<usize, FetchError> {
    loop {
        if let Some(end) = find_header_end(buf) {
            return Ok(end);
        }
        if buf.len() > MAX_HEADER_BYTES {
            return Err(FetchError::Protocol(format!(
                "header block exceeds {MAX_HEADER_BYTES} bytes"
            )));
        }
        let mut chunk = [0u8; READ_CHUNK];
        let n = transport.read_some(&mut chunk)?;
        if n == 0 {
            return Err(FetchError::Protocol(
                "connection closed before end of headers".to_string(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

/// Parse the status line and header list from the head (terminator excluded).
fn parse_head(head: &[u8]) -> Result<(String, u16, Vec<(String, String)>), FetchError> {
    let text = std::str::from_utf8(head)
        .map_err(|_| FetchError::Protocol("header block is not valid UTF-8".to_string()))?;

    let mut lines = text.split("\r\n");
    let status_line = lines.next().unwrap_or("");
    let status = parse_status_line(status_line)?;

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line.split_once(':').ok_or_else(|| {
            FetchError::Protocol(format!("malformed header line: {line:?}"))
        })?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    Ok((status_line.to_string(), status, headers))
}

/// `HTTP-version SP status-code [SP reason]`. The reason phrase is free
/// text and may be absent. The version token must be `HTTP/1.` plus a
/// single digit.
fn parse_status_line(line: &str) -> Result<u16, FetchError> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or("");
    let minor = version.strip_prefix("HTTP/1.").unwrap_or("");
    if minor.len() != 1 || !minor.chars().all(|c| c.is_ascii_digit()) {
        return Err(FetchError::Protocol(format!("malformed status line: {line:?}")));
    }
    parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .filter(|code| (100..1000).contains(code))
        .ok_or_else(|| FetchError::Protocol(format!("malformed status line: {line:?}")))
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// The three-way framing decision, selected from the response headers.
///
/// Transfer-Encoding takes priority over Content-Length; a non-chunked
/// transfer coding can only be delimited by connection close.
fn decide_framing(
    method: Method,
    status: u16,
    headers: &[(String, String)],
) -> Result<Framing, FetchError> {
    if method == Method::Head || matches!(status, 100..=199 | 204 | 304) {
        return Ok(Framing::None);
    }
    if let Some(te) = header_value(headers, "transfer-encoding") {
        let chunked = te
            .split(',')
            .next_back()
            .map(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
            .unwrap_or(false);
        return Ok(if chunked { Framing::Chunked } else { Framing::Close });
    }
    if let Some(value) = header_value(headers, "content-length") {
        let len = value
            .trim()
            .parse::<usize>()
            .map_err(|_| FetchError::Protocol(format!("invalid Content-Length: {value:?}")))?;
        return Ok(Framing::Length(len));
    }
    Ok(Framing::Close)
}

/// Read exactly `len` body bytes. Bytes already buffered past the header
/// block count first; nothing is read once the length is satisfied, and
/// anything buffered beyond it is discarded.
fn read_exact_body<T: Transport>(
    transport: &mut T,
    mut body: Vec<u8>,
    len: usize,
) -> Result<Vec<u8>, FetchError> {
    if body.len() >= len {
        body.truncate(len);
        return Ok(body);
    }
    while body.len() < len {
        let want = (len - body.len()).min(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];
        let n = transport.read_some(&mut chunk[..want])?;
        if n == 0 {
            return Err(FetchError::Protocol(format!(
                "connection closed with {} of {len} body bytes",
                body.len()
            )));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    Ok(body)
}

/// Read until the peer closes the stream; end-of-stream is success.
fn read_until_close<T: Transport>(
    transport: &mut T,
    mut body: Vec<u8>,
) -> Result<Vec<u8>, FetchError> {
    loop {
        let mut chunk = [0u8; READ_CHUNK];
        let n = transport.read_some(&mut chunk)?;
        if n == 0 {
            return Ok(body);
        }
        body.extend_from_slice(&chunk[..n]);
    }
}

/// Decode size-prefixed chunks until the zero-length terminator, then
/// consume and discard the trailer section.
fn read_chunked_body<T: Transport>(
    transport: &mut T,
    mut buf: Vec<u8>,
) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    loop {
        let (size, line_end) = loop {
            match parse_chunk_size(&buf)? {
                Some(parsed) => break parsed,
                None => fill(transport, &mut buf, "chunk size")?,
            }
        };
        buf.drain(..line_end);

        if size == 0 {
            consume_trailers(transport, &mut buf)?;
            return Ok(body);
        }

        // Chunk data plus its CRLF terminator. A size near usize::MAX is a
        // framing violation, not an excuse to overflow.
        let chunk_end = size.checked_add(2).ok_or_else(|| {
            FetchError::Protocol(format!("chunk size {size:#x} out of range"))
        })?;
        while buf.len() < chunk_end {
            fill(transport, &mut buf, "chunk data")?;
        }
        if &buf[size..chunk_end] != b"\r\n" {
            return Err(FetchError::Protocol(
                "chunk data not terminated by CRLF".to_string(),
            ));
        }
        body.extend_from_slice(&buf[..size]);
        buf.drain(..chunk_end);
    }
}

/// One more bounded read into `buf`; EOF here breaks chunk framing.
fn fill<T: Transport>(
    transport: &mut T,
    buf: &mut Vec<u8>,
    while_reading: &str,
) -> Result<(), FetchError> {
    let mut chunk = [0u8; READ_CHUNK];
    let n = transport.read_some(&mut chunk)?;
    if n == 0 {
        return Err(FetchError::Protocol(format!(
            "connection closed while reading {while_reading}"
        )));
    }
    buf.extend_from_slice(&chunk[..n]);
    Ok(())
}

/// Parse a `size[;extensions] CRLF` chunk-size line from the front of the
/// buffer. `Ok(None)` means the line is not complete yet; a complete but
/// invalid line is an error. Extensions are ignored.
fn parse_chunk_size(buf: &[u8]) -> Result<Option<(usize, usize)>, FetchError> {
    let Some(pos) = buf.windows(2).position(|w| w == b"\r\n") else {
        return Ok(None);
    };
    let line = std::str::from_utf8(&buf[..pos])
        .map_err(|_| FetchError::Protocol("chunk size line is not valid UTF-8".to_string()))?;
    let size_part = line.split(';').next().unwrap_or("").trim();
    let size = usize::from_str_radix(size_part, 16)
        .map_err(|_| FetchError::Protocol(format!("invalid chunk size: {line:?}")))?;
    Ok(Some((size, pos + 2)))
}

/// Discard trailer fields after the terminator chunk, through the blank
/// line. A peer that closes instead of sending trailers is fine: the
/// zero-length chunk already ended the body.
fn consume_trailers<T: Transport>(transport: &mut T, buf: &mut Vec<u8>) -> Result<(), FetchError> {
    loop {
        if let Some(pos) = buf.windows(2).position(|w| w == b"\r\n") {
            if pos == 0 {
                return Ok(());
            }
            buf.drain(..pos + 2);
            continue;
        }
        let mut chunk = [0u8; READ_CHUNK];
        let n = transport.read_some(&mut chunk)?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}
