//! Scripted HTTP/1.x responder for exercising the fetch client.
//!
//! # Design
//! Integration tests need byte-precise control over what arrives on the
//! wire: responses with no framing headers, bodies split mid-chunk, pauses
//! between segments, deliberately malformed status lines. So instead of a
//! routing layer, each accepted connection reads the request head, replays
//! a caller-supplied `Script` of send/pause steps verbatim, and closes.
//! The captured request bytes are forwarded on an optional channel so tests
//! can assert the exact serialized wire format.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedSender;

/// One playback step on an accepted connection.
#[derive(Debug, Clone)]
pub enum Step {
    /// Write these bytes exactly as given.
    Send(Vec<u8>),
    /// Stall for this long before the next step.
    Pause(Duration),
}

/// An ordered list of steps, replayed for every connection.
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.steps.push(Step::Send(bytes.into()));
        self
    }

    pub fn pause(mut self, delay: Duration) -> Self {
        self.steps.push(Step::Pause(delay));
        self
    }

    /// Canned full response as a single segment: status line, headers,
    /// blank line, body. CRLF line endings throughout.
    pub fn response(status_line: &str, headers: &[(&str, &str)], body: &[u8]) -> Self {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(status_line.as_bytes());
        bytes.extend_from_slice(b"\r\n");
        for (name, value) in headers {
            bytes.extend_from_slice(name.as_bytes());
            bytes.extend_from_slice(b": ");
            bytes.extend_from_slice(value.as_bytes());
            bytes.extend_from_slice(b"\r\n");
        }
        bytes.extend_from_slice(b"\r\n");
        bytes.extend_from_slice(body);
        Self::new().send(bytes)
    }
}

/// Accept connections forever, serving each one on its own task. The raw
/// request head of every connection is forwarded on `requests` when given.
pub async fn run(
    listener: TcpListener,
    script: Script,
    requests: Option<UnboundedSender<Vec<u8>>>,
) -> Result<(), std::io::Error> {
    loop {
        let (conn, _) = listener.accept().await?;
        let script = script.clone();
        let requests = requests.clone();
        tokio::spawn(async move {
            let _ = serve_conn(conn, script, requests).await;
        });
    }
}

async fn serve_conn(
    mut conn: TcpStream,
    script: Script,
    requests: Option<UnboundedSender<Vec<u8>>>,
) -> Result<(), std::io::Error> {
    let head = read_request_head(&mut conn).await?;
    if let Some(tx) = requests {
        let _ = tx.send(head);
    }
    for step in script.steps {
        match step {
            Step::Send(bytes) => conn.write_all(&bytes).await?,
            Step::Pause(delay) => tokio::time::sleep(delay).await,
        }
    }
    // Closing is part of the protocol: it terminates close-framed bodies.
    conn.shutdown().await
}

/// Read through the blank line that ends the request head. The clients
/// under test send no request body.
async fn read_request_head(conn: &mut TcpStream) -> Result<Vec<u8>, std::io::Error> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            return Ok(buf);
        }
        let n = conn.read(&mut chunk).await?;
        if n == 0 {
            return Ok(buf);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_assembles_head_and_body_as_one_segment() {
        let script = Script::response(
            "HTTP/1.1 200 OK",
            &[("Content-Length", "5")],
            b"Hello",
        );
        match script.steps.as_slice() {
            [Step::Send(bytes)] => assert_eq!(
                bytes,
                b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nHello"
            ),
            other => panic!("expected a single Send step, got {other:?}"),
        }
    }

    #[test]
    fn builder_preserves_step_order() {
        let script = Script::new()
            .send(b"part one".to_vec())
            .pause(Duration::from_millis(10))
            .send(b"part two".to_vec());
        assert!(matches!(
            script.steps.as_slice(),
            [Step::Send(_), Step::Pause(_), Step::Send(_)]
        ));
    }
}
