//! End-to-end fetches against the scripted mock server.
//!
//! # Design
//! The mock server runs on a current-thread tokio runtime on a spawned
//! thread; the fetcher talks to it over a real socket. Covers the framing
//! behaviors that depend on actual transport timing: segmented delivery,
//! server-side pauses, close-terminated bodies, and read timeouts.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use fetch_core::{FetchError, HttpFetcher, Method, Request, Version};
use mock_server::Script;
use tokio::sync::mpsc::UnboundedReceiver;

fn start(script: Script) -> (SocketAddr, UnboundedReceiver<Vec<u8>>) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, script, Some(tx)).await
        })
        .unwrap();
    });

    (addr, rx)
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(Duration::from_secs(2), Duration::from_secs(2))
}

#[test]
fn content_length_body_survives_segmented_delivery() {
    let script = Script::new()
        .send(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nHe".to_vec())
        .pause(Duration::from_millis(100))
        .send(b"llo".to_vec());
    let (addr, _rx) = start(script);

    let resp = fetcher()
        .fetch(&Request::get("127.0.0.1", "/"), "127.0.0.1", addr.port())
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"Hello");
}

#[test]
fn chunked_response_over_the_wire() {
    let script = Script::new()
        .send(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec())
        .send(b"5\r\nHello\r\n".to_vec())
        .pause(Duration::from_millis(50))
        .send(b"6\r\n world\r\n0\r\n\r\n".to_vec());
    let (addr, _rx) = start(script);

    let resp = fetcher()
        .fetch(&Request::get("127.0.0.1", "/"), "127.0.0.1", addr.port())
        .unwrap();
    assert_eq!(resp.body, b"Hello world");
    assert_eq!(resp.header("transfer-encoding"), Some("chunked"));
}

#[test]
fn close_framed_response_ends_at_server_close() {
    let script = Script::response("HTTP/1.0 200 OK", &[], b"Hello");
    let (addr, _rx) = start(script);

    let req = Request::new(Method::Get, "127.0.0.1", "/", Version::Http10);
    let resp = fetcher().fetch(&req, "127.0.0.1", addr.port()).unwrap();
    assert_eq!(resp.status_line, "HTTP/1.0 200 OK");
    assert!(resp.headers.is_empty());
    assert_eq!(resp.body, b"Hello");
}

#[test]
fn request_arrives_in_exact_wire_format() {
    let script = Script::response("HTTP/1.1 200 OK", &[("Content-Length", "0")], b"");
    let (addr, mut rx) = start(script);

    fetcher()
        .fetch(&Request::get("127.0.0.1", "/"), "127.0.0.1", addr.port())
        .unwrap();

    let captured = rx.blocking_recv().unwrap();
    assert_eq!(
        captured,
        b"GET / HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n"
    );
}

#[test]
fn stalled_server_yields_timeout_not_a_hang() {
    let script = Script::new()
        .pause(Duration::from_secs(30))
        .send(b"HTTP/1.1 200 OK\r\n\r\n".to_vec());
    let (addr, _rx) = start(script);

    let impatient = HttpFetcher::new(Duration::from_secs(2), Duration::from_millis(200));
    let started = Instant::now();
    let err = impatient
        .fetch(&Request::get("127.0.0.1", "/"), "127.0.0.1", addr.port())
        .unwrap_err();

    assert!(matches!(err, FetchError::Timeout));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn unreachable_port_is_a_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = fetcher()
        .fetch(&Request::get("127.0.0.1", "/"), "127.0.0.1", port)
        .unwrap_err();
    assert!(matches!(err, FetchError::Connection(_)));
}
