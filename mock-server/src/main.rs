use tokio::net::TcpListener;

use mock_server::Script;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr}");

    // Close-framed on purpose: no Content-Length, the close ends the body.
    let script = Script::response(
        "HTTP/1.0 200 OK",
        &[("Content-Type", "text/plain")],
        b"hello from mock-server\n",
    );
    mock_server::run(listener, script, None).await
}
