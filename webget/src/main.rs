//! Fetch one page over plain HTTP/1.x and print the body.
//!
//! Connect, send a single request, read the response to completion, print,
//! exit. Diagnostics (status line, framing) go through the log facade;
//! run with `RUST_LOG=debug` to see them.

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use fetch_core::{HttpFetcher, Method, Request, Version};

#[derive(Parser, Debug)]
#[command(name = "webget", version, about = "Fetch a single page over plain HTTP/1.x")]
struct Args {
    /// Host to connect to (also fills the Host header).
    host: String,

    /// Request path.
    #[arg(default_value = "/")]
    path: String,

    /// TCP port.
    #[arg(long, default_value_t = 80)]
    port: u16,

    /// Speak HTTP/1.0 instead of HTTP/1.1.
    #[arg(long)]
    http10: bool,

    /// Send HEAD instead of GET.
    #[arg(long)]
    head: bool,

    /// Connect timeout in seconds.
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,

    /// Read timeout in seconds.
    #[arg(long, default_value_t = 30)]
    read_timeout: u64,

    /// Extra request header as "Name: Value". Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("webget: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_request(args: &Args) -> Result<Request, String> {
    let method = if args.head { Method::Head } else { Method::Get };
    let version = if args.http10 { Version::Http10 } else { Version::Http11 };

    let mut request = Request::new(method, &args.host, &args.path, version);
    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("invalid header {header:?}, expected \"Name: Value\""))?;
        request = request.with_header(name.trim(), value.trim());
    }

    let caller_set_connection = request
        .headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("connection"));
    if version == Version::Http11 && !caller_set_connection {
        // Single-shot client: ask the server to close so an unframed body
        // still terminates.
        request = request.with_header("Connection", "close");
    }

    Ok(request)
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let request = build_request(args)?;

    let fetcher = HttpFetcher::new(
        Duration::from_secs(args.connect_timeout),
        Duration::from_secs(args.read_timeout),
    );
    let response = fetcher.fetch(&request, &args.host, args.port)?;
    log::info!("{}", response.status_line);

    std::io::stdout().write_all(&response.body)?;
    Ok(())
}
