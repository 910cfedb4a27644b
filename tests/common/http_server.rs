//! Minimal HTTP/1.1 server for exercising the real client.
//!
//! Serves one static body at any path. `/old` answers with a redirect to
//! `/weather.txt`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    pub status: u16,
    pub content_type: Option<&'static str>,
    /// Applied before every response.
    pub delay: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            status: 200,
            content_type: Some("text/plain; charset=utf-8"),
            delay: Duration::ZERO,
        }
    }
}

#[derive(Default)]
struct Counters {
    head: AtomicUsize,
    get: AtomicUsize,
}

pub struct TestServer {
    base: String,
    counters: Arc<Counters>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("{}/weather.txt", self.base)
    }

    pub fn redirecting_url(&self) -> String {
        format!("{}/old", self.base)
    }

    pub fn head_requests(&self) -> usize {
        self.counters.head.load(Ordering::SeqCst)
    }

    pub fn get_requests(&self) -> usize {
        self.counters.get.load(Ordering::SeqCst)
    }
}

pub fn start(body: Vec<u8>, opts: ServerOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let counters = Arc::new(Counters::default());
    let shared = Arc::clone(&counters);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let counters = Arc::clone(&shared);
            thread::spawn(move || handle(stream, &body, opts, &counters));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        counters,
    }
}

/// A URL on a port nothing listens on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/weather.txt")
}

fn handle(mut stream: TcpStream, body: &[u8], opts: ServerOptions, counters: &Counters) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let mut parts = request.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or("/").to_string();

    if !opts.delay.is_zero() {
        thread::sleep(opts.delay);
    }

    if path == "/old" {
        let _ = stream.write_all(
            b"HTTP/1.1 301 Moved Permanently\r\nLocation: /weather.txt\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let is_head = method.eq_ignore_ascii_case("HEAD");
    if is_head {
        counters.head.fetch_add(1, Ordering::SeqCst);
    } else {
        counters.get.fetch_add(1, Ordering::SeqCst);
    }

    let mut response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        opts.status,
        reason(opts.status),
        body.len()
    );
    if let Some(content_type) = opts.content_type {
        response.push_str(&format!("Content-Type: {content_type}\r\n"));
    }
    response.push_str("\r\n");
    let _ = stream.write_all(response.as_bytes());
    if !is_head {
        let _ = stream.write_all(body);
    }
    let _ = stream.flush();
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
