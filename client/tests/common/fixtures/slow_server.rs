//! Raw TCP server that answers late, or never
//!
//! mockito replies as soon as a request matches, so timeout behaviour is
//! exercised against this instead.

use automation_client::{AuthCredential, ServerSession};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use super::test_data::*;

pub struct SlowServer {
    url: String,
}

impl SlowServer {
    /// Read each request fully, wait `delay`, then answer 200 with `body`
    pub fn start(delay: Duration, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind slow server");
        let url = format!(
            "http://{}",
            listener.local_addr().expect("Failed to read local address")
        );

        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                thread::spawn(move || respond_after(stream, delay, body));
            }
        });

        Self { url }
    }

    /// Accepts connections and never answers within any test's lifetime
    pub fn silent() -> Self {
        Self::start(Duration::from_secs(3600), "{}")
    }

    pub fn session(&self) -> ServerSession {
        ServerSession::new(
            self.url.as_str(),
            USER_ID,
            DEVICE_ID,
            CLIENT_VERSION,
            AuthCredential::password(USER_ID, PASSWORD),
        )
    }
}

fn respond_after(mut stream: TcpStream, delay: Duration, body: &str) {
    if read_request(&mut stream).is_none() {
        return;
    }
    thread::sleep(delay);
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Consume headers and a Content-Length body
fn read_request(stream: &mut TcpStream) -> Option<()> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut remaining = (header_end + content_length).saturating_sub(data.len());
    while remaining > 0 {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        remaining = remaining.saturating_sub(n);
    }
    Some(())
}
