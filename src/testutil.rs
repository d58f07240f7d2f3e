//! Test-only stand-in for an upstream HTTP proxy.
//!
//! A real forward proxy receives absolute-form requests and answers on the
//! client's behalf, which means a plain TCP listener that parses a request
//! head and writes a canned response is indistinguishable from one as far
//! as a probing client is concerned. Tests run real `reqwest` clients
//! against these listeners, so nothing inside the crate gets mocked.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A fake upstream proxy listening on a loopback port.
///
/// Answers every request with the configured status, optionally tagging on
/// a `Set-Cookie` header, and records every `Cookie` header it sees.
pub(crate) struct FakeProxy {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    cookies_seen: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl FakeProxy {
    /// Start a proxy that answers 200 to everything.
    pub async fn start() -> Self {
        Self::spawn(200, None).await
    }

    /// Start a proxy that answers with the given HTTP status.
    pub async fn with_status(status: u16) -> Self {
        Self::spawn(status, None).await
    }

    /// Start a proxy that attaches `Set-Cookie: {header}` to every response.
    pub async fn with_set_cookie(header: &str) -> Self {
        Self::spawn(200, Some(header.to_string())).await
    }

    async fn spawn(status: u16, set_cookie: Option<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake proxy");
        let addr = listener.local_addr().expect("fake proxy addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let cookies_seen = Arc::new(Mutex::new(Vec::new()));

        let task = tokio::spawn({
            let hits = Arc::clone(&hits);
            let cookies_seen = Arc::clone(&cookies_seen);
            async move {
                loop {
                    match listener.accept().await {
                        Ok((mut socket, _)) => {
                            hits.fetch_add(1, Ordering::SeqCst);
                            let set_cookie = set_cookie.clone();
                            let cookies_seen = Arc::clone(&cookies_seen);
                            tokio::spawn(async move {
                                let _ =
                                    serve_one(&mut socket, status, set_cookie, cookies_seen).await;
                            });
                        }
                        Err(_) => break,
                    }
                }
            }
        });

        Self {
            addr,
            hits,
            cookies_seen,
            task,
        }
    }

    /// Proxy URL for client configuration.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of connections accepted so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Every `Cookie` header value observed, in arrival order.
    pub fn cookies_seen(&self) -> Vec<String> {
        self.cookies_seen.lock().unwrap().clone()
    }

    /// Stop accepting and release the port. Connections attempted after
    /// this return awaits are refused.
    pub async fn shutdown(&mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for FakeProxy {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_one(
    socket: &mut TcpStream,
    status: u16,
    set_cookie: Option<String>,
    cookies_seen: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") || head.len() > 64 * 1024 {
            break;
        }
    }

    for line in String::from_utf8_lossy(&head).lines() {
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("cookie") {
                cookies_seen.lock().unwrap().push(value.trim().to_string());
            }
        }
    }

    let mut response = format!("HTTP/1.1 {} OK\r\n", status);
    if let Some(cookie) = &set_cookie {
        response.push_str(&format!("set-cookie: {}\r\n", cookie));
    }
    response.push_str("content-length: 2\r\nconnection: close\r\n\r\nok");
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await?;
    Ok(())
}

/// URL of a loopback port that refuses connections: bound once to reserve
/// an address, then dropped before anyone can connect.
pub(crate) async fn dead_proxy_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind dead proxy");
    let addr = listener.local_addr().expect("dead proxy addr");
    drop(listener);
    format!("http://{}", addr)
}

/// Probe target used throughout the tests. The host never resolves; a
/// proxied client hands the URL to the proxy untouched, so the fake proxy
/// answers for it.
pub(crate) const PROBE_URL: &str = "http://probe.invalid/ok";
