//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use chat_gateway::config::GatewayConfig;
use chat_gateway::http::HttpServer;
use chat_gateway::lifecycle::Shutdown;

/// A request as seen on the wire by a mock upstream.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Request line and headers, lowercased.
    pub head: String,
    pub body: String,
}

#[allow(dead_code)]
impl CapturedRequest {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let prefix = format!("{}:", name.to_lowercase());
        self.head
            .lines()
            .find(|line| line.starts_with(&prefix))
            .map(|line| line[prefix.len()..].trim())
    }
}

/// Handle to a running mock upstream.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

#[allow(dead_code)]
impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}/api/v1/chat/completions", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

/// Start a mock upstream that records each request and answers with a fixed response.
pub async fn start_mock_upstream(
    status: u16,
    content_type: Option<&'static str>,
    body: &'static str,
) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let sink = sink.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    sink.lock().unwrap().push(request);
                }

                let content_type = content_type
                    .map(|ct| format!("Content-Type: {}\r\n", ct))
                    .unwrap_or_default();
                let response_str = format!(
                    "HTTP/1.1 {} Mock\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    content_type,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response_str.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockUpstream { addr, captured }
}

/// Start a mock upstream that reads requests but never answers.
#[allow(dead_code)]
pub async fn start_silent_upstream() -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let sink = sink.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    sink.lock().unwrap().push(request);
                }
                // Hold the connection open without replying.
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                drop(socket);
            });
        }
    });

    MockUpstream { addr, captured }
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).into_owned();
    Some(CapturedRequest { head, body })
}

/// Gateway configuration pointing at `upstream_url`, with a proxy token set.
#[allow(dead_code)]
pub fn gateway_config(upstream_url: String, token: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.proxy_token = token.into();
    config.upstream.url = upstream_url;
    config.upstream.api_key = "sk-test".into();
    config.upstream.request_timeout_secs = 5;
    config.upstream.system_proxy = false;
    config
}

/// Start a gateway on an ephemeral port. Trigger the returned `Shutdown` to stop it.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// HTTP client that never goes through an environment proxy.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
