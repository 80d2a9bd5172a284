//! Shared utilities for integration testing.

// Each test binary uses a subset of these helpers.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use gatekeeper::config::GatewayConfig;
use gatekeeper::identity::{AccountStore, Profile, Role, StoreError};
use gatekeeper::{HttpServer, Shutdown};

/// Head of one request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    let head = String::from_utf8_lossy(&buf);
    let mut lines = head.lines();
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();
    let authorization = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
        .map(|(_, value)| value.trim().to_string());
    Some(CapturedRequest {
        method,
        path,
        authorization,
    })
}

/// Start a mock upstream whose handler decides status and body per request.
/// Returns the bound address.
pub async fn start_programmable_upstream<F>(handler: F) -> SocketAddr
where
    F: Fn(&CapturedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        if let Some(request) = read_head(&mut socket).await {
                            let (status, body) = handler(&request);
                            let response = format!(
                                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                status_line(status),
                                body.len(),
                                body
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock upstream that accepts the connection, reads the request,
/// and never answers.
pub async fn start_stalled_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = read_head(&mut socket).await;
                        // Hold the connection open without responding.
                        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                        drop(socket);
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Start a mock upstream that completes a `101 Switching Protocols`
/// handshake and then echoes every byte back over the raw connection.
pub async fn start_upgrade_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        if read_head(&mut socket).await.is_none() {
                            return;
                        }
                        let head = "HTTP/1.1 101 Switching Protocols\r\n\
                                    Connection: Upgrade\r\n\
                                    Upgrade: echo\r\n\r\n";
                        if socket.write_all(head.as_bytes()).await.is_err() {
                            return;
                        }
                        let mut buf = [0u8; 1024];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => {
                                    if socket.write_all(&buf[..n]).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Start a mock upstream that answers 200 and reports every request head
/// through a channel.
#[allow(dead_code)]
pub async fn start_recording_upstream() -> (SocketAddr, mpsc::UnboundedReceiver<CapturedRequest>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let addr = start_programmable_upstream(move |request| {
        let _ = tx.send(request.clone());
        (200, "ok".to_string())
    })
    .await;
    (addr, rx)
}

/// In-memory account store standing in for the external identity service.
/// One configured account; any other token is rejected.
pub struct MockStore {
    pub token: String,
    pub account_id: String,
    pub profile: Mutex<Option<Profile>>,
    /// When false, the atomic decrement RPC answers like a store without
    /// the function installed, forcing the fallback path.
    pub atomic_available: bool,
    pub decrements: AtomicU32,
    pub writes: Mutex<Vec<u32>>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new(token: &str, account_id: &str, role: Role, credits: u32, premium: bool) -> Self {
        Self {
            token: token.to_string(),
            account_id: account_id.to_string(),
            profile: Mutex::new(Some(Profile {
                role,
                credits,
                is_premium: premium,
            })),
            atomic_available: true,
            decrements: AtomicU32::new(0),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// A store that rejects every token.
    pub fn rejecting() -> Self {
        Self::new("", "nobody", Role::Free, 0, false)
    }

    pub fn credits(&self) -> u32 {
        self.profile.lock().unwrap().as_ref().map(|p| p.credits).unwrap_or(0)
    }
}

#[async_trait]
impl AccountStore for MockStore {
    async fn verify_token(&self, token: &str) -> Result<Option<String>, StoreError> {
        if !self.token.is_empty() && token == self.token {
            Ok(Some(self.account_id.clone()))
        } else {
            Ok(None)
        }
    }

    async fn fetch_profile(&self, _account_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn decrement_credit(&self, _account_id: &str) -> Result<(), StoreError> {
        if !self.atomic_available {
            return Err(StoreError::Status(404));
        }
        self.decrements.fetch_add(1, Ordering::SeqCst);
        if let Some(profile) = self.profile.lock().unwrap().as_mut() {
            profile.credits = profile.credits.saturating_sub(1);
        }
        Ok(())
    }

    async fn write_credits(&self, _account_id: &str, credits: u32) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push(credits);
        if let Some(profile) = self.profile.lock().unwrap().as_mut() {
            profile.credits = credits;
        }
        Ok(())
    }
}

/// Gateway config pointing at the given mock upstreams, installer off.
pub fn test_config(backend: SocketAddr, webui: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstreams.backend_url = format!("http://{}", backend);
    config.upstreams.webui_url = format!("http://{}", webui);
    config.installer.enabled = false;
    config
}

/// Spawn the gateway on an ephemeral port with an injected store.
pub async fn spawn_gateway(
    config: GatewayConfig,
    store: Arc<dyn AccountStore>,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::with_store(config, store).unwrap();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}
