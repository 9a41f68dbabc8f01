//! Shared utilities for integration and load testing.

use std::time::Duration;

use waypost::{Server, ServerHandle};

/// Start `server` on an ephemeral loopback port.
pub async fn start(server: Server) -> ServerHandle {
    let handle = server.bind("127.0.0.1:0").await.expect("bind failed");
    // Give the serve loop a moment to start accepting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle
}

/// Client that never goes through a system proxy and never pools.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Absolute URL for `path` on a running server.
pub fn url(handle: &ServerHandle, path: &str) -> String {
    format!("http://{}{}", handle.local_addr(), path)
}
