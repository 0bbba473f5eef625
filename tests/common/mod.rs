//! Shared utilities for integration testing.

use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Start a mock backing store: accepts TCP connections and holds them open.
///
/// Returns the bound address for pointing a `ConnPlugin` at it.
pub async fn start_mock_store() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            match listener.accept().await {
                Ok((socket, _)) => held.push(socket),
                Err(_) => break,
            }
        }
    });

    addr
}
