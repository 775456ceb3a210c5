//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use typed_rpc::config::RpcConfig;
use typed_rpc::lifecycle::{launch, Launched, Shutdown};
use typed_rpc::routing::RouteTable;

/// A server running on an ephemeral port; stops when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `table` on 127.0.0.1 with an OS-assigned port.
pub async fn spawn_server(table: RouteTable) -> TestServer {
    let mut config = RpcConfig::default();
    config.server.bind_address = "127.0.0.1:0".into();
    spawn_with_config(config, table).await
}

pub async fn spawn_with_config(config: RpcConfig, table: RouteTable) -> TestServer {
    let shutdown = Shutdown::new();
    match launch(config, table, &shutdown).await.unwrap() {
        Launched::Listening { addr, .. } => TestServer { addr, shutdown },
        Launched::InProcess { .. } => panic!("test server was configured not to listen"),
    }
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start a raw backend that answers every request with a fixed response.
/// Lets tests feed the client bodies a real dispatcher would refuse to send.
pub async fn start_mock_backend(status: u16, content_type: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response = format!(
                            "HTTP/1.1 {} Mock\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            content_type,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
