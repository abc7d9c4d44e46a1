//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use request_inspector::config::InspectorConfig;
use request_inspector::http::HttpServer;
use request_inspector::lifecycle::Shutdown;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A running inspector bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub capture_dir: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Start an inspector with captures written to a fresh temp directory.
pub async fn start_inspector() -> TestServer {
    start_inspector_with(|_| {}).await
}

pub async fn start_inspector_with(tweak: impl FnOnce(&mut InspectorConfig)) -> TestServer {
    let capture_dir = tempfile::tempdir().unwrap();

    let mut config = InspectorConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.capture.directory = capture_dir.path().join("captures");
    tweak(&mut config);

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        HttpServer::new(config).run(listener, rx).await.unwrap();
    });

    TestServer {
        addr,
        shutdown,
        capture_dir,
        handle,
    }
}
