//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_node;

use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use vx3::config::{PaymentSettings, Settings};

pub const ALICE: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const BOB: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

/// Find an available port for testing.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to free port");
    listener.local_addr().unwrap().port()
}

/// Settings with short timeouts and fast receipt polling.
pub fn fast_settings() -> Settings {
    let mut settings = Settings::default();
    settings.rpc.timeout_seconds = 5;
    settings.rpc.connect_timeout_seconds = 2;
    settings.payment = PaymentSettings {
        confirmations: 1,
        poll_interval_ms: 20,
        receipt_timeout_seconds: 2,
    };
    settings
}

/// Write a settings file into a fresh temp dir.
pub fn temp_settings(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, content).expect("Failed to write settings");
    (temp_dir, path)
}

/// Write `vx.config.json` with one RPC entry pointing at `addr`.
pub fn write_project_config(dir: &Path, addr: SocketAddr) {
    let content = format!(
        r#"[{{"host":"{}","port":{},"protocol":"http"}}]"#,
        addr.ip(),
        addr.port()
    );
    std::fs::write(dir.join("vx.config.json"), content).expect("Failed to write vx.config.json");
}

/// Wait for a server to become available.
pub async fn wait_for_server(addr: SocketAddr, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
