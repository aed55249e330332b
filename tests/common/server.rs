//! Test server management.
//!
//! Spawns and manages flowstated instances for integration testing.

use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// A test server instance.
pub struct TestServer {
    child: Child,
    ws_port: u16,
    http_port: u16,
    _data_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Spawn a new test server with the given WebSocket and HTTP ports.
    pub async fn spawn(ws_port: u16, http_port: u16) -> anyhow::Result<Self> {
        // Create temporary directory for the generated config
        let data_dir = tempfile::tempdir()?;
        let config_path = data_dir.path().join("config.toml");
        let config_content = format!(
            r#"
[server]
name = "test.flowstate"

[listen]
address = "127.0.0.1:{ws_port}"

[http]
port = {http_port}
"#
        );
        std::fs::write(&config_path, config_content)?;

        // Build path to flowstated binary (in workspace target dir)
        let cargo_manifest_dir = env!("CARGO_MANIFEST_DIR");
        let binary_path = PathBuf::from(cargo_manifest_dir).join("target/debug/flowstated");

        // Spawn the server process
        let child = Command::new(&binary_path)
            .arg(config_path.to_str().unwrap())
            .spawn()?;

        let server = Self {
            child,
            ws_port,
            http_port,
            _data_dir: data_dir,
        };

        // Wait for server to start listening
        server.wait_until_ready().await?;

        Ok(server)
    }

    /// Wait until the server is accepting connections on both ports.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..30 {
            let ws_ok = tokio::net::TcpStream::connect(("127.0.0.1", self.ws_port))
                .await
                .is_ok();
            let http_ok = tokio::net::TcpStream::connect(("127.0.0.1", self.http_port))
                .await
                .is_ok();
            if ws_ok && http_ok {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 3 seconds")
    }

    /// Get the WebSocket listener address.
    pub fn ws_address(&self) -> String {
        format!("127.0.0.1:{}", self.ws_port)
    }

    /// Build a management API URL for the given path.
    pub fn api_url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.http_port)
    }

    /// Create a room through the management API and return its id.
    pub async fn create_room(&self, name: &str) -> anyhow::Result<String> {
        let response = reqwest::Client::new()
            .post(self.api_url("/api/rooms"))
            .json(&serde_json::json!({"name": name}))
            .send()
            .await?;
        anyhow::ensure!(
            response.status().as_u16() == 201,
            "unexpected status: {}",
            response.status()
        );
        let body: serde_json::Value = response.json().await?;
        match body["id"].as_str() {
            Some(id) => Ok(id.to_string()),
            None => anyhow::bail!("create room response missing id: {body}"),
        }
    }

    /// Create a new test client connected to this server.
    pub async fn connect(&self) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.ws_address()).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Kill the server process
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
