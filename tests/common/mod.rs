#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

pub const ADMIN_EMAIL: &str = "admin@test.local";
pub const ADMIN_PASSWORD: &str = "admin-secret1";

/// Per-file cap pushed down so the oversize test stays cheap.
pub const MAX_FILE_SIZE_BYTES: usize = 1024 * 1024;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Scratch data directory, kept for the lifetime of the test binary
        let scratch = tempfile::tempdir()
            .context("failed to create scratch dir")?
            .into_path();

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_userdesk-api"));
        cmd.env("USERDESK_PORT", port.to_string())
            .env("DATABASE_PATH", scratch.join("data/userdesk.db"))
            .env("STORAGE_ROOT", scratch.join("uploads"))
            .env("JWT_SECRET", "integration-test-secret")
            .env("ADMIN_EMAIL", ADMIN_EMAIL)
            .env("ADMIN_PASSWORD", ADMIN_PASSWORD)
            .env("MAX_FILE_SIZE_BYTES", MAX_FILE_SIZE_BYTES.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/api/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Logs in as the bootstrap admin and returns a bearer token.
pub async fn admin_token(server: &TestServer) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
    let body = res.json::<serde_json::Value>().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("login response carried no token")
}

/// A small PDF-flavored file part for upload tests.
pub fn pdf_part(name: &str, content: &[u8]) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(content.to_vec())
        .file_name(name.to_string())
        .mime_str("application/pdf")
        .expect("static mime")
}

pub fn png_part(name: &str, content: &[u8]) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(content.to_vec())
        .file_name(name.to_string())
        .mime_str("image/png")
        .expect("static mime")
}

/// Base form with the required profile fields filled in.
pub fn user_form(name: &str, email: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("email", email.to_string())
        .text("password", "secret123")
        .text("phone", "555-0100")
        .text("role", "User")
}
