use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::json;

static SERVER: OnceLock<TestServer> = OnceLock::new();
static COUNTER: AtomicU32 = AtomicU32::new(0);

pub struct TestServer {
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests.
        // Assumes debug profile; adjust if you run tests with --release.
        let mut cmd = Command::new("target/debug/grimoire-api");
        cmd.env("PORT", port.to_string())
            // Keep the rate limiter out of the way; tests hammer /api/auth
            .env("API_RATE_LIMIT_REQUESTS", "100000")
            .env("API_AUTH_RATE_LIMIT_REQUESTS", "100000")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if std::env::var("JWT_SECRET").is_err() {
            cmd.env("JWT_SECRET", "integration-test-secret");
        }

        // DATABASE_URL is inherited from the environment (or the server's .env)
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
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

/// Spawn (once per test binary) and wait for the server. Returns `None` when
/// DATABASE_URL is not set, so the integration tests skip instead of failing
/// on machines without a Postgres instance.
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return Ok(None);
    }
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(Some(server))
}

/// Unique alphanumeric username per call, valid under the register rules.
pub fn unique_username() -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("u{}x{}n{}", std::process::id(), n, nanos)
}

pub struct Account {
    pub token: String,
    pub id: String,
    pub username: String,
}

/// Register a fresh account and return its token and id.
pub async fn register_account(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<Account> {
    let username = unique_username();
    let res = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&json!({
            "username": username,
            "password": "Passw0rd123",
            "email": format!("{}@example.com", username),
        }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::OK,
        "register failed with {}",
        res.status()
    );
    let body = res.json::<serde_json::Value>().await?;
    let token = body["token"]
        .as_str()
        .context("register response missing token")?
        .to_string();
    let id = body["id"]
        .as_str()
        .context("register response missing id")?
        .to_string();
    Ok(Account { token, id, username })
}
