use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// Connection string of a disposable MongoDB for integration tests.
/// Every test skips itself when this is not set.
pub fn test_uri() -> Option<String> {
    std::env::var("MOVIE_API_TEST_URI").ok()
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn(uri: &str) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/movie-db-api");
        cmd.env("MOVIE_API_PORT", port.to_string())
            .env("MONGODB_URI", uri)
            .env("MOVIE_DB_NAME", "movie-db-test")
            // One collection per spawned server keeps parallel runs apart
            .env("MOVIE_DB_COLLECTION", format!("movies_{}", port))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
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
                // Listener is up even when the database is degraded
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
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
    let uri = test_uri().context("MOVIE_API_TEST_URI not set")?;
    let server =
        SERVER.get_or_init(|| TestServer::spawn(&uri).expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// POST /movies/add and return the assigned id.
pub async fn add_movie(
    client: &reqwest::Client,
    base_url: &str,
    body: serde_json::Value,
) -> Result<String> {
    let res = client
        .post(format!("{}/movies/add", base_url))
        .json(&body)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "add failed: {}", res.status());
    let body = res.json::<serde_json::Value>().await?;
    let id = body
        .get("movieId")
        .and_then(|v| v.as_str())
        .context("response missing movieId")?;
    Ok(id.to_string())
}
