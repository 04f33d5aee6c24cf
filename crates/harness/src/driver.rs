//! WebDriver server management - spawning and health checking chromedriver

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use qoe_common::{Error, Result};

/// Handle to a running WebDriver server process
pub struct DriverHandle {
    child: Child,
    pub base_url: String,
    pub port: u16,
}

impl DriverHandle {
    /// Spawn the WebDriver server
    pub async fn spawn(config: DriverConfig) -> Result<Self> {
        let port = config.port.unwrap_or_else(find_free_port);
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning WebDriver server on port {}", port);

        let mut cmd = Command::new(&config.binary_path);
        cmd.arg(format!("--port={}", port));
        if config.verbose {
            cmd.arg("--verbose");
        }

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            Error::DriverStartup(format!(
                "Failed to spawn {}: {}",
                config.binary_path.display(),
                e
            ))
        })?;

        let handle = DriverHandle {
            child,
            base_url: base_url.clone(),
            port,
        };

        // Wait for the server to answer status probes
        handle.wait_for_ready(config.startup_timeout).await?;

        info!("WebDriver server is ready at {}", base_url);
        Ok(handle)
    }

    /// Poll GET /status until the server reports ready
    async fn wait_for_ready(&self, timeout_duration: Duration) -> Result<()> {
        let status_url = format!("{}/status", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let body: serde_json::Value = resp.json().await?;
                    if body["value"]["ready"].as_bool().unwrap_or(false) {
                        return Ok(());
                    }
                }
                Ok(resp) => {
                    warn!("Status probe returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for WebDriver server to start...");
                    }
                    // Connection refused is expected while the server is starting
                    if !e.is_connect() {
                        warn!("Status probe error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(Error::DriverHealthCheck(attempts))
    }

    /// Get the base URL for this server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the server
    pub fn stop(&mut self) -> Result<()> {
        info!("Stopping WebDriver server (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                // Give it a moment to shut down gracefully
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for spawning a WebDriver server
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Path to the chromedriver binary
    pub binary_path: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for server startup
    pub startup_timeout: Duration,

    /// Enable verbose driver logging
    pub verbose: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("chromedriver"),
            port: None,
            startup_timeout: Duration::from_secs(30),
            verbose: false,
        }
    }
}

/// Find a free port to use
fn find_free_port() -> u16 {
    use std::net::TcpListener;

    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to find free port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}
