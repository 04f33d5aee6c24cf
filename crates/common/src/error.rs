//! Error types for the QoE scenario harness

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the harness Error
pub type Result<T> = std::result::Result<T, Error>;

/// Harness error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver server failed to start: {0}")]
    DriverStartup(String),

    #[error("WebDriver server health check failed after {0} attempts")]
    DriverHealthCheck(usize),

    #[error("WebDriver error [{kind}]: {message}")]
    WebDriver { kind: String, message: String },

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("No container runtime available (docker or podman)")]
    RuntimeMissing,

    #[error("Command failed in container: {command}: {stderr}")]
    CommandExec { command: String, stderr: String },

    #[error("Invalid impairment rule: loss {loss_percent}% out of range 0-100")]
    InvalidLoss { loss_percent: u8 },

    #[error("Scenario spec error: {0}")]
    SpecParse(String),

    #[error("Recording for {owner} not found at {path}")]
    RecordingMissing { owner: String, path: PathBuf },

    #[error("Recording for {owner} at {path} is empty")]
    RecordingEmpty { owner: String, path: PathBuf },

    #[error("Operation timeout after {seconds}s")]
    Timeout { seconds: u64 },
}
