//! Error types for E2E testing

use std::path::PathBuf;
use thiserror::Error;

/// Remedy printed when no driver binary can be found.
pub const DRIVER_INSTALL_HINT: &str = "cargo install tauri-driver --locked";

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("TAURI_DRIVER_PATH points to {0}, but nothing exists there")]
    ExplicitPathNotFound(PathBuf),

    #[error("tauri-driver not found on PATH. Install with: {}", DRIVER_INSTALL_HINT)]
    DriverNotFound,

    #[error("Failed to spawn driver {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Driver at {endpoint} not ready after {attempts} probe(s)")]
    ReadinessTimeout { endpoint: String, attempts: usize },

    #[error("Driver exited before becoming ready ({0})")]
    DriverExited(String),

    #[error("Timeout waiting for: {0}")]
    AssertionTimeout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Operator configuration mistakes; these never fall back to another strategy.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            E2eError::ExplicitPathNotFound(_) | E2eError::InvalidConfig(_)
        )
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
