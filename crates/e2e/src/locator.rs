//! Driver binary discovery
//!
//! Resolution order: an explicit `TAURI_DRIVER_PATH` override, then every
//! directory on `PATH` with the platform's candidate names. The override is
//! authoritative: if it names a missing file the search stops there.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::platform::PlatformProfile;

/// Environment variable that pins the driver binary.
pub const DRIVER_PATH_ENV: &str = "TAURI_DRIVER_PATH";

/// Base name of the driver executable.
pub const DRIVER_BINARY: &str = "tauri-driver";

/// The slice of process environment the locator reads.
#[derive(Debug, Clone, Default)]
pub struct DriverEnv {
    pub override_path: Option<String>,
    pub search_path: Option<String>,
    /// Base for relative override paths
    pub cwd: PathBuf,
}

impl DriverEnv {
    pub fn from_process() -> E2eResult<Self> {
        Ok(Self {
            override_path: std::env::var(DRIVER_PATH_ENV).ok(),
            search_path: std::env::var("PATH").ok(),
            cwd: std::env::current_dir()?,
        })
    }
}

/// Absolute path to a driver executable that existed when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverLocation(PathBuf);

impl DriverLocation {
    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn for_test(path: &str) -> Self {
        DriverLocation(PathBuf::from(path))
    }
}

impl std::fmt::Display for DriverLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Find the driver binary.
pub fn resolve(env: &DriverEnv, platform: PlatformProfile) -> E2eResult<DriverLocation> {
    if let Some(raw) = env.override_path.as_deref().map(str::trim) {
        if !raw.is_empty() {
            let path = absolutize(&env.cwd, Path::new(raw));
            if !path.exists() {
                return Err(E2eError::ExplicitPathNotFound(path));
            }
            info!("Using driver from {}: {}", DRIVER_PATH_ENV, path.display());
            return Ok(DriverLocation(path));
        }
    }

    let dirs = env
        .search_path
        .as_deref()
        .map(|raw| platform.split_search_path(raw))
        .unwrap_or_default();
    let names = platform.candidate_names(DRIVER_BINARY);

    for dir in &dirs {
        for name in &names {
            let candidate = absolutize(&env.cwd, &dir.join(name));
            debug!("Probing {}", candidate.display());
            if candidate.exists() {
                info!("Found driver on PATH: {}", candidate.display());
                return Ok(DriverLocation(candidate));
            }
        }
    }

    Err(E2eError::DriverNotFound)
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
