//! Harness configuration
//!
//! Defaults, then an optional TOML file, then `AOT_E2E_*` environment
//! variables, then CLI flags (applied by the runner binary).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::driver::Endpoint;
use crate::error::{E2eError, E2eResult};

pub const HOST_ENV: &str = "AOT_E2E_HOST";
pub const PORT_ENV: &str = "AOT_E2E_PORT";
pub const READY_TIMEOUT_ENV: &str = "AOT_E2E_READY_TIMEOUT_MS";

/// Set to any value to make the runner binary execute scenarios.
pub const RUN_ENV: &str = "AOT_E2E_RUN";

/// Whether the runner binary was asked to execute scenarios.
///
/// Looks at the raw arguments, because `cargo test` also forwards name
/// filters and libtest flags the runner does not parse.
pub fn run_requested<S: AsRef<str>>(args: &[S], run_env_set: bool) -> bool {
    run_env_set || args.iter().any(|arg| arg.as_ref() == "--run")
}

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Driver process settings
    pub driver: DriverSettings,

    /// Browser session settings
    pub session: SessionSettings,

    /// Built frontend directory containing index.html
    pub dist_dir: PathBuf,

    /// Image the application selects instead of opening a dialog
    pub fixture_path: Option<PathBuf>,

    /// Directory of YAML scenarios
    pub specs_dir: PathBuf,

    /// Where results.json and scripts land
    pub output_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            driver: DriverSettings::default(),
            session: SessionSettings::default(),
            dist_dir: PathBuf::from("dist"),
            fixture_path: None,
            specs_dir: PathBuf::from("crates/e2e/specs"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Driver process settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Loopback host the driver listens on
    pub host: String,

    /// Port the driver listens on; shared by every driver on the host
    pub port: u16,

    /// Upper bound for the readiness probe
    pub ready_timeout_ms: u64,

    /// First delay between probes
    pub probe_interval_ms: u64,

    /// Backoff cap between probes
    pub max_probe_interval_ms: u64,

    /// How long teardown waits after SIGTERM before killing
    pub grace_period_ms: u64,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4444,
            ready_timeout_ms: 10_000,
            probe_interval_ms: 50,
            max_probe_interval_ms: 1_000,
            grace_period_ms: 2_000,
        }
    }
}

impl DriverSettings {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn max_probe_interval(&self) -> Duration {
        Duration::from_millis(self.max_probe_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

/// Browser session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Timeout for each marker wait and assertion
    pub marker_timeout_ms: u64,

    /// Node executable used to run generated scripts
    pub node_binary: PathBuf,

    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            marker_timeout_ms: 5_000,
            node_binary: PathBuf::from("node"),
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `AOT_E2E_*` overrides from the process environment
    pub fn apply_env(&mut self) -> E2eResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> E2eResult<()> {
        if let Some(host) = lookup(HOST_ENV) {
            self.driver.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.driver.port = port
                .parse()
                .map_err(|_| E2eError::InvalidConfig(format!("{}={} is not a port", PORT_ENV, port)))?;
        }
        if let Some(ms) = lookup(READY_TIMEOUT_ENV) {
            self.driver.ready_timeout_ms = ms.parse().map_err(|_| {
                E2eError::InvalidConfig(format!("{}={} is not a number", READY_TIMEOUT_ENV, ms))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.driver.port == 0 {
            return Err(E2eError::InvalidConfig("driver port must be non-zero".into()));
        }
        if self.driver.probe_interval_ms == 0 {
            return Err(E2eError::InvalidConfig("probe interval must be non-zero".into()));
        }
        if self.driver.max_probe_interval_ms < self.driver.probe_interval_ms {
            return Err(E2eError::InvalidConfig(
                "max probe interval is below the probe interval".into(),
            ));
        }
        Ok(())
    }

    /// `dist/index.html` as a file:// URL
    pub fn index_url(&self) -> E2eResult<String> {
        let index = self.dist_dir.join("index.html");
        let absolute = if index.is_absolute() {
            index
        } else {
            std::env::current_dir()?.join(index)
        };
        Ok(format!("file://{}", absolute.display()))
    }
}
