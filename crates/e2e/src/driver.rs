//! Driver process management - spawning, readiness probing and teardown
//!
//! ```text
//! Unstarted ─start─▶ Spawning ─┬─▶ Running ─await_ready─▶ Ready
//!                              └─▶ SpawnFailed
//! Running | Ready ─teardown─▶ Terminating ─▶ Terminated
//! ```
//!
//! Readiness is an active probe of the driver's WebDriver `/status` route,
//! retried with capped exponential backoff until the configured timeout.
//! Teardown sends SIGTERM, waits out a grace period, then kills. It is
//! idempotent and also runs from `Drop`, so a panicking test still stops
//! its driver.
//!
//! The driver listens on one fixed endpoint per host. Two drivers started on
//! the same endpoint race for it; run one driver per endpoint.

use std::collections::BTreeMap;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::DriverSettings;
use crate::error::{E2eError, E2eResult};
use crate::fixture::FileProvider;
use crate::locator::DriverLocation;

/// Loopback address the driver listens on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// WebDriver status route
    pub fn status_url(&self) -> String {
        format!("{}/status", self.base_url())
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Unstarted,
    Spawning,
    Running,
    Ready,
    Terminating,
    Terminated,
    SpawnFailed,
}

/// Configuration for spawning a driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Resolved driver binary
    pub location: DriverLocation,

    /// Where the driver will listen
    pub endpoint: Endpoint,

    /// Command-line arguments
    pub args: Vec<String>,

    /// Extra environment on top of the parent's
    pub env: BTreeMap<String, String>,

    /// Upper bound for `await_ready`
    pub ready_timeout: Duration,

    /// First delay between readiness probes
    pub probe_interval: Duration,

    /// Backoff cap between readiness probes
    pub max_probe_interval: Duration,

    /// Wait after SIGTERM before killing
    pub grace_period: Duration,
}

impl DriverConfig {
    pub fn new(location: DriverLocation, settings: &DriverSettings) -> Self {
        let endpoint = settings.endpoint();
        Self {
            location,
            args: vec!["--port".to_string(), endpoint.port().to_string()],
            endpoint,
            env: BTreeMap::new(),
            ready_timeout: settings.ready_timeout(),
            probe_interval: settings.probe_interval(),
            max_probe_interval: settings.max_probe_interval(),
            grace_period: settings.grace_period(),
        }
    }
}

/// Handle to one driver process, owned by a single test
pub struct DriverProcess {
    config: DriverConfig,
    child: Option<Child>,
    pid: Option<u32>,
    state: DriverState,
    env: BTreeMap<String, String>,
}

impl DriverProcess {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            child: None,
            pid: None,
            state: DriverState::Unstarted,
            env: BTreeMap::new(),
        }
    }

    /// Spawn the driver with the fixture path from `files` in its environment
    pub fn spawn(config: DriverConfig, files: &FileProvider) -> E2eResult<Self> {
        let mut process = Self::new(config);
        process.start(files)?;
        Ok(process)
    }

    pub fn start(&mut self, files: &FileProvider) -> E2eResult<()> {
        if self.state != DriverState::Unstarted {
            return Err(E2eError::InvalidConfig(format!(
                "driver cannot start from state {:?}",
                self.state
            )));
        }
        self.state = DriverState::Spawning;

        // Only the provider decides the selection; inherited values would shadow it.
        let mut env: BTreeMap<String, String> = std::env::vars()
            .filter(|(key, _)| !FileProvider::is_selection_var(key))
            .collect();
        env.extend(self.config.env.clone());
        env.extend(files.env_overrides());

        let path = self.config.location.path();
        info!("Spawning driver {} for {}", path.display(), self.config.endpoint);

        let spawned = Command::new(path)
            .args(&self.config.args)
            .env_clear()
            .envs(&env)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn();

        match spawned {
            Ok(child) => {
                self.pid = Some(child.id());
                self.child = Some(child);
                self.env = env;
                self.state = DriverState::Running;
                Ok(())
            }
            Err(source) => {
                self.state = DriverState::SpawnFailed;
                Err(E2eError::Spawn {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    /// Environment the process was launched with
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Poll the driver's status route until it answers or the timeout elapses
    pub async fn await_ready(&mut self) -> E2eResult<()> {
        match self.state {
            DriverState::Ready => return Ok(()),
            DriverState::Running => {}
            other => {
                return Err(E2eError::DriverExited(format!(
                    "driver is {:?}, not running",
                    other
                )))
            }
        }

        let url = self.config.endpoint.status_url();
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(self.config.ready_timeout.min(Duration::from_secs(2)))
            .build()?;

        let start = Instant::now();
        let mut attempts = 0;
        let mut delay = self.config.probe_interval;

        loop {
            attempts += 1;

            if let Some(status) = self.exit_status() {
                self.child = None;
                self.state = DriverState::Terminated;
                return Err(E2eError::DriverExited(status));
            }

            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    self.state = DriverState::Ready;
                    info!("Driver ready at {} after {} probe(s)", self.config.endpoint, attempts);
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Status probe returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for driver to listen on {}...", self.config.endpoint);
                    }
                    // Connection refused is expected while the driver is starting
                    if !e.is_connect() {
                        warn!("Status probe error: {}", e);
                    }
                }
            }

            let remaining = self.config.ready_timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }
            sleep(delay.min(remaining)).await;
            delay = (delay * 2).min(self.config.max_probe_interval);
        }

        Err(E2eError::ReadinessTimeout {
            endpoint: self.config.endpoint.to_string(),
            attempts,
        })
    }

    fn exit_status(&mut self) -> Option<String> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => Some(status.to_string()),
            Ok(None) => None,
            Err(e) => {
                debug!("try_wait failed: {}", e);
                None
            }
        }
    }

    /// Stop the driver. Safe to call repeatedly; never fails.
    ///
    /// Blocks for up to the grace period; async callers use [`Self::shutdown`].
    pub fn teardown(&mut self) {
        let Some(mut child) = self.begin_stop() else {
            return;
        };
        if send_sigterm(&child) {
            let deadline = Instant::now() + self.config.grace_period;
            while Instant::now() < deadline {
                if let Ok(Some(_)) = child.try_wait() {
                    break;
                }
                std::thread::sleep(STOP_POLL_INTERVAL);
            }
        }
        self.finish_stop(child);
    }

    /// Same as [`Self::teardown`], but waits out the grace period on the runtime timer.
    pub async fn shutdown(&mut self) {
        let Some(mut child) = self.begin_stop() else {
            return;
        };
        if send_sigterm(&child) {
            let deadline = Instant::now() + self.config.grace_period;
            while Instant::now() < deadline {
                if let Ok(Some(_)) = child.try_wait() {
                    break;
                }
                sleep(STOP_POLL_INTERVAL).await;
            }
        }
        self.finish_stop(child);
    }

    /// Take the child if it still needs stopping.
    fn begin_stop(&mut self) -> Option<Child> {
        let Some(mut child) = self.child.take() else {
            if self.state != DriverState::Unstarted && self.state != DriverState::SpawnFailed {
                self.state = DriverState::Terminated;
            }
            return None;
        };
        self.state = DriverState::Terminating;

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("Driver already exited: {}", status);
                self.state = DriverState::Terminated;
                return None;
            }
            Ok(None) => {}
            Err(e) => warn!("Could not query driver status: {}", e),
        }

        info!("Stopping driver (pid: {})", child.id());
        Some(child)
    }

    fn finish_stop(&mut self, mut child: Child) {
        if let Ok(None) = child.try_wait() {
            warn!("Driver still running after grace period, killing (pid: {})", child.id());
            if let Err(e) = child.kill() {
                warn!("Kill failed: {}", e);
            }
        }
        let _ = child.wait();
        self.state = DriverState::Terminated;
    }
}

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Ask the driver to exit; false when no signal could be delivered.
#[cfg(unix)]
fn send_sigterm(child: &Child) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).is_ok()
}

#[cfg(not(unix))]
fn send_sigterm(_child: &Child) -> bool {
    false
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        self.teardown();
    }
}
