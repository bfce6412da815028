//! Scenario runner that wires the locator, driver, bridge mock and session together

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::bridge::BridgeMock;
use crate::config::HarnessConfig;
use crate::driver::{DriverConfig, DriverProcess};
use crate::error::{E2eError, E2eResult};
use crate::fixture::FileProvider;
use crate::locator::{self, DriverEnv};
use crate::platform::PlatformProfile;
use crate::session::{RemoteSession, SessionConfig, SessionTarget};
use crate::spec::{Flow, TestSpec, Viewport};

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub flow: Flow,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn from_results(started_at: DateTime<Utc>, duration_ms: u64, results: Vec<TestResult>) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            started_at,
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms,
            results,
        }
    }
}

/// Runs scenarios one at a time. Failures are reported, never retried.
pub struct TestRunner {
    config: HarnessConfig,
    platform: PlatformProfile,
}

impl TestRunner {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            platform: PlatformProfile::current(),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run all scenarios in the specs directory
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.config.specs_dir)?;
        Ok(self.run_specs(&specs).await)
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.config.specs_dir)?;
        let filtered: Vec<TestSpec> = TestSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        Ok(self.run_specs(&filtered).await)
    }

    /// Run a specific scenario by name
    pub async fn run_test(&self, name: &str) -> E2eResult<TestResult> {
        let specs = TestSpec::load_all(&self.config.specs_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Test not found: {}", name)))?;

        Ok(self.run_spec(&spec).await)
    }

    pub async fn run_specs(&self, specs: &[TestSpec]) -> TestSuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(specs.len());

        info!("Running {} scenario(s)...", specs.len());

        for spec in specs {
            let result = self.run_spec(spec).await;
            if result.success {
                info!("✓ {} ({}ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let suite =
            TestSuiteResult::from_results(started_at, start.elapsed().as_millis() as u64, results);
        info!(
            "{} passed, {} failed, {} total in {}ms",
            suite.passed, suite.failed, suite.total, suite.duration_ms
        );
        suite
    }

    /// Run one scenario and capture its outcome
    pub async fn run_spec(&self, spec: &TestSpec) -> TestResult {
        let start = Instant::now();
        debug!("Running scenario: {} ({:?})", spec.name, spec.flow);

        let outcome = match spec.flow {
            Flow::Isolation => self.run_isolation(spec).await,
            Flow::Driver => self.run_driver(spec).await,
        };

        TestResult {
            name: spec.name.clone(),
            flow: spec.flow,
            success: outcome.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    fn file_provider(&self, spec: &TestSpec) -> FileProvider {
        spec.fixture
            .clone()
            .or_else(|| self.config.fixture_path.clone())
            .map(FileProvider::FixedPath)
            .unwrap_or_default()
    }

    fn session_config(&self, spec: &TestSpec, target: SessionTarget) -> SessionConfig {
        SessionConfig {
            marker_timeout: std::time::Duration::from_millis(self.config.session.marker_timeout_ms),
            viewport: spec.viewport.unwrap_or(Viewport {
                width: self.config.session.viewport_width,
                height: self.config.session.viewport_height,
            }),
            headless: self.config.session.headless,
            node_binary: self.config.session.node_binary.clone(),
            script_dir: self.config.output_dir.join("scripts"),
            ..SessionConfig::new(target)
        }
    }

    /// Built frontend plus mocked bridge; no driver involved
    async fn run_isolation(&self, spec: &TestSpec) -> E2eResult<()> {
        let mock = BridgeMock::from_provider(&self.file_provider(spec));
        let target = SessionTarget::Page {
            url: self.config.index_url()?,
        };
        let session = RemoteSession::new(self.session_config(spec, target))?.with_bridge(&mock);
        session.run(&spec.name, &spec.steps).await
    }

    /// Real application behind tauri-driver
    async fn run_driver(&self, spec: &TestSpec) -> E2eResult<()> {
        let files = match self.file_provider(spec) {
            FileProvider::FixedPath(path) => {
                let path = absolute(&path)?;
                if FileProvider::fixed(&path).select().is_none() {
                    return Err(E2eError::InvalidConfig(format!(
                        "fixture {} is not an existing image",
                        path.display()
                    )));
                }
                FileProvider::FixedPath(path)
            }
            FileProvider::Dialog => FileProvider::Dialog,
        };

        let env = DriverEnv::from_process()?;
        let location = locator::resolve(&env, self.platform)?;

        // Dropping the handle on any early return tears the driver down.
        let mut driver = DriverProcess::spawn(DriverConfig::new(location, &self.config.driver), &files)?;
        driver.await_ready().await?;

        let target = SessionTarget::Driver {
            endpoint: driver.endpoint().clone(),
        };
        let outcome = match RemoteSession::new(self.session_config(spec, target)) {
            Ok(session) => session.run(&spec.name, &spec.steps).await,
            Err(e) => Err(e),
        };

        driver.shutdown().await;
        outcome
    }

    /// Write results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn absolute(path: &Path) -> E2eResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
