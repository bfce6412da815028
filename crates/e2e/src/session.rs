//! Remote session client driving Playwright through generated Node scripts
//!
//! A scenario becomes one script: open the start page (after installing the
//! bridge mock when there is one), then run every step against the same page.
//! Every wait and assertion carries an explicit timeout, so a missing marker
//! fails the scenario instead of hanging it.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

use crate::bridge::BridgeMock;
use crate::driver::Endpoint;
use crate::error::{E2eError, E2eResult};
use crate::spec::{TestStep, Viewport};

/// What the session opens first
#[derive(Debug, Clone)]
pub enum SessionTarget {
    /// A page URL, usually `file://.../dist/index.html`
    Page { url: String },
    /// The driver's local endpoint
    Driver { endpoint: Endpoint },
}

impl SessionTarget {
    pub fn start_url(&self) -> String {
        match self {
            SessionTarget::Page { url } => url.clone(),
            SessionTarget::Driver { endpoint } => format!("{}/", endpoint.base_url()),
        }
    }
}

/// Configuration for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub target: SessionTarget,
    pub marker_timeout: Duration,
    pub viewport: Viewport,
    pub headless: bool,
    pub node_binary: PathBuf,
    /// Generated scripts are kept here for debugging
    pub script_dir: PathBuf,
}

impl SessionConfig {
    pub fn new(target: SessionTarget) -> Self {
        Self {
            target,
            marker_timeout: Duration::from_secs(5),
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
            headless: true,
            node_binary: PathBuf::from("node"),
            script_dir: PathBuf::from("test-results/scripts"),
        }
    }
}

/// Failure report printed by the generated script
#[derive(Debug, Deserialize)]
struct ScriptFailure {
    step: String,
    error: String,
}

/// One browser session against the application
pub struct RemoteSession {
    config: SessionConfig,
    init_script: Option<String>,
}

impl RemoteSession {
    /// Create a session, checking that Playwright can be loaded
    pub fn new(config: SessionConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config.node_binary)?;
        std::fs::create_dir_all(&config.script_dir)?;
        Ok(Self::unchecked(config))
    }

    fn unchecked(config: SessionConfig) -> Self {
        Self {
            config,
            init_script: None,
        }
    }

    /// Install the bridge mock before any page script runs
    pub fn with_bridge(mut self, mock: &BridgeMock) -> Self {
        self.init_script = Some(mock.init_script());
        self
    }

    fn check_playwright_installed(node: &Path) -> E2eResult<()> {
        let status = Command::new(node)
            .args(["-e", "require.resolve('playwright')"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Playwright script for a scenario
    pub fn build_script(&self, steps: &[TestStep]) -> String {
        let mut script = String::new();

        script.push_str(&format!(
            r#"const {{ chromium }} = require('playwright');
const {{ expect }} = require('@playwright/test');

(async () => {{
  const browser = await chromium.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
"#,
            headless = self.config.headless,
            width = self.config.viewport.width,
            height = self.config.viewport.height,
        ));

        if let Some(init) = &self.init_script {
            script.push_str(&format!(
                "  await context.addInitScript({{ content: {} }});\n",
                js_str(init)
            ));
        }

        script.push_str(&format!(
            r#"  const page = await context.newPage();
  const baseUrl = {base_url};
  let current = 'open';

  try {{
    await page.goto(baseUrl);
"#,
            base_url = js_str(&self.config.target.start_url()),
        ));

        for (i, step) in steps.iter().enumerate() {
            script.push_str(&format!(
                "\n    // Step {}: {}\n    current = {};\n",
                i + 1,
                step.label(),
                js_str(&step.label())
            ));
            script.push_str(&self.step_to_js(step, i));
            script.push('\n');
        }

        script.push_str(
            r#"
    console.log(JSON.stringify({ success: true }));
  } catch (error) {
    console.error(JSON.stringify({ success: false, step: current, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    fn timeout_ms(&self, step_timeout: Option<u64>) -> u64 {
        step_timeout.unwrap_or(self.config.marker_timeout.as_millis() as u64)
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &TestStep, step_index: usize) -> String {
        match step {
            TestStep::Navigate {
                url,
                wait_for_selector,
            } => {
                let wait = wait_for_selector
                    .as_ref()
                    .map(|s| {
                        format!(
                            "\n    await page.waitForSelector({}, {{ timeout: {} }});",
                            js_str(s),
                            self.timeout_ms(None)
                        )
                    })
                    .unwrap_or_default();
                format!(
                    "    await page.goto(new URL({}, baseUrl).href);{}",
                    js_str(url),
                    wait
                )
            }
            TestStep::Click {
                selector,
                timeout_ms,
            } => format!(
                "    await page.click({}, {{ timeout: {} }});",
                js_str(selector),
                self.timeout_ms(*timeout_ms)
            ),
            TestStep::Wait {
                selector,
                timeout_ms,
                state,
            } => format!(
                "    await page.waitForSelector({}, {{ state: '{}', timeout: {} }});",
                js_str(selector),
                state.as_str(),
                self.timeout_ms(*timeout_ms)
            ),
            TestStep::Assert {
                selector,
                visible,
                text,
                text_contains,
                timeout_ms,
            } => {
                let locator = format!("page.locator({})", js_str(selector));
                let timeout = self.timeout_ms(*timeout_ms);
                let mut assertions = Vec::new();

                match visible {
                    Some(true) => assertions.push(format!(
                        "    await expect({}).toBeVisible({{ timeout: {} }});",
                        locator, timeout
                    )),
                    Some(false) => assertions.push(format!(
                        "    await expect({}).toBeHidden({{ timeout: {} }});",
                        locator, timeout
                    )),
                    None => {}
                }

                if let Some(t) = text {
                    assertions.push(format!(
                        "    await expect({}).toHaveText({}, {{ timeout: {} }});",
                        locator,
                        js_str(t),
                        timeout
                    ));
                }

                if let Some(tc) = text_contains {
                    assertions.push(format!(
                        "    await expect({}).toContainText({}, {{ timeout: {} }});",
                        locator,
                        js_str(tc),
                        timeout
                    ));
                }

                assertions.join("\n")
            }
            TestStep::Evaluate { script, expected } => {
                let mut js = format!(
                    "    const result_{} = await page.evaluate(() => {{ {} }});",
                    step_index, script
                );
                if let Some(expected) = expected {
                    js.push_str(&format!(
                        "\n    expect(result_{}).toEqual({});",
                        step_index, expected
                    ));
                }
                js
            }
            TestStep::Log { message } => {
                format!("    console.log('[TEST] ' + {});", js_str(message))
            }
        }
    }

    /// Run a scenario's steps in one browser session
    pub async fn run(&self, name: &str, steps: &[TestStep]) -> E2eResult<()> {
        let script = self.build_script(steps);
        let script_path = self.config.script_dir.join(format!("{}.js", sanitize(name)));
        std::fs::write(&script_path, &script)?;

        info!("Running scenario {} against {}", name, self.config.target.start_url());
        debug!("Playwright script: {}", script_path.display());

        // A cancelled scenario must not leave Playwright and its browser behind
        let output = TokioCommand::new(&self.config.node_binary)
            .arg(&script_path)
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        Err(classify_failure(&stdout, &stderr))
    }
}

/// Encode a string as a JavaScript literal
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn timeout_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Timeout \d+ms exceeded|Timed out \d+ms waiting").expect("valid timeout regex"))
}

/// Turn a failed script run into an error; timeouts name the step that hung
fn classify_failure(stdout: &str, stderr: &str) -> E2eError {
    let report = stderr
        .lines()
        .rev()
        .find_map(|line| serde_json::from_str::<ScriptFailure>(line.trim()).ok());

    match report {
        Some(failure) if timeout_pattern().is_match(&failure.error) => {
            E2eError::AssertionTimeout(failure.step)
        }
        Some(failure) => E2eError::Playwright(format!("{}: {}", failure.step, failure.error)),
        None => E2eError::Playwright(format!(
            "Script failed:\nstdout: {}\nstderr: {}",
            stdout, stderr
        )),
    }
}
