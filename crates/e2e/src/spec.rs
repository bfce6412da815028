//! Declarative YAML scenario specification

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{E2eError, E2eResult};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Which regime runs the scenario
    pub flow: Flow,

    /// Image the app treats as already selected; the runner default applies when unset
    #[serde(default)]
    pub fixture: Option<PathBuf>,

    /// Viewport size for the browser; the session settings apply when unset
    #[serde(default)]
    pub viewport: Option<Viewport>,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

/// How the application under test is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Built frontend loaded from disk with the mocked bridge
    Isolation,
    /// Real application behind tauri-driver
    Driver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a scenario
///
/// Markers are awaited; there is no sleep step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL, relative to the session's start page
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    /// Click an element
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Wait for a marker
    Wait {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
        #[serde(default)]
        state: WaitState,
    },

    /// Assert something about an element
    Assert {
        selector: String,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Execute custom JavaScript
    Evaluate {
        script: String,
        #[serde(default)]
        expected: Option<serde_json::Value>,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },
}

impl TestStep {
    /// Short label used in logs and failure reports
    pub fn label(&self) -> String {
        match self {
            TestStep::Navigate { url, .. } => format!("navigate:{}", url),
            TestStep::Click { selector, .. } => format!("click:{}", selector),
            TestStep::Wait { selector, .. } => format!("wait:{}", selector),
            TestStep::Assert { selector, .. } => format!("assert:{}", selector),
            TestStep::Evaluate { .. } => "evaluate".to_string(),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

impl TestSpec {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        if spec.steps.is_empty() {
            return Err(E2eError::SpecParse(format!("{} has no steps", spec.name)));
        }
        Ok(spec)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios from a directory, sorted by name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let spec = Self::from_file(entry.path())?;
            specs.push(spec);
        }

        specs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(specs)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }
}
