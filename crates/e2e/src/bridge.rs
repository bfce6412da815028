//! Mocked Tauri command bridge for frontend-only runs
//!
//! The frontend talks to its backend through `window.__TAURI__.invoke(cmd, args)`.
//! `BridgeMock` holds a fixed table of canned responses keyed by command name.
//! The same table is served two ways: [`BridgeMock::invoke`] answers in-process,
//! and [`BridgeMock::init_script`] renders it as JavaScript that the browser
//! context installs before any page script runs.
//!
//! Unknown commands resolve to `null` instead of failing, so commands added to
//! the real backend do not break unrelated mock runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::fixture::FileProvider;

pub const CHOOSE_FILE: &str = "choose_file";
pub const PREVIOUS_FILE: &str = "previous_file";
pub const NEXT_FILE: &str = "next_file";
pub const FIT_NOW: &str = "fit_now";
pub const QUICK_LOOK: &str = "quick_look";
pub const GET_SETTINGS: &str = "get_settings";
pub const SET_SETTINGS: &str = "set_settings";

/// How the mock answers one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MockResponse {
    /// Resolve with no payload
    Unit,
    /// Resolve with a fixed value
    Value { value: Value },
    /// Resolve with the fixture path, or `null` when there is none
    FixturePath,
    /// Resolve with the current settings
    Settings,
    /// Merge `args.update` into the settings and resolve with the result
    SettingsUpdate,
    /// Reject with a message
    Reject { message: String },
}

/// Viewer settings the frontend reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub aspect_lock: bool,
    pub fit_window: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aspect_lock: false,
            fit_window: true,
        }
    }
}

impl Settings {
    /// Apply a partial update.
    ///
    /// A missing `aspect_lock` keeps its prior value. A missing `fit_window`
    /// becomes `true` whatever it was before. Non-boolean values count as
    /// missing.
    pub fn merge(&self, update: &Value) -> Settings {
        let field = |name: &str| update.get(name).and_then(Value::as_bool);
        Settings {
            aspect_lock: field("aspect_lock").unwrap_or(self.aspect_lock),
            fit_window: field("fit_window").unwrap_or(true),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{command} rejected: {message}")]
pub struct BridgeError {
    pub command: String,
    pub message: String,
}

/// In-memory stand-in for the backend command channel. Lives for one page load.
#[derive(Debug, Clone)]
pub struct BridgeMock {
    table: BTreeMap<String, MockResponse>,
    fixture_path: Option<PathBuf>,
    settings: Settings,
}

impl BridgeMock {
    /// Mock with the default command table answering `choose_file` with `fixture_path`.
    pub fn new(fixture_path: Option<PathBuf>) -> Self {
        let table = [
            (CHOOSE_FILE, MockResponse::FixturePath),
            (PREVIOUS_FILE, MockResponse::Value { value: Value::Null }),
            (NEXT_FILE, MockResponse::Value { value: Value::Null }),
            (FIT_NOW, MockResponse::Unit),
            (QUICK_LOOK, MockResponse::Unit),
            (GET_SETTINGS, MockResponse::Settings),
            (SET_SETTINGS, MockResponse::SettingsUpdate),
        ]
        .into_iter()
        .map(|(name, response)| (name.to_string(), response))
        .collect();

        Self {
            table,
            fixture_path,
            settings: Settings::default(),
        }
    }

    pub fn from_provider(provider: &FileProvider) -> Self {
        Self::new(provider.fixture_path().map(Path::to_path_buf))
    }

    /// Replace or add the response for one command.
    pub fn with_command(mut self, name: impl Into<String>, response: MockResponse) -> Self {
        self.table.insert(name.into(), response);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn response_for(&self, command: &str) -> Option<&MockResponse> {
        self.table.get(command)
    }

    /// Answer a command the way the installed page mock would.
    pub fn invoke(&mut self, command: &str, args: &Value) -> Result<Value, BridgeError> {
        debug!("mock invoke {} {}", command, args);

        let Some(response) = self.table.get(command) else {
            return Ok(Value::Null);
        };

        match response {
            MockResponse::Unit => Ok(Value::Null),
            MockResponse::Value { value } => Ok(value.clone()),
            MockResponse::FixturePath => Ok(self
                .fixture_path
                .as_ref()
                .map(|path| Value::String(path.display().to_string()))
                .unwrap_or(Value::Null)),
            MockResponse::Settings => Ok(json!(self.settings)),
            MockResponse::SettingsUpdate => {
                let update = args.get("update").cloned().unwrap_or_else(|| json!({}));
                self.settings = self.settings.merge(&update);
                Ok(json!(self.settings))
            }
            MockResponse::Reject { message } => Err(BridgeError {
                command: command.to_string(),
                message: message.clone(),
            }),
        }
    }

    /// JavaScript that installs this mock as `window.__TAURI__`.
    ///
    /// Meant for `addInitScript`, so it runs before the application bundle.
    pub fn init_script(&self) -> String {
        let table = serde_json::to_string(&self.table).unwrap_or_else(|_| "{}".to_string());
        let settings = json!(self.settings).to_string();
        let fixture = json!(self
            .fixture_path
            .as_ref()
            .map(|path| path.display().to_string()))
        .to_string();

        format!(
            r#"(() => {{
  const table = {table};
  const fixturePath = {fixture};
  let settings = {settings};
  const flag = (update, name) =>
    typeof update[name] === 'boolean' ? update[name] : undefined;
  const invoke = (cmd, args = {{}}) => {{
    const entry = table[cmd];
    if (!entry) return Promise.resolve();
    switch (entry.kind) {{
      case 'value':
        return Promise.resolve(entry.value);
      case 'fixture_path':
        return Promise.resolve(fixturePath);
      case 'settings':
        return Promise.resolve({{ ...settings }});
      case 'settings_update': {{
        const update = (args && args.update) || {{}};
        settings = {{
          aspect_lock: flag(update, 'aspect_lock') ?? settings.aspect_lock,
          fit_window: flag(update, 'fit_window') ?? true,
        }};
        return Promise.resolve({{ ...settings }});
      }}
      case 'reject':
        return Promise.reject(new Error(entry.message));
      default:
        return Promise.resolve();
    }}
  }};
  window.__TAURI__ = {{ invoke, core: {{ invoke }} }};
}})();
"#
        )
    }
}
