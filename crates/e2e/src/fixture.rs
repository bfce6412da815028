//! File-selection seam between the harness and the application
//!
//! The application honors `AOT_TEST_PATH`: when it names an existing image,
//! the Open action selects it without showing a native dialog. `FileProvider`
//! is the typed form of that contract.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Variable the application reads to skip its file dialog.
pub const FIXTURE_PATH_ENV: &str = "AOT_TEST_PATH";

/// Older name still accepted by the application.
pub const LEGACY_FIXTURE_PATH_ENV: &str = "FLOAT_TEST_PATH";

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff", "heic",
];

/// Where a file selection comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileProvider {
    /// The user picks through the native dialog
    #[default]
    Dialog,
    /// A fixture path stands in for the pick
    FixedPath(PathBuf),
}

impl FileProvider {
    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        FileProvider::FixedPath(path.into())
    }

    /// Read the provider the application would use from the process environment.
    pub fn from_env() -> Self {
        let lookup = |key: &str| std::env::var(key).ok();
        Self::from_lookup(lookup)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // The application checks the legacy name first.
        match lookup(LEGACY_FIXTURE_PATH_ENV).or_else(|| lookup(FIXTURE_PATH_ENV)) {
            Some(value) if !value.is_empty() => FileProvider::FixedPath(PathBuf::from(value)),
            _ => FileProvider::Dialog,
        }
    }

    /// Variables to inject into the application's environment.
    pub fn env_overrides(&self) -> Vec<(String, String)> {
        match self {
            FileProvider::Dialog => Vec::new(),
            FileProvider::FixedPath(path) => {
                vec![(FIXTURE_PATH_ENV.to_string(), path.display().to_string())]
            }
        }
    }

    /// Whether `key` is one of the names the application reads for a fixture.
    pub fn is_selection_var(key: &str) -> bool {
        key == FIXTURE_PATH_ENV || key == LEGACY_FIXTURE_PATH_ENV
    }

    pub fn fixture_path(&self) -> Option<&Path> {
        match self {
            FileProvider::Dialog => None,
            FileProvider::FixedPath(path) => Some(path),
        }
    }

    /// The file the application ends up with, without any dialog.
    pub fn select(&self) -> Option<PathBuf> {
        match self {
            FileProvider::Dialog => None,
            FileProvider::FixedPath(path) if path.exists() && is_image_path(path) => {
                Some(path.clone())
            }
            FileProvider::FixedPath(_) => None,
        }
    }
}

/// Whether the application would accept this file as an image.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.to_ascii_lowercase())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Text the `#fileName` region shows for a selected path.
pub fn display_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
