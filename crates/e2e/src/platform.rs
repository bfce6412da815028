//! Host platform profile used when searching for executables

use std::path::PathBuf;

/// Executable naming rules for the host, picked once at harness start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformProfile {
    Posix,
    Windows,
}

/// Suffixes tried on Windows, in order.
const WINDOWS_SUFFIXES: [&str; 3] = ["exe", "cmd", "bat"];

impl PlatformProfile {
    pub fn current() -> Self {
        if cfg!(windows) {
            PlatformProfile::Windows
        } else {
            PlatformProfile::Posix
        }
    }

    /// File names that count as `base` on this platform.
    pub fn candidate_names(&self, base: &str) -> Vec<String> {
        match self {
            PlatformProfile::Posix => vec![base.to_string()],
            PlatformProfile::Windows => WINDOWS_SUFFIXES
                .iter()
                .map(|suffix| format!("{}.{}", base, suffix))
                .collect(),
        }
    }

    pub fn path_list_delimiter(&self) -> char {
        match self {
            PlatformProfile::Posix => ':',
            PlatformProfile::Windows => ';',
        }
    }

    /// Split a PATH-style value into directories, keeping order.
    pub fn split_search_path(&self, raw: &str) -> Vec<PathBuf> {
        raw.split(self.path_list_delimiter())
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(PathBuf::from)
            .collect()
    }
}
