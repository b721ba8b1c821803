//! Persisted application settings

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisError, FragmentKind, ThreadCount};

/// Settings file location: `$PLASTOME_TOOLKIT_SETTINGS`, else `~/.plastome_toolkit.json`.
pub static DEFAULT_SETTINGS_PATH: Lazy<PathBuf> = Lazy::new(|| {
    if let Some(path) = std::env::var_os("PLASTOME_TOOLKIT_SETTINGS") {
        return PathBuf::from(path);
    }
    match std::env::var_os("HOME") {
        Some(home) => Path::new(&home).join(".plastome_toolkit.json"),
        None => PathBuf::from("plastome_toolkit.json"),
    }
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub last_input_dir: Option<PathBuf>,
    pub last_output_dir: Option<PathBuf>,
    pub pi_window: usize,
    pub pi_step: usize,
    pub n_as_gap: bool,
    pub fragment_kind: FragmentKind,
    pub thread_count: ThreadCount,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            last_input_dir: None,
            last_output_dir: None,
            pi_window: 600,
            pi_step: 200,
            n_as_gap: false,
            fragment_kind: FragmentKind::Gene,
            thread_count: ThreadCount::Auto,
        }
    }
}

impl AppSettings {
    /// Load settings, falling back to defaults when the file is missing or malformed.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                debug!("no settings at {}, using defaults", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AnalysisError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }
}
