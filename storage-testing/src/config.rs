// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TestingError};

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct LabConfig {
    pub log_level: LoggingLevel,
    pub log_to_disk: bool,
    /// Directory searched for spec names, instead of the bundled specs
    pub specs_dir: Option<PathBuf>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            // lab output goes to stdout too; keep the log quiet by default
            log_level: LoggingLevel::Warn,
            log_to_disk: false,
            specs_dir: None,
        }
    }
}

impl LabConfig {
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os("STORAGE_PRESENTABLE_CONFIG") {
            return PathBuf::from(path);
        }

        let config_home = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("/tmp"));

        config_home.join("storage-presentable").join("lab.toml")
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|error| TestingError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;

        toml::from_str(&raw).map_err(|error| TestingError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })
    }
}
