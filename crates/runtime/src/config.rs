// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! extract_mode = "scratch"
//! scratch_dir = "/var/tmp/pack-rt"
//! enable_profiling = true
//! validate_caller_inputs = true
//! ```

use std::path::{Path, PathBuf};

/// How archive packages are opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractMode {
    /// Serve files straight from the archive bytes (memory-mapped for files).
    #[default]
    InMemory,
    /// Extract into a scratch directory removed on release.
    Scratch,
}

impl ExtractMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractMode::InMemory => "in-memory",
            ExtractMode::Scratch => "scratch",
        }
    }
}

/// Configuration for loading and running packages.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub extract_mode: ExtractMode,
    /// Parent directory for scratch extraction (system temp dir if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    /// Whether to collect and log per-node metrics on every compute.
    #[serde(default = "default_true")]
    pub enable_profiling: bool,
    /// Whether to check caller inputs against the manifest's declared shapes.
    #[serde(default = "default_true")]
    pub validate_caller_inputs: bool,
}

fn default_true() -> bool {
    true
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, super::RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            super::RuntimeError::ConfigError(format!(
                "cannot read config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, super::RuntimeError> {
        toml::from_str(toml_str)
            .map_err(|e| super::RuntimeError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, super::RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| super::RuntimeError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Creates a fresh scratch directory for one package.
    pub(crate) fn create_scratch_dir(&self) -> Result<tempfile::TempDir, super::RuntimeError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pack-rt-");
        let dir = match &self.scratch_dir {
            Some(parent) => builder.tempdir_in(parent).map_err(|source| super::RuntimeError::Io {
                path: parent.clone(),
                source,
            })?,
            None => builder.tempdir().map_err(|source| super::RuntimeError::Io {
                path: std::env::temp_dir(),
                source,
            })?,
        };
        Ok(dir)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            extract_mode: ExtractMode::InMemory,
            scratch_dir: None,
            enable_profiling: true,
            validate_caller_inputs: true,
        }
    }
}
