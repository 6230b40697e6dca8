// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for Oddbench
//!
//! Handles loading settings from ~/.oddbench/settings.json. Every field has
//! a serde default so a missing or partial settings file still yields a
//! working configuration; the `ODDBENCH_DATA_DIR` environment variable
//! overrides the data directory for deployments.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{OddbenchError, Result};

/// Cache lifetimes for the query layer.
///
/// The hardware list changes with every upload and gets a short TTL; detail
/// views are heavier to build and change just as rarely, so they keep a
/// longer one. Both are fallbacks, since uploads invalidate explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_list_ttl_secs")]
    pub list_ttl_secs: u64,
    #[serde(default = "default_detail_ttl_secs")]
    pub detail_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_ttl_secs: default_list_ttl_secs(),
            detail_ttl_secs: default_detail_ttl_secs(),
        }
    }
}

fn default_list_ttl_secs() -> u64 {
    60
}

fn default_detail_ttl_secs() -> u64 {
    300
}

/// Main settings structure, stored in ~/.oddbench/settings.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Where runs (and the derived index artifact) live.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Query-layer cache lifetimes.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache: CacheConfig::default(),
        }
    }
}

fn oddbench_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".oddbench")
}

fn default_data_dir() -> PathBuf {
    oddbench_home().join("data")
}

impl Settings {
    /// Path of the settings file.
    pub fn settings_path() -> PathBuf {
        oddbench_home().join("settings.json")
    }

    /// Load settings, falling back to defaults when no file exists.
    ///
    /// `ODDBENCH_DATA_DIR` overrides the configured data directory.
    pub fn load() -> Result<Self> {
        let path = Self::settings_path();
        let mut settings = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str(&text).map_err(|e| {
                OddbenchError::Config(format!("failed to parse {}: {}", path.display(), e))
            })?
        } else {
            Settings::default()
        };

        if let Ok(dir) = std::env::var("ODDBENCH_DATA_DIR") {
            if !dir.trim().is_empty() {
                settings.data_dir = PathBuf::from(dir);
            }
        }

        Ok(settings)
    }

    /// Create the data directory if it is missing.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.data_dir.ends_with("data"));
        assert_eq!(settings.cache.list_ttl_secs, 60);
        assert_eq!(settings.cache.detail_ttl_secs, 300);
    }

    #[test]
    fn test_partial_settings_file_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"data_dir": "/tmp/bench"}"#).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/bench"));
        assert_eq!(settings.cache.list_ttl_secs, 60);

        let settings: Settings =
            serde_json::from_str(r#"{"cache": {"list_ttl_secs": 5}}"#).unwrap();
        assert_eq!(settings.cache.list_ttl_secs, 5);
        assert_eq!(settings.cache.detail_ttl_secs, 300);
    }

    #[test]
    fn test_round_trip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.data_dir, settings.data_dir);
        assert_eq!(parsed.cache.list_ttl_secs, settings.cache.list_ttl_secs);
    }
}
