// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for Oddbench
//!
//! This module defines all error types used throughout the application.

use thiserror::Error;

/// Main error type for Oddbench operations
#[derive(Error, Debug)]
pub enum OddbenchError {
    /// Unparseable payload at the upload boundary; the run is rejected and
    /// nothing is written
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Query for a hardware id/kind that matches no known fingerprint
    #[error("{kind} '{id}' not found")]
    NotFound { kind: String, id: String },

    /// Disk failure while writing or reading a run; fatal for that single
    /// operation only, previously-written runs are untouched
    #[error("Storage error: {0}")]
    Store(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OddbenchError {
    /// Convenience constructor for query misses.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        OddbenchError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Whether this error is a structured query miss rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OddbenchError::NotFound { .. })
    }
}

/// Result type alias for Oddbench operations
pub type Result<T> = std::result::Result<T, OddbenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_display() {
        let err = OddbenchError::MalformedInput("bad json".to_string());
        assert!(err.to_string().contains("Malformed input"));
        assert!(err.to_string().contains("bad json"));
    }

    #[test]
    fn test_not_found_display() {
        let err = OddbenchError::not_found("cpu", "amd-ryzen-7-5700x3d");
        assert!(err.to_string().contains("cpu"));
        assert!(err.to_string().contains("amd-ryzen-7-5700x3d"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_store_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: OddbenchError = io_err.into();
        assert!(err.to_string().contains("Storage error"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_config_display() {
        let err = OddbenchError::Config("missing data dir".to_string());
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn ok() -> Result<u32> {
            Ok(7)
        }
        assert_eq!(ok().unwrap(), 7);
    }
}
