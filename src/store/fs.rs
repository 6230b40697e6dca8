// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Filesystem-backed run store
//!
//! Layout under the data directory:
//!
//! ```text
//! runs/
//!   {run_id}/
//!     hardware.json     <- sidecar: id, timestamp, hardware facts, types
//!     {type}.json       <- one raw payload per benchmark type
//! ```
//!
//! Known race window: run-directory creation is the only cross-process
//! mutual exclusion. Two writers sharing a second-resolution timestamp and
//! hardware slug race between the failed `create_dir` and the suffixed
//! retry; the loser of the directory creation retries with the next suffix,
//! but the check-then-create pair itself is not atomic across processes.
//! Accepted: uploads are rare relative to reads.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OddbenchError, Result};
use crate::hardware::HardwareInfo;

use super::{derive_run_id, RunRecord, RunRef, RunStore};

/// Attempts at suffixed run ids before giving up on a pathological store.
const MAX_COLLISION_RETRIES: u32 = 1000;

/// Hardware sidecar written next to the payload files.
#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    /// Format version for forward compatibility.
    version: u32,
    run_id: String,
    timestamp: i64,
    hardware: HardwareInfo,
    /// Benchmark types this run declared at write time.
    benchmark_types: Vec<String>,
}

impl Sidecar {
    const VERSION: u32 = 1;
}

pub struct FsRunStore {
    root: PathBuf,
}

impl FsRunStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join("runs"))?;
        Ok(Self { root })
    }

    fn runs_dir(&self) -> PathBuf {
        self.root.join("runs")
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.runs_dir().join(run_id)
    }

    /// File names come from benchmark type keys supplied by uploaders; keep
    /// them to a safe character set.
    fn payload_file_name(benchmark_type: &str) -> String {
        let safe: String = benchmark_type
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        format!("{}.json", if safe.is_empty() { "payload".to_string() } else { safe })
    }

    /// Create the run directory, disambiguating id collisions with a numeric
    /// suffix. Directory creation doubles as the existence check so two
    /// writers cannot both claim the same id.
    fn claim_run_dir(&self, base_id: &str) -> Result<(String, PathBuf)> {
        for attempt in 0..MAX_COLLISION_RETRIES {
            let candidate = if attempt == 0 {
                base_id.to_string()
            } else {
                format!("{}-{}", base_id, attempt + 1)
            };
            let dir = self.run_dir(&candidate);
            match std::fs::create_dir(&dir) {
                Ok(()) => return Ok((candidate, dir)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(OddbenchError::Config(format!(
            "could not find a free run id after {} attempts (base '{}')",
            MAX_COLLISION_RETRIES, base_id
        )))
    }

    fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
        let text = serde_json::to_string_pretty(value)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

impl RunStore for FsRunStore {
    fn write_run(
        &self,
        hardware: &HardwareInfo,
        payloads: &BTreeMap<String, Value>,
        run_id: Option<&str>,
        timestamp: Option<i64>,
    ) -> Result<RunRef> {
        let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp());
        let base_id = match run_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => derive_run_id(hardware, timestamp),
        };

        let (claimed_id, dir) = self.claim_run_dir(&base_id)?;

        let sidecar = Sidecar {
            version: Sidecar::VERSION,
            run_id: claimed_id.clone(),
            timestamp,
            hardware: hardware.clone(),
            benchmark_types: payloads.keys().cloned().collect(),
        };
        Self::write_json(&dir.join("hardware.json"), &sidecar)?;

        for (benchmark_type, payload) in payloads {
            Self::write_json(&dir.join(Self::payload_file_name(benchmark_type)), payload)?;
        }

        tracing::info!(run_id = %claimed_id, types = payloads.len(), "stored benchmark run");
        Ok(RunRef::new(claimed_id))
    }

    fn list_runs(&self) -> Result<Vec<RunRef>> {
        let mut refs = Vec::new();
        let entries = match std::fs::read_dir(self.runs_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(refs),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                refs.push(RunRef::new(name));
            }
        }

        refs.sort();
        Ok(refs)
    }

    fn read_run(&self, run: &RunRef) -> Result<RunRecord> {
        let dir = self.run_dir(&run.id);
        let sidecar_path = dir.join("hardware.json");

        let sidecar_text = match std::fs::read_to_string(&sidecar_path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(OddbenchError::not_found("run", &run.id));
            }
            Err(e) => return Err(e.into()),
        };
        let sidecar: Sidecar = serde_json::from_str(&sidecar_text)?;

        let mut payloads = BTreeMap::new();
        for benchmark_type in &sidecar.benchmark_types {
            let path = dir.join(Self::payload_file_name(benchmark_type));
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    // A declared payload file that vanished degrades to "no
                    // data for this type" rather than failing the read.
                    tracing::warn!(
                        run_id = %run.id,
                        benchmark_type = %benchmark_type,
                        "declared payload file missing"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match serde_json::from_str::<Value>(&text) {
                Ok(payload) => {
                    payloads.insert(benchmark_type.clone(), payload);
                }
                Err(e) => {
                    tracing::warn!(
                        run_id = %run.id,
                        benchmark_type = %benchmark_type,
                        error = %e,
                        "unreadable payload file skipped"
                    );
                }
            }
        }

        Ok(RunRecord {
            run_id: sidecar.run_id,
            timestamp: sidecar.timestamp,
            hardware: sidecar.hardware,
            payloads,
        })
    }
}
