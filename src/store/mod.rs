// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Run storage
//!
//! Uploads persist as append-only, immutable records: one record per run,
//! holding one raw JSON payload per benchmark type plus a hardware sidecar.
//! The store is the source of truth; every derived view (the hardware index,
//! caches) must be fully reconstructable by replaying all runs.
//!
//! The [`RunStore`] trait is the seam: Extractor, Aggregator and Index
//! Builder only ever see `write`/`list`/`read`, so the backing can move from
//! the filesystem to an object store or embedded KV without touching them.

mod fs;

pub use fs::FsRunStore;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::hardware::HardwareInfo;

/// Reference to one stored run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunRef {
    pub id: String,
}

impl RunRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One stored run, loaded back from the store.
///
/// Immutable once written: readers never observe partial mutation, only
/// partially *present* payload files (which degrade to absent entries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    /// Unix seconds at which the run was recorded.
    pub timestamp: i64,
    pub hardware: HardwareInfo,
    /// Raw benchmark payloads keyed by benchmark type.
    pub payloads: BTreeMap<String, Value>,
}

/// Append-only persistence of benchmark runs.
pub trait RunStore: Send + Sync {
    /// Persist one run, never overwriting an existing one.
    ///
    /// When `run_id` is absent an id is derived as
    /// `{timestamp}_{cpu_slug}[_{gpu_slug}]`; collisions are disambiguated
    /// with a numeric suffix and retried.
    fn write_run(
        &self,
        hardware: &HardwareInfo,
        payloads: &BTreeMap<String, Value>,
        run_id: Option<&str>,
        timestamp: Option<i64>,
    ) -> Result<RunRef>;

    /// All run references currently on the store, in stable (sorted) order.
    /// Re-listing re-reads the store.
    fn list_runs(&self) -> Result<Vec<RunRef>>;

    /// Load one run. Fails with `NotFound` when the run or its hardware
    /// sidecar is missing; missing individual payload files degrade to
    /// absent entries instead of failing.
    fn read_run(&self, run: &RunRef) -> Result<RunRecord>;
}

/// Derive the run id from timestamp and hardware slugs.
pub(crate) fn derive_run_id(hardware: &HardwareInfo, timestamp: i64) -> String {
    let mut id = timestamp.to_string();
    if let Some(cpu) = hardware.primary_cpu() {
        id.push('_');
        id.push_str(&cpu.slug);
    }
    if let Some(gpu) = hardware.primary_gpu() {
        id.push('_');
        id.push_str(&gpu.slug);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{CpuInfo, GpuInfo};

    #[test]
    fn test_derive_run_id_cpu_only() {
        let mut hw = HardwareInfo::new();
        hw.add_cpu(CpuInfo::new("AMD Ryzen 7 5700X3D 8-Core Processor"));
        assert_eq!(
            derive_run_id(&hw, 1754000000),
            "1754000000_amd-ryzen-7-5700x3d-8-core"
        );
    }

    #[test]
    fn test_derive_run_id_with_gpu() {
        let mut hw = HardwareInfo::new();
        hw.add_cpu(CpuInfo::new("AMD Ryzen 7 5700X3D"));
        hw.add_gpu(GpuInfo::new("NVIDIA GeForce RTX 4070"));
        assert_eq!(
            derive_run_id(&hw, 1754000000),
            "1754000000_amd-ryzen-7-5700x3d_nvidia-geforce-rtx-4070"
        );
    }

    #[test]
    fn test_derive_run_id_no_hardware() {
        assert_eq!(derive_run_id(&HardwareInfo::new(), 1754000000), "1754000000");
    }
}
