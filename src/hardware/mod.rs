// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Accumulated hardware facts for one benchmark run
//!
//! Each benchmark tool reports hardware under its own schema; the per-type
//! adapters pull whatever facts they can find into a shared [`HardwareInfo`]
//! accumulator. Deduplication happens during accumulation: a payload that
//! mentions the same device twice (a tool quirk that does happen) still
//! produces a single entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::benchmarks::AdapterRegistry;
use crate::fingerprint::{detect_manufacturer, slugify, Fingerprint, GpuFramework, HardwareKind, Manufacturer};

/// Longest composite hardware id we will generate.
const MAX_COMPOSITE_ID_LEN: usize = 100;

/// CPU facts extracted from a run's payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub name: String,
    pub manufacturer: Manufacturer,
    pub slug: String,
    pub cores: Option<u32>,
    pub threads: Option<u32>,
}

impl CpuInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.split_whitespace().collect::<Vec<_>>().join(" "),
            manufacturer: detect_manufacturer(HardwareKind::Cpu, name),
            slug: slugify(name),
            cores: None,
            threads: None,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            kind: HardwareKind::Cpu,
            canonical_name: self.name.clone(),
            manufacturer: self.manufacturer,
            slug: self.slug.clone(),
        }
    }
}

/// GPU facts extracted from a run's payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuInfo {
    pub name: String,
    pub manufacturer: Manufacturer,
    pub slug: String,
    pub framework: GpuFramework,
    pub memory_mb: Option<u64>,
}

impl GpuInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.split_whitespace().collect::<Vec<_>>().join(" "),
            manufacturer: detect_manufacturer(HardwareKind::Gpu, name),
            slug: slugify(name),
            framework: GpuFramework::Unknown,
            memory_mb: None,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            kind: HardwareKind::Gpu,
            canonical_name: self.name.clone(),
            manufacturer: self.manufacturer,
            slug: self.slug.clone(),
        }
    }
}

/// All hardware facts known about one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInfo {
    #[serde(default)]
    pub cpus: Vec<CpuInfo>,
    #[serde(default)]
    pub gpus: Vec<GpuInfo>,
    /// System memory in MB. First-write-wins across adapters.
    #[serde(default)]
    pub memory_mb: Option<u64>,
    /// OS description string. First-write-wins across adapters.
    #[serde(default)]
    pub os: Option<String>,
}

impl HardwareInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no device was identified at all.
    pub fn is_empty(&self) -> bool {
        self.cpus.is_empty() && self.gpus.is_empty()
    }

    /// Add a CPU, deduplicating against devices already seen this run.
    ///
    /// On a duplicate sighting, missing core/thread counts are filled in but
    /// existing values are kept.
    pub fn add_cpu(&mut self, cpu: CpuInfo) {
        if let Some(existing) = self.cpus.iter_mut().find(|c| c.slug == cpu.slug) {
            if existing.cores.is_none() {
                existing.cores = cpu.cores;
            }
            if existing.threads.is_none() {
                existing.threads = cpu.threads;
            }
            return;
        }
        self.cpus.push(cpu);
    }

    /// Add a GPU, deduplicating against devices already seen this run.
    pub fn add_gpu(&mut self, gpu: GpuInfo) {
        if let Some(existing) = self.gpus.iter_mut().find(|g| g.slug == gpu.slug) {
            if existing.memory_mb.is_none() {
                existing.memory_mb = gpu.memory_mb;
            }
            if existing.framework == GpuFramework::Unknown {
                existing.framework = gpu.framework;
            }
            return;
        }
        self.gpus.push(gpu);
    }

    /// Record system memory if not already known.
    pub fn note_memory_mb(&mut self, memory_mb: u64) {
        if self.memory_mb.is_none() {
            self.memory_mb = Some(memory_mb);
        }
    }

    /// Record the OS string if not already known.
    pub fn note_os(&mut self, os: &str) {
        if self.os.is_none() && !os.trim().is_empty() {
            self.os = Some(os.trim().to_string());
        }
    }

    pub fn primary_cpu(&self) -> Option<&CpuInfo> {
        self.cpus.first()
    }

    pub fn primary_gpu(&self) -> Option<&GpuInfo> {
        self.gpus.first()
    }

    /// Stable composite id for the run's hardware configuration.
    ///
    /// Fragments are emitted in fixed order (cpu, gpu, mem), each group
    /// sorted by slug, so identical hardware yields the identical id across
    /// independent runs regardless of extraction order. Capped at 100 chars.
    pub fn composite_id(&self) -> String {
        let mut fragments: Vec<String> = Vec::new();

        let mut cpu_slugs: Vec<&str> = self.cpus.iter().map(|c| c.slug.as_str()).collect();
        cpu_slugs.sort_unstable();
        for slug in cpu_slugs {
            fragments.push(format!("cpu-{}", slug));
        }

        let mut gpu_slugs: Vec<&str> = self.gpus.iter().map(|g| g.slug.as_str()).collect();
        gpu_slugs.sort_unstable();
        for slug in gpu_slugs {
            fragments.push(format!("gpu-{}", slug));
        }

        if let Some(mb) = self.memory_mb {
            fragments.push(format!("mem-{}", slugify(&mb.to_string())));
        }

        let id = fragments.join("_");
        if id.is_empty() {
            "unknown".to_string()
        } else {
            id.chars().take(MAX_COMPOSITE_ID_LEN).collect()
        }
    }
}

/// Run every registered adapter over one run's payload set.
///
/// Unknown benchmark types contribute no hardware facts; their payloads are
/// still stored and carried through the index untouched.
pub fn extract_from_benchmarks(
    registry: &AdapterRegistry,
    payloads: &BTreeMap<String, Value>,
) -> HardwareInfo {
    let mut info = HardwareInfo::new();
    for (benchmark_type, payload) in payloads {
        match registry.get(benchmark_type) {
            Some(adapter) => adapter.extract_hardware(payload, &mut info),
            None => {
                tracing::debug!(
                    benchmark_type = %benchmark_type,
                    "no adapter; skipping hardware extraction"
                );
            }
        }
    }
    info
}
