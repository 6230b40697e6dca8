// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Hardware index derived from the run store
//!
//! The index is a materialized view: it is rebuilt by replaying every run
//! through hardware extraction and metric aggregation, grouped by hardware
//! fingerprint. Rebuilding from the same set of runs always yields an
//! identical structure (ordered containers throughout), which is what lets
//! the query layer cache it freely.

pub mod cache;

pub use cache::TtlCache;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::benchmarks::{AdapterRegistry, AggregationTarget, BenchmarkSummary, MetricSample};
use crate::error::{OddbenchError, Result};
use crate::fingerprint::{GpuFramework, HardwareKind, Manufacturer};
use crate::hardware::extract_from_benchmarks;
use crate::store::RunStore;

/// One distinct piece of hardware, as the read boundary serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareRecord {
    pub id: String,
    pub name: String,
    pub manufacturer: Manufacturer,
    pub kind: HardwareKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
    #[serde(rename = "memoryMB", skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<GpuFramework>,
    /// Benchmark type -> ids of the runs that reference this hardware.
    pub benchmarks: BTreeMap<String, Vec<String>>,
    /// Unix seconds of the newest contributing run.
    pub last_updated: i64,
}

/// A hardware record plus its aggregated statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareEntry {
    #[serde(flatten)]
    pub record: HardwareRecord,
    /// Benchmark type -> aggregated summary.
    pub summaries: BTreeMap<String, BenchmarkSummary>,
    /// Benchmark type -> headline figure, where one makes sense.
    pub best_performance: BTreeMap<String, f64>,
    /// Benchmark type -> representative (median-based) figure.
    pub average_performance: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMetadata {
    pub total_hardware: usize,
    pub total_benchmarks: usize,
    pub last_updated: i64,
    pub benchmark_types_known: Vec<String>,
}

/// The full queryable view over all runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub cpus: Vec<HardwareEntry>,
    pub gpus: Vec<HardwareEntry>,
    pub metadata: IndexMetadata,
}

impl Index {
    /// Find an entry by kind and id.
    pub fn find(&self, kind: HardwareKind, id: &str) -> Option<&HardwareEntry> {
        let list = match kind {
            HardwareKind::Cpu => &self.cpus,
            HardwareKind::Gpu => &self.gpus,
        };
        list.iter().find(|e| e.record.id == id)
    }
}

/// Per-fingerprint accumulator used while folding runs.
struct Accumulator {
    kind: HardwareKind,
    slug: String,
    name: String,
    manufacturer: Manufacturer,
    cores: Option<u32>,
    threads: Option<u32>,
    memory_mb: Option<u64>,
    framework: Option<GpuFramework>,
    benchmarks: BTreeMap<String, Vec<String>>,
    samples: BTreeMap<String, Vec<MetricSample>>,
    raw_payloads: BTreeMap<String, Vec<Value>>,
    last_updated: i64,
}

impl Accumulator {
    fn attach(&mut self, benchmark_type: &str, run_id: &str) {
        self.benchmarks
            .entry(benchmark_type.to_string())
            .or_default()
            .push(run_id.to_string());
    }
}

/// Builds the hardware index by replaying the run store.
pub struct IndexBuilder<'a> {
    store: &'a dyn RunStore,
    registry: &'a AdapterRegistry,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(store: &'a dyn RunStore, registry: &'a AdapterRegistry) -> Self {
        Self { store, registry }
    }

    /// Replay every run into a fresh index.
    ///
    /// A run that cannot be read or yields no hardware is skipped with a
    /// warning; it must not take the whole build down.
    pub fn build(&self) -> Result<Index> {
        let mut accumulators: Vec<Accumulator> = Vec::new();
        let mut types_seen: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();

        for run_ref in self.store.list_runs()? {
            let run = match self.store.read_run(&run_ref) {
                Ok(run) => run,
                Err(e @ (OddbenchError::NotFound { .. } | OddbenchError::Json(_))) => {
                    tracing::warn!(run_id = %run_ref.id, error = %e, "skipping unreadable run");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let hardware = if run.hardware.is_empty() {
                extract_from_benchmarks(self.registry, &run.payloads)
            } else {
                run.hardware.clone()
            };
            if hardware.is_empty() {
                tracing::warn!(run_id = %run.run_id, "run has no identifiable hardware; skipped");
                continue;
            }

            // Extract samples once per payload, then fan out to every
            // hardware record the benchmark type applies to.
            let mut extracted: BTreeMap<&str, Vec<MetricSample>> = BTreeMap::new();
            let mut unknown: BTreeMap<&str, &Value> = BTreeMap::new();
            for (benchmark_type, payload) in &run.payloads {
                types_seen.insert(benchmark_type.clone());
                match self.registry.get(benchmark_type) {
                    Some(adapter) => {
                        extracted.insert(benchmark_type, adapter.extract_samples(payload));
                    }
                    None => {
                        unknown.insert(benchmark_type, payload);
                    }
                }
            }

            for cpu in &hardware.cpus {
                let acc = Self::find_or_create(
                    &mut accumulators,
                    HardwareKind::Cpu,
                    &cpu.slug,
                    &cpu.name,
                    cpu.manufacturer,
                );
                if acc.cores.is_none() {
                    acc.cores = cpu.cores;
                }
                if acc.threads.is_none() {
                    acc.threads = cpu.threads;
                }
                Self::attach_run(acc, &run, &extracted, &unknown, self.registry);
            }

            for gpu in &hardware.gpus {
                let acc = Self::find_or_create(
                    &mut accumulators,
                    HardwareKind::Gpu,
                    &gpu.slug,
                    &gpu.name,
                    gpu.manufacturer,
                );
                if acc.memory_mb.is_none() {
                    acc.memory_mb = gpu.memory_mb;
                }
                if acc.framework.is_none() && gpu.framework != GpuFramework::Unknown {
                    acc.framework = Some(gpu.framework);
                }
                Self::attach_run(acc, &run, &extracted, &unknown, self.registry);
            }
        }

        let mut cpus = Vec::new();
        let mut gpus = Vec::new();
        let mut total_benchmarks = 0usize;
        let mut last_updated = 0i64;

        for acc in accumulators {
            let entry = Self::finish(acc, self.registry);
            total_benchmarks += entry.record.benchmarks.values().map(Vec::len).sum::<usize>();
            last_updated = last_updated.max(entry.record.last_updated);
            match entry.record.kind {
                HardwareKind::Cpu => cpus.push(entry),
                HardwareKind::Gpu => gpus.push(entry),
            }
        }

        // Stable listing order: vendor first, then name.
        let sort_key = |e: &HardwareEntry| {
            (
                e.record.manufacturer.as_str(),
                e.record.name.to_lowercase(),
                e.record.id.clone(),
            )
        };
        cpus.sort_by_key(sort_key);
        gpus.sort_by_key(sort_key);

        let metadata = IndexMetadata {
            total_hardware: cpus.len() + gpus.len(),
            total_benchmarks,
            last_updated,
            benchmark_types_known: types_seen.into_iter().collect(),
        };

        Ok(Index {
            cpus,
            gpus,
            metadata,
        })
    }

    fn find_or_create<'acc>(
        accumulators: &'acc mut Vec<Accumulator>,
        kind: HardwareKind,
        slug: &str,
        name: &str,
        manufacturer: Manufacturer,
    ) -> &'acc mut Accumulator {
        // Linear scan over accumulated fingerprints. Hardware catalogs hold
        // tens to low hundreds of entries, so this stays cheap.
        let position = accumulators
            .iter()
            .position(|a| a.kind == kind && a.slug == slug);
        match position {
            Some(i) => &mut accumulators[i],
            None => {
                accumulators.push(Accumulator {
                    kind,
                    slug: slug.to_string(),
                    name: name.to_string(),
                    manufacturer,
                    cores: None,
                    threads: None,
                    memory_mb: None,
                    framework: None,
                    benchmarks: BTreeMap::new(),
                    samples: BTreeMap::new(),
                    raw_payloads: BTreeMap::new(),
                    last_updated: 0,
                });
                accumulators.last_mut().expect("just pushed")
            }
        }
    }

    fn attach_run(
        acc: &mut Accumulator,
        run: &crate::store::RunRecord,
        extracted: &BTreeMap<&str, Vec<MetricSample>>,
        unknown: &BTreeMap<&str, &Value>,
        registry: &AdapterRegistry,
    ) {
        acc.last_updated = acc.last_updated.max(run.timestamp);

        for (benchmark_type, samples) in extracted {
            let adapter = registry.get(benchmark_type).expect("extracted via registry");
            if !adapter.applies_to(acc.kind) {
                continue;
            }
            acc.attach(benchmark_type, &run.run_id);
            acc.samples
                .entry((*benchmark_type).to_string())
                .or_default()
                .extend(samples.iter().cloned());
        }

        // Types no adapter understands still attach, so new benchmark tools
        // show up against the run's hardware instead of vanishing.
        for (benchmark_type, payload) in unknown {
            acc.attach(benchmark_type, &run.run_id);
            acc.raw_payloads
                .entry((*benchmark_type).to_string())
                .or_default()
                .push((*payload).clone());
        }
    }

    fn finish(acc: Accumulator, registry: &AdapterRegistry) -> HardwareEntry {
        let target = AggregationTarget::new(acc.kind, acc.slug.clone());

        let mut summaries: BTreeMap<String, BenchmarkSummary> = BTreeMap::new();
        for (benchmark_type, samples) in &acc.samples {
            let adapter = registry.get(benchmark_type).expect("samples via registry");
            if let Some(summary) = adapter.aggregate(&target, samples) {
                summaries.insert(benchmark_type.clone(), summary);
            }
        }
        for (benchmark_type, raw_runs) in acc.raw_payloads {
            summaries.insert(
                benchmark_type,
                BenchmarkSummary::Generic { raw_runs },
            );
        }

        let mut best_performance = BTreeMap::new();
        let mut average_performance = BTreeMap::new();
        for (benchmark_type, summary) in &summaries {
            if let Some(best) = summary.best_value() {
                best_performance.insert(benchmark_type.clone(), best);
            }
            if let Some(avg) = summary.representative_value() {
                average_performance.insert(benchmark_type.clone(), avg);
            }
        }

        HardwareEntry {
            record: HardwareRecord {
                id: acc.slug,
                name: acc.name,
                manufacturer: acc.manufacturer,
                kind: acc.kind,
                cores: acc.cores,
                threads: acc.threads,
                memory_mb: acc.memory_mb,
                framework: acc.framework,
                benchmarks: acc.benchmarks,
                last_updated: acc.last_updated,
            },
            summaries,
            best_performance,
            average_performance,
        }
    }
}
