// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Query layer over the hardware index
//!
//! The [`Catalog`] is the narrow interface the transport layer talks to:
//! `ingest` on the write side, `list_hardware` / `get_hardware_detail` /
//! `search` / `stats` on the read side. Index builds are cache-fronted with
//! bounded TTLs; every successful ingest clears both caches so a fresh
//! upload is visible immediately, with the TTL as fallback when an
//! invalidation is ever skipped.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::benchmarks::AdapterRegistry;
use crate::config::CacheConfig;
use crate::error::{OddbenchError, Result};
use crate::fingerprint::HardwareKind;
use crate::hardware::extract_from_benchmarks;
use crate::index::{HardwareEntry, Index, IndexBuilder, TtlCache};
use crate::store::RunStore;
use crate::upload::{UploadOutcome, UploadRequest};

/// Raw payloads of one run, attached to detail responses so a caller can
/// render charts without re-querying the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPayloads {
    pub run_id: String,
    pub timestamp: i64,
    pub payloads: BTreeMap<String, Value>,
}

/// Detail response for one piece of hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareDetail {
    #[serde(flatten)]
    pub entry: HardwareEntry,
    pub runs: Vec<RunPayloads>,
}

/// Store-level counters, mirroring the statistics surface of the original
/// deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub cpu_count: usize,
    pub gpu_count: usize,
    pub total_runs: usize,
    /// Benchmark type -> number of stored result payloads.
    pub benchmark_counts: BTreeMap<String, usize>,
}

/// Cache key for detail lookups.
type DetailKey = (HardwareKind, String);

/// The query layer: cache-fronted reads plus the ingest entry point.
pub struct Catalog {
    store: Arc<dyn RunStore>,
    registry: Arc<AdapterRegistry>,
    list_cache: TtlCache<(), Index>,
    detail_cache: TtlCache<DetailKey, HardwareDetail>,
    /// Where to spill the freshly built index for external consumers.
    /// Never read back; the run store stays the source of truth.
    artifact_path: Option<std::path::PathBuf>,
}

impl Catalog {
    pub fn new(store: Arc<dyn RunStore>, registry: Arc<AdapterRegistry>, cache: &CacheConfig) -> Self {
        Self {
            store,
            registry,
            list_cache: TtlCache::new(Duration::from_secs(cache.list_ttl_secs)),
            detail_cache: TtlCache::new(Duration::from_secs(cache.detail_ttl_secs)),
            artifact_path: None,
        }
    }

    /// Also persist each fresh index build to `path` as a JSON artifact.
    pub fn with_index_artifact(mut self, path: std::path::PathBuf) -> Self {
        self.artifact_path = Some(path);
        self
    }

    /// Ingest one upload: normalize, extract hardware, persist, invalidate.
    ///
    /// Hardware facts are taken from the request override when supplied and
    /// extracted from the payloads otherwise. Nothing is written when the
    /// request was rejected at the boundary.
    pub fn ingest(&self, request: UploadRequest) -> Result<UploadOutcome> {
        let hardware = match request.hardware {
            Some(hardware) => hardware,
            None => extract_from_benchmarks(&self.registry, &request.payloads),
        };

        let run_ref = self.store.write_run(
            &hardware,
            &request.payloads,
            request.run_id.as_deref(),
            request.timestamp,
        )?;

        self.invalidate();

        Ok(UploadOutcome {
            run_id: run_ref.id,
            hardware_id: hardware.composite_id(),
            stored_benchmarks: request.payloads.keys().cloned().collect(),
        })
    }

    /// The full hardware index, cache-fronted.
    pub fn list_hardware(&self) -> Result<Index> {
        if let Some(index) = self.list_cache.get(&()) {
            tracing::debug!("hardware list served from cache");
            return Ok(index);
        }

        let index = IndexBuilder::new(self.store.as_ref(), &self.registry).build()?;
        self.write_index_artifact(&index);
        self.list_cache.put((), index.clone());
        Ok(index)
    }

    /// Best-effort spill of a fresh build; a failed write only warns because
    /// the artifact is a convenience copy, never authoritative.
    fn write_index_artifact(&self, index: &Index) {
        let Some(path) = &self.artifact_path else {
            return;
        };
        let result = (|| -> Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_string_pretty(index)?)?;
            Ok(())
        })();
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to write index artifact");
        }
    }

    /// Detail for one piece of hardware, including raw run payloads.
    ///
    /// Fails with a structured `NotFound` when no fingerprint of the
    /// requested kind matches `id`.
    pub fn get_hardware_detail(&self, kind: HardwareKind, id: &str) -> Result<HardwareDetail> {
        let key = (kind, id.to_string());
        if let Some(detail) = self.detail_cache.get(&key) {
            tracing::debug!(kind = %kind, id, "hardware detail served from cache");
            return Ok(detail);
        }

        let index = self.list_hardware()?;
        let entry = index
            .find(kind, id)
            .cloned()
            .ok_or_else(|| OddbenchError::not_found(kind.as_str(), id))?;

        // Attach the raw payloads of every contributing run, restricted to
        // the types that reference this hardware.
        let mut run_ids: Vec<&String> = entry.record.benchmarks.values().flatten().collect();
        run_ids.sort();
        run_ids.dedup();

        let mut runs = Vec::new();
        for run_id in run_ids {
            let record = match self.store.read_run(&crate::store::RunRef::new(run_id.clone())) {
                Ok(record) => record,
                Err(e) if e.is_not_found() => {
                    tracing::warn!(run_id = %run_id, "referenced run vanished; omitted from detail");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let payloads: BTreeMap<String, Value> = record
                .payloads
                .into_iter()
                .filter(|(t, _)| entry.record.benchmarks.contains_key(t))
                .collect();
            runs.push(RunPayloads {
                run_id: record.run_id,
                timestamp: record.timestamp,
                payloads,
            });
        }

        let detail = HardwareDetail { entry, runs };
        self.detail_cache.put(key, detail.clone());
        Ok(detail)
    }

    /// Case-insensitive substring search over name and manufacturer.
    pub fn search(&self, query: &str, kind: Option<HardwareKind>) -> Result<Vec<HardwareEntry>> {
        let index = self.list_hardware()?;
        let needle = query.to_lowercase();

        let candidates = match kind {
            Some(HardwareKind::Cpu) => index.cpus,
            Some(HardwareKind::Gpu) => index.gpus,
            None => {
                let mut all = index.cpus;
                all.extend(index.gpus);
                all
            }
        };

        Ok(candidates
            .into_iter()
            .filter(|e| {
                e.record.name.to_lowercase().contains(&needle)
                    || e.record
                        .manufacturer
                        .as_str()
                        .to_lowercase()
                        .contains(&needle)
            })
            .collect())
    }

    /// Store-level counters.
    pub fn stats(&self) -> Result<CatalogStats> {
        let index = self.list_hardware()?;
        let total_runs = self.store.list_runs()?.len();

        let mut benchmark_counts: BTreeMap<String, usize> = BTreeMap::new();
        for run_ref in self.store.list_runs()? {
            if let Ok(record) = self.store.read_run(&run_ref) {
                for benchmark_type in record.payloads.keys() {
                    *benchmark_counts.entry(benchmark_type.clone()).or_default() += 1;
                }
            }
        }

        Ok(CatalogStats {
            cpu_count: index.cpus.len(),
            gpu_count: index.gpus.len(),
            total_runs,
            benchmark_counts,
        })
    }

    /// Drop all cached views. Readers recompute on next access.
    pub fn invalidate(&self) {
        self.list_cache.clear();
        self.detail_cache.clear();
    }
}
