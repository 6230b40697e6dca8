// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Per-benchmark-type adapters
//!
//! Every supported benchmark tool gets one adapter implementing
//! [`BenchmarkAdapter`]: hardware extraction from that tool's result schema,
//! raw metric sample extraction, and pure aggregation of repeated runs.
//! Adapters are looked up through the [`AdapterRegistry`], so supporting a
//! new tool means registering one bundle rather than editing dispatch sites.
//!
//! Extraction is tolerant by contract: a payload missing expected fields
//! yields fewer samples or absent hardware facts, never an error. One broken
//! field must not discard the other nine.

pub mod blender;
pub mod llama;
pub mod reversan;
pub mod sevenzip;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fingerprint::HardwareKind;
use crate::hardware::HardwareInfo;

pub use blender::BlenderAdapter;
pub use llama::LlamaAdapter;
pub use reversan::ReversanAdapter;
pub use sevenzip::SevenZipAdapter;

/// One measured data point pulled out of a raw benchmark payload.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricSample {
    /// Compression throughput run at a given thread count.
    CompressionRun {
        threads: u32,
        elapsed_seconds: f64,
        efficiency_percent: Option<f64>,
        speedup: Option<f64>,
    },
    /// Game-tree search run at a given search depth.
    SearchDepthRun { depth: u32, seconds: f64 },
    /// Game-tree search run at a given thread count.
    SearchThreadRun { threads: u32, seconds: f64 },
    /// LLM inference run on one device class.
    InferenceRun {
        device: HardwareKind,
        device_slug: Option<String>,
        decode_tokens_per_sec: Option<f64>,
        prompt_tokens_per_sec: Option<f64>,
        total_time_ms: Option<f64>,
    },
    /// LLM engine build/compile timing.
    InferenceBuild { seconds: f64 },
    /// Render throughput for one scene on one device.
    RenderSceneRun {
        device_kind: HardwareKind,
        device_slug: String,
        scene: String,
        samples_per_minute: f64,
    },
}

/// The hardware record an aggregation is being computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationTarget {
    pub kind: HardwareKind,
    pub slug: String,
}

impl AggregationTarget {
    pub fn new(kind: HardwareKind, slug: impl Into<String>) -> Self {
        Self {
            kind,
            slug: slug.into(),
        }
    }
}

/// Median elapsed time and efficiency for one thread count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadGroup {
    pub threads: u32,
    pub median_elapsed_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_efficiency_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_speedup: Option<f64>,
}

/// Median search time for one depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthTiming {
    pub depth: u32,
    pub median_seconds: f64,
}

/// Median search time for one thread count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadTiming {
    pub threads: u32,
    pub median_seconds: f64,
}

/// Median render throughput for one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneTiming {
    pub scene: String,
    pub median_samples_per_minute: f64,
}

/// Aggregated statistics for one (hardware, benchmark type) pair.
///
/// Pure function of the contributing run set: recomputing from the same runs
/// always yields the same summary, regardless of input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BenchmarkSummary {
    #[serde(rename_all = "camelCase")]
    Compression {
        /// Per-thread-count medians, ascending by thread count.
        thread_groups: Vec<ThreadGroup>,
        best_threads: u32,
        best_median_elapsed_seconds: f64,
    },
    #[serde(rename_all = "camelCase")]
    TreeSearch {
        /// Per-depth medians, ascending by depth.
        depth_timings: Vec<DepthTiming>,
        /// Per-thread-count medians, ascending by thread count.
        thread_timings: Vec<ThreadTiming>,
        #[serde(skip_serializing_if = "Option::is_none")]
        best_depth10_seconds: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        best_thread_seconds: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Render {
        /// Per-scene medians, sorted by scene name.
        scene_timings: Vec<SceneTiming>,
    },
    /// Raw payloads of a benchmark type no adapter understands, carried
    /// through untouched so new tools degrade gracefully instead of
    /// vanishing.
    #[serde(rename_all = "camelCase")]
    Generic { raw_runs: Vec<Value> },
    // Every field here is optional, so this variant matches any object and
    // must stay last for untagged deserialization to resolve correctly.
    #[serde(rename_all = "camelCase")]
    Inference {
        #[serde(skip_serializing_if = "Option::is_none")]
        decode_tokens_per_sec_median: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        prompt_tokens_per_sec_median: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_time_ms_median: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        build_seconds_median: Option<f64>,
    },
}

impl BenchmarkSummary {
    /// Headline "best" figure for this summary, when one makes sense.
    pub fn best_value(&self) -> Option<f64> {
        match self {
            BenchmarkSummary::Compression {
                best_median_elapsed_seconds,
                ..
            } => Some(*best_median_elapsed_seconds),
            BenchmarkSummary::TreeSearch {
                best_thread_seconds,
                best_depth10_seconds,
                ..
            } => (*best_thread_seconds).or(*best_depth10_seconds),
            BenchmarkSummary::Inference {
                decode_tokens_per_sec_median,
                ..
            } => *decode_tokens_per_sec_median,
            BenchmarkSummary::Render { scene_timings } => scene_timings
                .iter()
                .map(|s| s.median_samples_per_minute)
                .fold(None, |best: Option<f64>, v| {
                    Some(best.map_or(v, |b| b.max(v)))
                }),
            BenchmarkSummary::Generic { .. } => None,
        }
    }

    /// Representative (median-based) figure for this summary.
    pub fn representative_value(&self) -> Option<f64> {
        match self {
            BenchmarkSummary::Compression { thread_groups, .. } => crate::stats::median(
                &thread_groups
                    .iter()
                    .map(|g| g.median_elapsed_seconds)
                    .collect::<Vec<_>>(),
            ),
            BenchmarkSummary::TreeSearch { depth_timings, .. } => crate::stats::median(
                &depth_timings
                    .iter()
                    .map(|d| d.median_seconds)
                    .collect::<Vec<_>>(),
            ),
            BenchmarkSummary::Inference {
                decode_tokens_per_sec_median,
                ..
            } => *decode_tokens_per_sec_median,
            BenchmarkSummary::Render { scene_timings } => crate::stats::median(
                &scene_timings
                    .iter()
                    .map(|s| s.median_samples_per_minute)
                    .collect::<Vec<_>>(),
            ),
            BenchmarkSummary::Generic { .. } => None,
        }
    }
}

/// Capability bundle for one benchmark tool.
pub trait BenchmarkAdapter: Send + Sync {
    /// Wire name of the benchmark type this adapter understands.
    fn kind(&self) -> &'static str;

    /// Alternate wire names seen from older runners.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether results of this type can belong to hardware of `kind`.
    fn applies_to(&self, kind: HardwareKind) -> bool;

    /// Pull hardware facts out of one payload into the accumulator.
    fn extract_hardware(&self, payload: &Value, out: &mut HardwareInfo);

    /// Pull raw metric samples out of one payload.
    fn extract_samples(&self, payload: &Value) -> Vec<MetricSample>;

    /// Reduce samples from any number of runs for one hardware target.
    ///
    /// Returns `None` when no sample applies to the target; the index then
    /// omits the entry rather than emitting zeros.
    fn aggregate(&self, target: &AggregationTarget, samples: &[MetricSample])
        -> Option<BenchmarkSummary>;
}

/// Registry mapping benchmark type names to adapters.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn BenchmarkAdapter>>,
}

impl AdapterRegistry {
    /// Registry with all built-in adapters.
    pub fn builtin() -> Self {
        let mut registry = Self {
            adapters: Vec::new(),
        };
        registry.register(Box::new(SevenZipAdapter));
        registry.register(Box::new(ReversanAdapter));
        registry.register(Box::new(LlamaAdapter));
        registry.register(Box::new(BlenderAdapter));
        registry
    }

    pub fn register(&mut self, adapter: Box<dyn BenchmarkAdapter>) {
        self.adapters.push(adapter);
    }

    /// Look up the adapter for a benchmark type name, if any.
    pub fn get(&self, benchmark_type: &str) -> Option<&dyn BenchmarkAdapter> {
        self.adapters
            .iter()
            .find(|a| a.kind() == benchmark_type || a.aliases().contains(&benchmark_type))
            .map(|a| a.as_ref())
    }

    /// Canonical names of all registered benchmark types.
    pub fn known_types(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.kind()).collect()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// Tolerant field access over serde_json::Value. Benchmark payloads are
// heterogeneous; every accessor degrades to None instead of failing.

pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

pub(crate) fn f64_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

pub(crate) fn u64_field(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(Value::as_u64)
}

pub(crate) fn u32_field(value: &Value, key: &str) -> Option<u32> {
    u64_field(value, key).and_then(|v| u32::try_from(v).ok())
}

pub(crate) fn bool_field(value: &Value, key: &str) -> Option<bool> {
    value.get(key).and_then(Value::as_bool)
}

pub(crate) fn array_field<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value.get(key).and_then(Value::as_array)
}

pub(crate) fn object_field<'a>(
    value: &'a Value,
    key: &str,
) -> Option<&'a serde_json::Map<String, Value>> {
    value.get(key).and_then(Value::as_object)
}

/// Shared extraction of the `meta` system block most runners emit:
/// CPU identity (plain string or object with `name`/`model`, `cores`,
/// `threads`), system memory and OS string.
pub(crate) fn extract_meta_system(payload: &Value, out: &mut HardwareInfo) {
    let Some(meta) = payload.get("meta") else {
        return;
    };

    match meta.get("cpu") {
        Some(Value::String(name)) if !name.trim().is_empty() => {
            out.add_cpu(crate::hardware::CpuInfo::new(name));
        }
        Some(cpu @ Value::Object(_)) => {
            let name = str_field(cpu, "name").or_else(|| str_field(cpu, "model"));
            if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
                let mut info = crate::hardware::CpuInfo::new(name);
                info.cores = u32_field(cpu, "cores");
                info.threads = u32_field(cpu, "threads");
                out.add_cpu(info);
            }
        }
        _ => {}
    }

    if let Some(mb) = u64_field(meta, "memory_mb") {
        out.note_memory_mb(mb);
    }
    if let Some(os) = str_field(meta, "os") {
        out.note_os(os);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_lookup_and_aliases() {
        let registry = AdapterRegistry::builtin();
        assert!(registry.get("7zip").is_some());
        assert!(registry.get("sevenzip").is_some(), "alias resolves");
        assert!(registry.get("reversan").is_some());
        assert!(registry.get("llama").is_some());
        assert!(registry.get("blender").is_some());
        assert!(registry.get("frobnicate").is_none());
    }

    #[test]
    fn test_known_types() {
        let registry = AdapterRegistry::builtin();
        let types = registry.known_types();
        assert_eq!(types, vec!["7zip", "reversan", "llama", "blender"]);
    }

    #[test]
    fn test_field_helpers_degrade_to_none() {
        let v = json!({"a": "x", "b": 2, "c": 2.5, "d": true, "e": [1], "f": {"k": 1}});
        assert_eq!(str_field(&v, "a"), Some("x"));
        assert_eq!(str_field(&v, "b"), None);
        assert_eq!(f64_field(&v, "c"), Some(2.5));
        assert_eq!(f64_field(&v, "b"), Some(2.0));
        assert_eq!(u32_field(&v, "b"), Some(2));
        assert_eq!(u32_field(&v, "c"), None);
        assert_eq!(bool_field(&v, "d"), Some(true));
        assert!(array_field(&v, "e").is_some());
        assert!(object_field(&v, "f").is_some());
        assert_eq!(str_field(&v, "missing"), None);
        assert_eq!(str_field(&json!(null), "a"), None);
    }

    #[test]
    fn test_summary_serialization_field_names() {
        let summary = BenchmarkSummary::Compression {
            thread_groups: vec![ThreadGroup {
                threads: 8,
                median_elapsed_seconds: 5.6,
                median_efficiency_percent: Some(48.0),
                median_speedup: None,
            }],
            best_threads: 8,
            best_median_elapsed_seconds: 5.6,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["bestThreads"], 8);
        assert_eq!(json["threadGroups"][0]["medianElapsedSeconds"], 5.6);
        assert!(json["threadGroups"][0].get("medianSpeedup").is_none());
    }
}
