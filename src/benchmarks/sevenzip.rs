// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! 7-Zip compression benchmark adapter
//!
//! Thread-scalable compression throughput. Runs report per-thread-count
//! elapsed time, speedup over single-threaded and thread efficiency; only
//! successful runs count toward statistics.

use serde_json::Value;

use crate::fingerprint::HardwareKind;
use crate::hardware::HardwareInfo;
use crate::stats::median;

use super::{
    array_field, bool_field, extract_meta_system, f64_field, u32_field, AggregationTarget,
    BenchmarkAdapter, BenchmarkSummary, MetricSample, ThreadGroup,
};

pub struct SevenZipAdapter;

impl BenchmarkAdapter for SevenZipAdapter {
    fn kind(&self) -> &'static str {
        "7zip"
    }

    fn aliases(&self) -> &'static [&'static str] {
        // Older runners used a spelled-out key; both land here.
        &["sevenzip"]
    }

    fn applies_to(&self, kind: HardwareKind) -> bool {
        kind == HardwareKind::Cpu
    }

    fn extract_hardware(&self, payload: &Value, out: &mut HardwareInfo) {
        extract_meta_system(payload, out);
    }

    fn extract_samples(&self, payload: &Value) -> Vec<MetricSample> {
        let Some(runs) = array_field(payload, "runs") else {
            return Vec::new();
        };

        let mut samples = Vec::new();
        for run in runs {
            // A missing success flag counts as success; an explicit false
            // excludes the run entirely.
            if !bool_field(run, "success").unwrap_or(true) {
                continue;
            }
            let (Some(threads), Some(elapsed)) =
                (u32_field(run, "threads"), f64_field(run, "elapsed_seconds"))
            else {
                continue;
            };
            samples.push(MetricSample::CompressionRun {
                threads,
                elapsed_seconds: elapsed,
                efficiency_percent: f64_field(run, "thread_efficiency_percent"),
                speedup: f64_field(run, "speedup"),
            });
        }
        samples
    }

    fn aggregate(
        &self,
        target: &AggregationTarget,
        samples: &[MetricSample],
    ) -> Option<BenchmarkSummary> {
        if target.kind != HardwareKind::Cpu {
            return None;
        }

        // threads -> (elapsed, efficiency, speedup) sample vectors. BTreeMap
        // keeps groups ascending by thread count independent of input order.
        let mut groups: std::collections::BTreeMap<u32, (Vec<f64>, Vec<f64>, Vec<f64>)> =
            std::collections::BTreeMap::new();

        for sample in samples {
            if let MetricSample::CompressionRun {
                threads,
                elapsed_seconds,
                efficiency_percent,
                speedup,
            } = sample
            {
                let entry = groups.entry(*threads).or_default();
                entry.0.push(*elapsed_seconds);
                if let Some(eff) = efficiency_percent {
                    entry.1.push(*eff);
                }
                if let Some(s) = speedup {
                    entry.2.push(*s);
                }
            }
        }

        let mut thread_groups = Vec::new();
        for (threads, (elapsed, efficiency, speedup)) in &groups {
            // A thread count with zero successful runs never reaches this
            // point; it is omitted from output rather than zero-filled.
            let Some(median_elapsed) = median(elapsed) else {
                continue;
            };
            thread_groups.push(ThreadGroup {
                threads: *threads,
                median_elapsed_seconds: median_elapsed,
                median_efficiency_percent: median(efficiency),
                median_speedup: median(speedup),
            });
        }

        let (best_threads, best_median_elapsed_seconds) = thread_groups
            .iter()
            .fold(None::<&ThreadGroup>, |best, g| match best {
                Some(b) if b.median_elapsed_seconds <= g.median_elapsed_seconds => Some(b),
                _ => Some(g),
            })
            .map(|g| (g.threads, g.median_elapsed_seconds))?;

        Some(BenchmarkSummary::Compression {
            thread_groups,
            best_threads,
            best_median_elapsed_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "meta": {
                "cpu": {"name": "AMD Ryzen 7 5700X3D 8-Core Processor", "cores": 8, "threads": 16},
                "memory_mb": 32768,
                "os": "Linux 6.8"
            },
            "runs": [
                {"threads": 1, "elapsed_seconds": 21.5, "speedup": 1.0, "thread_efficiency_percent": 100.0, "success": true},
                {"threads": 4, "elapsed_seconds": 9.0, "success": false},
                {"threads": 8, "elapsed_seconds": 5.6, "speedup": 3.84, "thread_efficiency_percent": 48.0, "success": true}
            ]
        })
    }

    #[test]
    fn test_extract_hardware() {
        let mut info = HardwareInfo::new();
        SevenZipAdapter.extract_hardware(&payload(), &mut info);

        assert_eq!(info.cpus.len(), 1);
        assert_eq!(info.cpus[0].cores, Some(8));
        assert_eq!(info.cpus[0].threads, Some(16));
        assert_eq!(info.memory_mb, Some(32768));
        assert_eq!(info.os.as_deref(), Some("Linux 6.8"));
    }

    #[test]
    fn test_failed_runs_are_excluded() {
        let samples = SevenZipAdapter.extract_samples(&payload());
        assert_eq!(samples.len(), 2, "the threads=4 failure contributes nothing");
    }

    #[test]
    fn test_aggregate_two_groups_best_is_eight() {
        let samples = SevenZipAdapter.extract_samples(&payload());
        let target = AggregationTarget::new(HardwareKind::Cpu, "amd-ryzen-7-5700x3d-8-core");
        let summary = SevenZipAdapter.aggregate(&target, &samples).unwrap();

        let BenchmarkSummary::Compression {
            thread_groups,
            best_threads,
            best_median_elapsed_seconds,
        } = summary
        else {
            panic!("expected compression summary");
        };

        assert_eq!(thread_groups.len(), 2);
        assert_eq!(thread_groups[0].threads, 1);
        assert_eq!(thread_groups[1].threads, 8);
        assert_eq!(best_threads, 8);
        assert_eq!(best_median_elapsed_seconds, 5.6);
    }

    #[test]
    fn test_aggregate_order_independent() {
        let mut samples = SevenZipAdapter.extract_samples(&payload());
        let target = AggregationTarget::new(HardwareKind::Cpu, "any");
        let forward = SevenZipAdapter.aggregate(&target, &samples);
        samples.reverse();
        let reversed = SevenZipAdapter.aggregate(&target, &samples);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_aggregate_empty_is_absent() {
        let target = AggregationTarget::new(HardwareKind::Cpu, "any");
        assert!(SevenZipAdapter.aggregate(&target, &[]).is_none());
    }

    #[test]
    fn test_aggregate_wrong_kind_is_absent() {
        let samples = SevenZipAdapter.extract_samples(&payload());
        let target = AggregationTarget::new(HardwareKind::Gpu, "any");
        assert!(SevenZipAdapter.aggregate(&target, &samples).is_none());
    }

    #[test]
    fn test_malformed_runs_are_skipped() {
        let v = json!({"runs": [{"threads": 2}, {"elapsed_seconds": 3.0}, "nonsense"]});
        assert!(SevenZipAdapter.extract_samples(&v).is_empty());
        assert!(SevenZipAdapter.extract_samples(&json!({})).is_empty());
    }
}
