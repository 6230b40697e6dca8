// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Reversan game-tree search benchmark adapter
//!
//! Search runs scale along two independent axes: search depth and thread
//! count. `user_seconds` is preferred over wall-clock `elapsed_seconds`
//! where present (more precise for CPU-bound search). Near-zero groups are
//! reported as-is; deciding what counts as immeasurable belongs to
//! presentation, not aggregation.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::fingerprint::HardwareKind;
use crate::hardware::HardwareInfo;
use crate::stats::median;

use super::{
    array_field, extract_meta_system, f64_field, u32_field, AggregationTarget, BenchmarkAdapter,
    BenchmarkSummary, DepthTiming, MetricSample, ThreadTiming,
};

pub struct ReversanAdapter;

/// Depth at which the headline search figure is reported.
const HEADLINE_DEPTH: u32 = 10;

impl ReversanAdapter {
    /// Time for one run: `metrics.user_seconds` over `metrics.elapsed_seconds`,
    /// with flat fields accepted for older runner output.
    fn run_seconds(run: &Value) -> Option<f64> {
        let metrics = run.get("metrics").unwrap_or(run);
        f64_field(metrics, "user_seconds").or_else(|| f64_field(metrics, "elapsed_seconds"))
    }
}

impl BenchmarkAdapter for ReversanAdapter {
    fn kind(&self) -> &'static str {
        "reversan"
    }

    fn applies_to(&self, kind: HardwareKind) -> bool {
        kind == HardwareKind::Cpu
    }

    fn extract_hardware(&self, payload: &Value, out: &mut HardwareInfo) {
        extract_meta_system(payload, out);
    }

    fn extract_samples(&self, payload: &Value) -> Vec<MetricSample> {
        let mut samples = Vec::new();

        if let Some(runs) = array_field(payload, "runs_depth") {
            for run in runs {
                let (Some(depth), Some(seconds)) = (u32_field(run, "depth"), Self::run_seconds(run))
                else {
                    continue;
                };
                samples.push(MetricSample::SearchDepthRun { depth, seconds });
            }
        }

        if let Some(runs) = array_field(payload, "runs_threads") {
            for run in runs {
                let (Some(threads), Some(seconds)) =
                    (u32_field(run, "threads"), Self::run_seconds(run))
                else {
                    continue;
                };
                samples.push(MetricSample::SearchThreadRun { threads, seconds });
            }
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

        let mut depth_groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        let mut thread_groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();

        for sample in samples {
            match sample {
                MetricSample::SearchDepthRun { depth, seconds } => {
                    depth_groups.entry(*depth).or_default().push(*seconds);
                }
                MetricSample::SearchThreadRun { threads, seconds } => {
                    thread_groups.entry(*threads).or_default().push(*seconds);
                }
                _ => {}
            }
        }

        let depth_timings: Vec<DepthTiming> = depth_groups
            .iter()
            .filter_map(|(depth, values)| {
                median(values).map(|median_seconds| DepthTiming {
                    depth: *depth,
                    median_seconds,
                })
            })
            .collect();

        let thread_timings: Vec<ThreadTiming> = thread_groups
            .iter()
            .filter_map(|(threads, values)| {
                median(values).map(|median_seconds| ThreadTiming {
                    threads: *threads,
                    median_seconds,
                })
            })
            .collect();

        if depth_timings.is_empty() && thread_timings.is_empty() {
            return None;
        }

        let best_depth10_seconds = depth_timings
            .iter()
            .find(|d| d.depth == HEADLINE_DEPTH)
            .map(|d| d.median_seconds);
        let best_thread_seconds = thread_timings
            .iter()
            .map(|t| t.median_seconds)
            .fold(None, |best: Option<f64>, v| {
                Some(best.map_or(v, |b| b.min(v)))
            });

        Some(BenchmarkSummary::TreeSearch {
            depth_timings,
            thread_timings,
            best_depth10_seconds,
            best_thread_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "meta": {"cpu": "AMD Ryzen 7 5700X3D 8-Core Processor", "os": "Linux 6.8"},
            "runs_depth": [
                {"depth": 8, "metrics": {"elapsed_seconds": 0.9, "user_seconds": 0.85}},
                {"depth": 10, "metrics": {"elapsed_seconds": 7.1, "user_seconds": 7.0}},
                {"depth": 10, "metrics": {"elapsed_seconds": 7.5, "user_seconds": 7.4}}
            ],
            "runs_threads": [
                {"threads": 1, "metrics": {"user_seconds": 7.2}},
                {"threads": 8, "metrics": {"user_seconds": 1.9}}
            ]
        })
    }

    #[test]
    fn test_extract_hardware_from_plain_string() {
        let mut info = HardwareInfo::new();
        ReversanAdapter.extract_hardware(&payload(), &mut info);
        assert_eq!(info.cpus.len(), 1);
        assert_eq!(info.cpus[0].slug, "amd-ryzen-7-5700x3d-8-core");
    }

    #[test]
    fn test_user_seconds_preferred() {
        let samples = ReversanAdapter.extract_samples(&payload());
        assert!(samples.contains(&MetricSample::SearchDepthRun {
            depth: 8,
            seconds: 0.85
        }));
    }

    #[test]
    fn test_flat_fields_accepted() {
        let v = json!({"runs_depth": [{"depth": 6, "elapsed_seconds": 0.2}]});
        let samples = ReversanAdapter.extract_samples(&v);
        assert_eq!(
            samples,
            vec![MetricSample::SearchDepthRun {
                depth: 6,
                seconds: 0.2
            }]
        );
    }

    #[test]
    fn test_aggregate_medians_and_headlines() {
        let samples = ReversanAdapter.extract_samples(&payload());
        let target = AggregationTarget::new(HardwareKind::Cpu, "any");
        let BenchmarkSummary::TreeSearch {
            depth_timings,
            thread_timings,
            best_depth10_seconds,
            best_thread_seconds,
        } = ReversanAdapter.aggregate(&target, &samples).unwrap()
        else {
            panic!("expected tree-search summary");
        };

        assert_eq!(depth_timings.len(), 2);
        assert_eq!(best_depth10_seconds, Some(7.2));
        assert_eq!(thread_timings.len(), 2);
        assert_eq!(best_thread_seconds, Some(1.9));
    }

    #[test]
    fn test_near_zero_groups_still_reported() {
        let v = json!({"runs_depth": [{"depth": 1, "metrics": {"user_seconds": 0.0}}]});
        let samples = ReversanAdapter.extract_samples(&v);
        let target = AggregationTarget::new(HardwareKind::Cpu, "any");
        let summary = ReversanAdapter.aggregate(&target, &samples).unwrap();
        let BenchmarkSummary::TreeSearch { depth_timings, .. } = summary else {
            panic!("expected tree-search summary");
        };
        assert_eq!(depth_timings.len(), 1);
        assert_eq!(depth_timings[0].median_seconds, 0.0);
    }

    #[test]
    fn test_aggregate_empty_is_absent() {
        let target = AggregationTarget::new(HardwareKind::Cpu, "any");
        assert!(ReversanAdapter.aggregate(&target, &[]).is_none());
    }
}
