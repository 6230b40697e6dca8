// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Blender render benchmark adapter
//!
//! Multi-scene, multi-device render throughput. Each device run reports
//! samples-per-minute per scene; a `device_framework` of "CPU" marks the CPU
//! taking the run, anything else is a GPU compute backend label. Device
//! identity is carried through unmodified and never averaged across devices.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::fingerprint::{slugify, GpuFramework, HardwareKind};
use crate::hardware::{CpuInfo, GpuInfo, HardwareInfo};
use crate::stats::median;

use super::{
    array_field, bool_field, f64_field, object_field, str_field, AggregationTarget,
    BenchmarkAdapter, BenchmarkSummary, MetricSample, SceneTiming,
};

pub struct BlenderAdapter;

impl BlenderAdapter {
    fn is_cpu_run(run: &Value) -> bool {
        str_field(run, "device_framework")
            .map(|f| f.eq_ignore_ascii_case("cpu"))
            .unwrap_or(false)
    }
}

impl BenchmarkAdapter for BlenderAdapter {
    fn kind(&self) -> &'static str {
        "blender"
    }

    fn applies_to(&self, kind: HardwareKind) -> bool {
        let _ = kind;
        true
    }

    fn extract_hardware(&self, payload: &Value, out: &mut HardwareInfo) {
        let Some(runs) = array_field(payload, "device_runs") else {
            return;
        };

        for run in runs {
            let Some(name) = str_field(run, "device_name").filter(|n| !n.trim().is_empty()) else {
                continue;
            };

            if Self::is_cpu_run(run) {
                // A generic "CPU" placeholder name identifies nothing.
                if slugify(name) == "unknown" {
                    continue;
                }
                out.add_cpu(CpuInfo::new(name));
            } else {
                let mut gpu = GpuInfo::new(name);
                if let Some(label) = str_field(run, "device_framework") {
                    gpu.framework = GpuFramework::from_label(label);
                }
                out.add_gpu(gpu);
            }
        }
    }

    fn extract_samples(&self, payload: &Value) -> Vec<MetricSample> {
        let Some(runs) = array_field(payload, "device_runs") else {
            return Vec::new();
        };

        let mut samples = Vec::new();
        for run in runs {
            // Failed device runs contribute nothing.
            if !bool_field(run, "success").unwrap_or(true) {
                continue;
            }
            let Some(name) = str_field(run, "device_name").filter(|n| !n.trim().is_empty()) else {
                continue;
            };
            let device_kind = if Self::is_cpu_run(run) {
                HardwareKind::Cpu
            } else {
                HardwareKind::Gpu
            };
            let Some(scenes) = object_field(run, "scene_results") else {
                continue;
            };

            for (scene, result) in scenes {
                // A scene absent from a run contributes nothing to that
                // scene's group; same for a scene without a throughput figure.
                let Some(samples_per_minute) = f64_field(result, "samples_per_minute") else {
                    continue;
                };
                samples.push(MetricSample::RenderSceneRun {
                    device_kind,
                    device_slug: slugify(name),
                    scene: scene.clone(),
                    samples_per_minute,
                });
            }
        }
        samples
    }

    fn aggregate(
        &self,
        target: &AggregationTarget,
        samples: &[MetricSample],
    ) -> Option<BenchmarkSummary> {
        let mut scenes: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

        for sample in samples {
            if let MetricSample::RenderSceneRun {
                device_kind,
                device_slug,
                scene,
                samples_per_minute,
            } = sample
            {
                if *device_kind != target.kind {
                    continue;
                }
                // GPUs are matched individually; the CPU record takes every
                // CPU-framework run (one CPU per benchmarked machine).
                if target.kind == HardwareKind::Gpu && *device_slug != target.slug {
                    continue;
                }
                scenes
                    .entry(scene.as_str())
                    .or_default()
                    .push(*samples_per_minute);
            }
        }

        let scene_timings: Vec<SceneTiming> = scenes
            .iter()
            .filter_map(|(scene, values)| {
                median(values).map(|median_samples_per_minute| SceneTiming {
                    scene: (*scene).to_string(),
                    median_samples_per_minute,
                })
            })
            .collect();

        if scene_timings.is_empty() {
            return None;
        }

        Some(BenchmarkSummary::Render { scene_timings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "device_runs": [
                {
                    "device_name": "NVIDIA GeForce RTX 4070",
                    "device_framework": "OPTIX",
                    "success": true,
                    "scene_results": {
                        "classroom": {"samples_per_minute": 241.1},
                        "junkshop": {"samples_per_minute": 301.5},
                        "monster": {"samples_per_minute": 412.9}
                    }
                },
                {
                    "device_name": "AMD Ryzen 7 5700X3D 8-Core Processor",
                    "device_framework": "CPU",
                    "success": true,
                    "scene_results": {
                        "classroom": {"samples_per_minute": 31.2},
                        "monster": {"samples_per_minute": 55.0}
                    }
                },
                {
                    "device_name": "Radeon RX 7600",
                    "device_framework": "HIP",
                    "success": false,
                    "scene_results": {
                        "classroom": {"samples_per_minute": 99.0}
                    }
                }
            ]
        })
    }

    #[test]
    fn test_extract_hardware_split_by_framework() {
        let mut info = HardwareInfo::new();
        BlenderAdapter.extract_hardware(&payload(), &mut info);

        assert_eq!(info.cpus.len(), 1);
        assert_eq!(info.gpus.len(), 2, "failed runs still identify hardware");
        assert_eq!(info.gpus[0].framework, GpuFramework::OptiX);
        assert_eq!(info.gpus[1].framework, GpuFramework::Hip);
    }

    #[test]
    fn test_generic_cpu_placeholder_name_is_skipped() {
        let v = json!({
            "device_runs": [
                {"device_name": "CPU", "device_framework": "CPU", "scene_results": {}}
            ]
        });
        let mut info = HardwareInfo::new();
        BlenderAdapter.extract_hardware(&v, &mut info);
        assert!(info.cpus.is_empty());
    }

    #[test]
    fn test_failed_runs_contribute_no_samples() {
        let samples = BlenderAdapter.extract_samples(&payload());
        assert!(samples.iter().all(|s| !matches!(
            s,
            MetricSample::RenderSceneRun { device_slug, .. } if device_slug.as_str() == "radeon-rx-7600"
        )));
    }

    #[test]
    fn test_aggregate_gpu_matches_device_identity() {
        let samples = BlenderAdapter.extract_samples(&payload());

        let rtx = AggregationTarget::new(HardwareKind::Gpu, "nvidia-geforce-rtx-4070");
        let BenchmarkSummary::Render { scene_timings } =
            BlenderAdapter.aggregate(&rtx, &samples).unwrap()
        else {
            panic!("expected render summary");
        };
        assert_eq!(scene_timings.len(), 3);
        assert_eq!(scene_timings[0].scene, "classroom");
        assert_eq!(scene_timings[0].median_samples_per_minute, 241.1);

        // The failed HIP device has no surviving samples at all.
        let rx = AggregationTarget::new(HardwareKind::Gpu, "radeon-rx-7600");
        assert!(BlenderAdapter.aggregate(&rx, &samples).is_none());
    }

    #[test]
    fn test_aggregate_cpu_scene_groups() {
        let samples = BlenderAdapter.extract_samples(&payload());
        let cpu = AggregationTarget::new(HardwareKind::Cpu, "amd-ryzen-7-5700x3d-8-core");
        let BenchmarkSummary::Render { scene_timings } =
            BlenderAdapter.aggregate(&cpu, &samples).unwrap()
        else {
            panic!("expected render summary");
        };
        // junkshop is absent from the CPU run: no group, not a zero.
        assert_eq!(scene_timings.len(), 2);
        assert!(scene_timings.iter().all(|s| s.scene != "junkshop"));
    }

    #[test]
    fn test_median_across_repeated_runs() {
        let repeated = json!({
            "device_runs": [
                {"device_name": "RTX 4070", "device_framework": "OPTIX",
                 "scene_results": {"monster": {"samples_per_minute": 400.0}}},
                {"device_name": "RTX 4070", "device_framework": "OPTIX",
                 "scene_results": {"monster": {"samples_per_minute": 420.0}}}
            ]
        });
        let samples = BlenderAdapter.extract_samples(&repeated);
        let target = AggregationTarget::new(HardwareKind::Gpu, "rtx-4070");
        let BenchmarkSummary::Render { scene_timings } =
            BlenderAdapter.aggregate(&target, &samples).unwrap()
        else {
            panic!("expected render summary");
        };
        assert_eq!(scene_timings[0].median_samples_per_minute, 410.0);
    }
}
