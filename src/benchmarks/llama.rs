// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! llama.cpp inference benchmark adapter
//!
//! Inference runs carry a device class (cpu or gpu) and token throughput
//! figures. CPU and GPU runs are a hard partition: their medians are never
//! merged into one statistic. GPU runs without a device name are skipped
//! during aggregation rather than risk mixing different GPUs together.

use serde_json::Value;

use crate::fingerprint::{slugify, GpuFramework, HardwareKind};
use crate::hardware::{CpuInfo, GpuInfo, HardwareInfo};
use crate::stats::median;

use super::{
    array_field, extract_meta_system, f64_field, object_field, str_field, u32_field, u64_field,
    AggregationTarget, BenchmarkAdapter, BenchmarkSummary, MetricSample,
};

pub struct LlamaAdapter;

impl BenchmarkAdapter for LlamaAdapter {
    fn kind(&self) -> &'static str {
        "llama"
    }

    fn applies_to(&self, kind: HardwareKind) -> bool {
        // Inference runs on both device classes.
        let _ = kind;
        true
    }

    fn extract_hardware(&self, payload: &Value, out: &mut HardwareInfo) {
        // Primary source: the runner's device inventory under meta.hardware,
        // a map of hw_id -> device description.
        if let Some(meta) = payload.get("meta") {
            if let Some(devices) = object_field(meta, "hardware") {
                for device in devices.values() {
                    let Some(name) = str_field(device, "name").filter(|n| !n.trim().is_empty())
                    else {
                        continue;
                    };
                    match str_field(device, "type") {
                        Some("cpu") => {
                            let mut cpu = CpuInfo::new(name);
                            cpu.cores = u32_field(device, "cores");
                            cpu.threads = u32_field(device, "threads");
                            out.add_cpu(cpu);
                        }
                        Some("gpu") => {
                            let mut gpu = GpuInfo::new(name);
                            if let Some(label) = str_field(device, "framework") {
                                gpu.framework = GpuFramework::from_label(label);
                            }
                            gpu.memory_mb = u64_field(device, "memory_mb");
                            out.add_gpu(gpu);
                        }
                        _ => {}
                    }
                }
            }
        }

        // Fallback: GPU names mentioned on individual runs.
        if let Some(runs) = array_field(payload, "runs") {
            for run in runs {
                if str_field(run, "device") != Some("gpu") {
                    continue;
                }
                if let Some(name) = str_field(run, "device_name").filter(|n| !n.trim().is_empty()) {
                    out.add_gpu(GpuInfo::new(name));
                }
            }
        }

        extract_meta_system(payload, out);
    }

    fn extract_samples(&self, payload: &Value) -> Vec<MetricSample> {
        let mut samples = Vec::new();

        if let Some(runs) = array_field(payload, "runs") {
            for run in runs {
                let Some(device) = str_field(run, "device").and_then(HardwareKind::parse) else {
                    continue;
                };
                let decode = f64_field(run, "decode_tokens_per_sec");
                let prompt = f64_field(run, "prompt_tokens_per_sec");
                let total = f64_field(run, "total_time_ms");
                if decode.is_none() && prompt.is_none() && total.is_none() {
                    continue;
                }
                samples.push(MetricSample::InferenceRun {
                    device,
                    device_slug: str_field(run, "device_name").map(slugify),
                    decode_tokens_per_sec: decode,
                    prompt_tokens_per_sec: prompt,
                    total_time_ms: total,
                });
            }
        }

        // Build time of 0.0 means "not measured" in runner output.
        if let Some(build) = payload.get("build") {
            if let Some(seconds) = f64_field(build, "compile_seconds").filter(|s| *s > 0.0) {
                samples.push(MetricSample::InferenceBuild { seconds });
            }
        }

        samples
    }

    fn aggregate(
        &self,
        target: &AggregationTarget,
        samples: &[MetricSample],
    ) -> Option<BenchmarkSummary> {
        let mut decode = Vec::new();
        let mut prompt = Vec::new();
        let mut total = Vec::new();
        let mut build = Vec::new();

        for sample in samples {
            match sample {
                MetricSample::InferenceRun {
                    device,
                    device_slug,
                    decode_tokens_per_sec,
                    prompt_tokens_per_sec,
                    total_time_ms,
                } => {
                    if *device != target.kind {
                        continue;
                    }
                    if target.kind == HardwareKind::Gpu {
                        // Without a device name there is no way to tell which
                        // GPU produced the run; skip it instead of mixing.
                        match device_slug {
                            Some(slug) if *slug == target.slug => {}
                            _ => continue,
                        }
                    }
                    decode.extend(decode_tokens_per_sec);
                    prompt.extend(prompt_tokens_per_sec);
                    total.extend(total_time_ms);
                }
                MetricSample::InferenceBuild { seconds } => {
                    // Build happens on the host CPU; GPU records never carry it.
                    if target.kind == HardwareKind::Cpu {
                        build.push(*seconds);
                    }
                }
                _ => {}
            }
        }

        let decode_tokens_per_sec_median = median(&decode);
        let prompt_tokens_per_sec_median = median(&prompt);
        let total_time_ms_median = median(&total);
        let build_seconds_median = median(&build);

        if decode_tokens_per_sec_median.is_none()
            && prompt_tokens_per_sec_median.is_none()
            && total_time_ms_median.is_none()
            && build_seconds_median.is_none()
        {
            return None;
        }

        Some(BenchmarkSummary::Inference {
            decode_tokens_per_sec_median,
            prompt_tokens_per_sec_median,
            total_time_ms_median,
            build_seconds_median,
        })
    }
}
