// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Property tests for the aggregators: output must be a pure function of
//! the sample *set*, never of the order samples arrive in.

use proptest::prelude::*;

use oddbench::benchmarks::{
    AggregationTarget, BenchmarkAdapter, BlenderAdapter, LlamaAdapter, MetricSample,
    ReversanAdapter, SevenZipAdapter,
};
use oddbench::fingerprint::HardwareKind;

/// A permutation cheap enough for proptest: reverse, then rotate.
fn permuted<T: Clone>(items: &[T], rotation: usize) -> Vec<T> {
    let mut out: Vec<T> = items.to_vec();
    out.reverse();
    if !out.is_empty() {
        let len = out.len();
        out.rotate_left(rotation % len);
    }
    out
}

fn compression_samples(raw: &[(u8, u16)]) -> Vec<MetricSample> {
    raw.iter()
        .map(|(threads, centis)| MetricSample::CompressionRun {
            threads: u32::from(*threads % 16) + 1,
            elapsed_seconds: f64::from(*centis) / 100.0 + 0.01,
            efficiency_percent: None,
            speedup: None,
        })
        .collect()
}

proptest! {
    #[test]
    fn compression_aggregate_is_order_independent(
        raw in proptest::collection::vec((any::<u8>(), any::<u16>()), 0..40),
        rotation in 0usize..40,
    ) {
        let samples = compression_samples(&raw);
        let shuffled = permuted(&samples, rotation);

        let target = AggregationTarget::new(HardwareKind::Cpu, "any");
        prop_assert_eq!(
            SevenZipAdapter.aggregate(&target, &samples),
            SevenZipAdapter.aggregate(&target, &shuffled)
        );
    }

    #[test]
    fn search_aggregate_is_order_independent(
        depths in proptest::collection::vec((1u32..12, 1u16..5000), 0..30),
        threads in proptest::collection::vec((1u32..32, 1u16..5000), 0..30),
        rotation in 0usize..60,
    ) {
        let mut samples: Vec<MetricSample> = Vec::new();
        for (depth, centis) in &depths {
            samples.push(MetricSample::SearchDepthRun {
                depth: *depth,
                seconds: f64::from(*centis) / 100.0,
            });
        }
        for (t, centis) in &threads {
            samples.push(MetricSample::SearchThreadRun {
                threads: *t,
                seconds: f64::from(*centis) / 100.0,
            });
        }
        let shuffled = permuted(&samples, rotation);

        let target = AggregationTarget::new(HardwareKind::Cpu, "any");
        prop_assert_eq!(
            ReversanAdapter.aggregate(&target, &samples),
            ReversanAdapter.aggregate(&target, &shuffled)
        );
    }

    #[test]
    fn inference_aggregate_is_order_independent(
        speeds in proptest::collection::vec((any::<bool>(), 1u16..10000), 0..30),
        rotation in 0usize..30,
    ) {
        let samples: Vec<MetricSample> = speeds
            .iter()
            .map(|(is_cpu, speed)| MetricSample::InferenceRun {
                device: if *is_cpu { HardwareKind::Cpu } else { HardwareKind::Gpu },
                device_slug: Some("the-gpu".to_string()),
                decode_tokens_per_sec: Some(f64::from(*speed) / 10.0),
                prompt_tokens_per_sec: None,
                total_time_ms: None,
            })
            .collect();
        let shuffled = permuted(&samples, rotation);

        for kind in [HardwareKind::Cpu, HardwareKind::Gpu] {
            let target = AggregationTarget::new(kind, "the-gpu");
            prop_assert_eq!(
                LlamaAdapter.aggregate(&target, &samples),
                LlamaAdapter.aggregate(&target, &shuffled)
            );
        }
    }

    #[test]
    fn render_aggregate_is_order_independent(
        scenes in proptest::collection::vec((0u8..4, 1u16..10000), 0..30),
        rotation in 0usize..30,
    ) {
        let scene_names = ["classroom", "junkshop", "monster", "lone-monk"];
        let samples: Vec<MetricSample> = scenes
            .iter()
            .map(|(scene, spm)| MetricSample::RenderSceneRun {
                device_kind: HardwareKind::Gpu,
                device_slug: "the-gpu".to_string(),
                scene: scene_names[usize::from(*scene)].to_string(),
                samples_per_minute: f64::from(*spm) / 10.0,
            })
            .collect();
        let shuffled = permuted(&samples, rotation);

        let target = AggregationTarget::new(HardwareKind::Gpu, "the-gpu");
        prop_assert_eq!(
            BlenderAdapter.aggregate(&target, &samples),
            BlenderAdapter.aggregate(&target, &shuffled)
        );
    }

}

#[test]
fn empty_input_yields_no_summary() {
    let cpu = AggregationTarget::new(HardwareKind::Cpu, "any");
    let gpu = AggregationTarget::new(HardwareKind::Gpu, "any");
    assert!(SevenZipAdapter.aggregate(&cpu, &[]).is_none());
    assert!(ReversanAdapter.aggregate(&cpu, &[]).is_none());
    assert!(LlamaAdapter.aggregate(&cpu, &[]).is_none());
    assert!(LlamaAdapter.aggregate(&gpu, &[]).is_none());
    assert!(BlenderAdapter.aggregate(&gpu, &[]).is_none());
}
