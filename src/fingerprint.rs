// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Hardware identity resolution
//!
//! Benchmark tools report the same physical device under wildly different
//! spellings ("AMD Ryzen 7 5700X3D 8-Core Processor", "amd ryzen 7 5700x3d
//! 8-core processor", "NVIDIA GeForce RTX 4070 (TM)"). This module reduces
//! those spellings to a canonical fingerprint so formatting differences never
//! create duplicate hardware entries. Identification is always best-effort:
//! an unrecognized vendor becomes `Unknown`, never an error, because identity
//! resolution must not block ingestion of otherwise-valid benchmark data.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Hardware device category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareKind {
    Cpu,
    Gpu,
}

impl HardwareKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HardwareKind::Cpu => "cpu",
            HardwareKind::Gpu => "gpu",
        }
    }

    /// Parse a kind from its wire form ("cpu" / "gpu").
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Some(HardwareKind::Cpu),
            "gpu" => Some(HardwareKind::Gpu),
            _ => None,
        }
    }
}

impl fmt::Display for HardwareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware vendor, detected from the device name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Manufacturer {
    #[serde(rename = "AMD")]
    Amd,
    #[serde(rename = "Intel")]
    Intel,
    #[serde(rename = "NVIDIA")]
    Nvidia,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Manufacturer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Manufacturer::Amd => "AMD",
            Manufacturer::Intel => "Intel",
            Manufacturer::Nvidia => "NVIDIA",
            Manufacturer::Unknown => "Unknown",
        }
    }
}

/// GPU compute backend label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuFramework {
    #[serde(rename = "CUDA")]
    Cuda,
    #[serde(rename = "HIP")]
    Hip,
    #[serde(rename = "OPENCL")]
    OpenCl,
    #[serde(rename = "OPTIX")]
    OptiX,
    #[serde(rename = "METAL")]
    Metal,
    #[serde(rename = "ONEAPI")]
    OneApi,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl GpuFramework {
    /// Map a tool-specific backend label to the canonical framework.
    ///
    /// Unrecognized labels map to `Unknown`, never an error.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "cuda" => GpuFramework::Cuda,
            "hip" | "rocm" => GpuFramework::Hip,
            "opencl" | "ocl" => GpuFramework::OpenCl,
            "optix" => GpuFramework::OptiX,
            "metal" => GpuFramework::Metal,
            "oneapi" | "sycl" => GpuFramework::OneApi,
            _ => GpuFramework::Unknown,
        }
    }
}

// Parenthetical suffixes like "(R)", "(TM)" or "(16GB)" carry no identity.
static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("parenthetical pattern is valid"));

// Runs of anything that is not a lowercase letter or digit collapse to one
// hyphen in the slug.
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("non-alphanumeric pattern is valid"));

/// Filler words vendors append inconsistently; they never disambiguate.
const NOISE_WORDS: &[&str] = &["processor", "cpu", "graphics"];

/// Normalize a hardware name into its slug form.
///
/// Lowercases, strips parenthetical suffixes and filler words, converts runs
/// of non-alphanumerics to single hyphens and trims leading/trailing hyphens.
/// Deterministic and pure; an empty result falls back to "unknown".
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = PARENTHETICAL.replace_all(&lowered, " ");

    let kept: Vec<&str> = stripped
        .split_whitespace()
        .filter(|word| !NOISE_WORDS.contains(word))
        .collect();

    let joined = kept.join(" ");
    let slug = NON_ALPHANUMERIC.replace_all(&joined, "-");
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug.to_string()
    }
}

/// Detect the vendor from a raw device name.
///
/// Model-family tokens are checked before the bare vendor token: "8-Core"
/// appears in AMD CPU names, so the AMD table must win before "core" is
/// taken as an Intel marker.
pub fn detect_manufacturer(kind: HardwareKind, name: &str) -> Manufacturer {
    let lower = name.to_lowercase();
    let contains_any = |tokens: &[&str]| tokens.iter().any(|t| lower.contains(t));

    match kind {
        HardwareKind::Cpu => {
            if contains_any(&["ryzen", "epyc", "threadripper", "amd"]) {
                Manufacturer::Amd
            } else if contains_any(&["xeon", "core", "celeron", "pentium", "intel"]) {
                Manufacturer::Intel
            } else {
                Manufacturer::Unknown
            }
        }
        HardwareKind::Gpu => {
            if contains_any(&["geforce", "rtx", "gtx", "nvidia"]) {
                Manufacturer::Nvidia
            } else if contains_any(&["radeon", "rx ", "amd"]) {
                Manufacturer::Amd
            } else if contains_any(&["arc", "intel"]) {
                Manufacturer::Intel
            } else {
                Manufacturer::Unknown
            }
        }
    }
}

/// Canonical identity of one hardware device.
///
/// Two fingerprints refer to the same physical hardware iff `kind` and `slug`
/// match; the canonical name is for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub kind: HardwareKind,
    pub canonical_name: String,
    pub manufacturer: Manufacturer,
    pub slug: String,
}

impl Fingerprint {
    /// Build a fingerprint from a raw reported name.
    pub fn new(kind: HardwareKind, name: &str) -> Self {
        let canonical_name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        let manufacturer = detect_manufacturer(kind, name);
        let slug = slugify(name);
        Self {
            kind,
            canonical_name,
            manufacturer,
            slug,
        }
    }

    /// Whether two fingerprints identify the same physical hardware.
    pub fn same_hardware(&self, other: &Fingerprint) -> bool {
        self.kind == other.kind && self.slug == other.slug
    }
}
