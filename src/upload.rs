// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Upload boundary
//!
//! The transport layer (HTTP handler, CLI import, test harness) hands over
//! either a set of named parts or a single JSON object keyed by benchmark
//! type. This module normalizes that input before it reaches the pipeline:
//! part names lose their `_results` suffix, payloads lose one optional
//! `results`/`data` envelope level, and unparseable JSON rejects the whole
//! run before anything is written.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{OddbenchError, Result};
use crate::hardware::HardwareInfo;

/// One named part of an upload (file part name + raw body).
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub name: String,
    pub body: String,
}

impl UploadPart {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// A normalized upload, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Benchmark type -> raw payload.
    pub payloads: BTreeMap<String, Value>,
    /// Caller-supplied run id, bypassing auto-naming.
    pub run_id: Option<String>,
    /// Caller-supplied hardware facts, bypassing auto-extraction.
    pub hardware: Option<HardwareInfo>,
    /// Caller-supplied unix-seconds timestamp.
    pub timestamp: Option<i64>,
}

/// Outcome of one accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub run_id: String,
    pub hardware_id: String,
    pub stored_benchmarks: Vec<String>,
}

/// Strip the conventional `_results` suffix from a part name to obtain the
/// benchmark type ("llama_results" -> "llama").
pub fn benchmark_type_from_part_name(name: &str) -> String {
    let name = name.trim();
    let name = name.strip_suffix("_results").unwrap_or(name);
    name.to_string()
}

/// Unwrap one optional `results`/`data` envelope level.
///
/// Some runners wrap their output as `{"results": {...}}`; the extractors
/// expect the inner object. Only a single level is unwrapped, and only when
/// the envelope holds an object.
pub fn unwrap_envelope(payload: Value) -> Value {
    if let Value::Object(ref map) = payload {
        if map.len() == 1 {
            for key in ["results", "data"] {
                if let Some(inner @ Value::Object(_)) = map.get(key) {
                    return inner.clone();
                }
            }
        }
    }
    payload
}

/// Build an [`UploadRequest`] from named file parts.
///
/// Any part that fails to parse as JSON rejects the whole upload with
/// `MalformedInput`, naming the offending part.
pub fn request_from_parts(
    parts: Vec<UploadPart>,
    run_id: Option<String>,
    hardware: Option<HardwareInfo>,
    timestamp: Option<i64>,
) -> Result<UploadRequest> {
    if parts.is_empty() {
        return Err(OddbenchError::MalformedInput(
            "upload contains no benchmark parts".to_string(),
        ));
    }

    let mut payloads = BTreeMap::new();
    for part in parts {
        let benchmark_type = benchmark_type_from_part_name(&part.name);
        if benchmark_type.is_empty() {
            return Err(OddbenchError::MalformedInput(format!(
                "part '{}' has no benchmark type",
                part.name
            )));
        }
        let payload: Value = serde_json::from_str(&part.body).map_err(|e| {
            OddbenchError::MalformedInput(format!("part '{}' is not valid JSON: {}", part.name, e))
        })?;
        payloads.insert(benchmark_type, unwrap_envelope(payload));
    }

    Ok(UploadRequest {
        payloads,
        run_id,
        hardware,
        timestamp,
    })
}

/// Build an [`UploadRequest`] from a single JSON object keyed by benchmark
/// type.
pub fn request_from_single_json(
    body: &str,
    run_id: Option<String>,
    hardware: Option<HardwareInfo>,
    timestamp: Option<i64>,
) -> Result<UploadRequest> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| OddbenchError::MalformedInput(format!("upload is not valid JSON: {}", e)))?;
    let Value::Object(map) = value else {
        return Err(OddbenchError::MalformedInput(
            "upload must be a JSON object keyed by benchmark type".to_string(),
        ));
    };
    if map.is_empty() {
        return Err(OddbenchError::MalformedInput(
            "upload contains no benchmark payloads".to_string(),
        ));
    }

    let mut payloads = BTreeMap::new();
    for (name, payload) in map {
        let benchmark_type = benchmark_type_from_part_name(&name);
        payloads.insert(benchmark_type, unwrap_envelope(payload));
    }

    Ok(UploadRequest {
        payloads,
        run_id,
        hardware,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_part_name_suffix_stripped() {
        assert_eq!(benchmark_type_from_part_name("llama_results"), "llama");
        assert_eq!(benchmark_type_from_part_name("7zip_results"), "7zip");
        assert_eq!(benchmark_type_from_part_name("blender"), "blender");
        assert_eq!(benchmark_type_from_part_name(" reversan_results "), "reversan");
    }

    #[test]
    fn test_envelope_unwrapped_one_level() {
        let wrapped = json!({"results": {"runs": []}});
        assert_eq!(unwrap_envelope(wrapped), json!({"runs": []}));

        let data = json!({"data": {"runs": []}});
        assert_eq!(unwrap_envelope(data), json!({"runs": []}));

        // Two levels only lose the outer one.
        let nested = json!({"results": {"results": {"runs": []}}});
        assert_eq!(unwrap_envelope(nested), json!({"results": {"runs": []}}));

        // An object with other keys alongside is not an envelope.
        let not_envelope = json!({"results": {"runs": []}, "meta": {}});
        assert_eq!(unwrap_envelope(not_envelope.clone()), not_envelope);

        // A non-object "results" is not an envelope either.
        let scalar = json!({"results": 7});
        assert_eq!(unwrap_envelope(scalar.clone()), scalar);
    }

    #[test]
    fn test_request_from_parts() {
        let parts = vec![
            UploadPart::new("llama_results", r#"{"results": {"runs": []}}"#),
            UploadPart::new("7zip_results", r#"{"runs": []}"#),
        ];
        let req = request_from_parts(parts, Some("my-run".to_string()), None, None).unwrap();
        assert_eq!(req.payloads.len(), 2);
        assert!(req.payloads.contains_key("llama"));
        assert_eq!(req.payloads["llama"], json!({"runs": []}));
        assert_eq!(req.run_id.as_deref(), Some("my-run"));
    }

    #[test]
    fn test_bad_json_rejects_whole_upload() {
        let parts = vec![
            UploadPart::new("llama_results", r#"{"ok": true}"#),
            UploadPart::new("7zip_results", "{not json"),
        ];
        let err = request_from_parts(parts, None, None, None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("7zip_results"), "names the offending part: {msg}");
    }

    #[test]
    fn test_empty_upload_rejected() {
        assert!(request_from_parts(vec![], None, None, None).is_err());
        assert!(request_from_single_json("{}", None, None, None).is_err());
    }

    #[test]
    fn test_single_json_keyed_by_type() {
        let body = r#"{"llama_results": {"runs": []}, "blender": {"device_runs": []}}"#;
        let req = request_from_single_json(body, None, None, None).unwrap();
        assert!(req.payloads.contains_key("llama"));
        assert!(req.payloads.contains_key("blender"));
    }

    #[test]
    fn test_single_json_must_be_object() {
        assert!(request_from_single_json("[1,2]", None, None, None).is_err());
        assert!(request_from_single_json("nonsense", None, None, None).is_err());
    }
}
