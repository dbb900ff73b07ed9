// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The package manifest (`manifest.json`).
//!
//! # Format
//! ```json
//! {
//!   "variant": "pipeline",
//!   "name": "face-detector",
//!   "version": "1.2.0",
//!   "producer_name": "exporter",
//!   "inputs": [
//!     { "name": "image", "content_type": "NDJSON", "dtype": "float32", "shape": ["batch", 3, 224, 224] }
//!   ],
//!   "outputs": [
//!     { "name": "boxes", "content_type": "NDJSON", "dtype": "float32", "shape": ["batch", 4] }
//!   ],
//!   "dynamic_attributes": [
//!     { "name": "threshold", "content_type": "JSON", "dtype": "float32" }
//!   ],
//!   "env_vars": [ { "name": "DEVICE", "description": "cpu or cuda" } ]
//! }
//! ```
//!
//! Unknown top-level fields are kept in [`Manifest::extra`] and written back
//! on serialization.

use crate::PackageError;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tensor_core::ShapeSpec;

/// How a declared tensor is encoded by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ContentType {
    /// A tensor of the declared dtype and shape.
    #[serde(rename = "NDJSON")]
    NdJson,
    /// An arbitrary JSON value.
    #[serde(rename = "JSON")]
    Json,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::NdJson => "NDJSON",
            ContentType::Json => "JSON",
        }
    }
}

/// A declared pipeline input or output.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TensorDecl {
    pub name: String,
    #[serde(default = "default_content_type")]
    pub content_type: ContentType,
    /// Package dtype name, e.g. `"float32"`, or a name in `dtypes.json`.
    pub dtype: String,
    #[serde(default)]
    pub shape: ShapeSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn default_content_type() -> ContentType {
    ContentType::NdJson
}

/// A call-scoped attribute callers may pass with each compute.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DynamicAttributeDecl {
    pub name: String,
    #[serde(default = "default_attr_content_type")]
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn default_attr_content_type() -> ContentType {
    ContentType::Json
}

/// An environment variable the package expects to be set.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvVarDecl {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// The final, patched package manifest.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Manifest {
    /// Variant kind; only `"pipeline"` packages are executable.
    #[serde(default = "default_variant")]
    pub variant: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub producer_name: String,
    #[serde(default)]
    pub producer_version: String,
    #[serde(default)]
    pub producer_tags: Vec<String>,
    pub inputs: Vec<TensorDecl>,
    pub outputs: Vec<TensorDecl>,
    #[serde(default)]
    pub dynamic_attributes: Vec<DynamicAttributeDecl>,
    #[serde(default)]
    pub env_vars: Vec<EnvVarDecl>,
    /// Fields this runtime does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_variant() -> String {
    "pipeline".to_string()
}

impl Manifest {
    /// Decodes a manifest from an already patched JSON document.
    pub fn from_value(value: Value) -> Result<Self, PackageError> {
        serde_json::from_value(value).map_err(|source| PackageError::Json {
            file: crate::assembler::MANIFEST_FILE.to_string(),
            source,
        })
    }

    /// Validates that the manifest is internally consistent.
    ///
    /// Input names, output names, and dynamic attribute names must each be
    /// unique.
    pub fn validate(&self) -> Result<(), PackageError> {
        check_unique("input", self.inputs.iter().map(|d| d.name.as_str()))?;
        check_unique("output", self.outputs.iter().map(|d| d.name.as_str()))?;
        check_unique(
            "dynamic attribute",
            self.dynamic_attributes.iter().map(|d| d.name.as_str()),
        )?;
        if self.variant != "pipeline" {
            tracing::warn!(
                "manifest '{}' declares variant '{}'; only pipeline variants execute",
                self.name,
                self.variant
            );
        }
        Ok(())
    }

    pub fn input(&self, name: &str) -> Option<&TensorDecl> {
        self.inputs.iter().find(|d| d.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&TensorDecl> {
        self.outputs.iter().find(|d| d.name == name)
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|d| d.name.as_str())
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|d| d.name.as_str())
    }
}

fn check_unique<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<(), PackageError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(PackageError::InvalidManifest(format!(
                "duplicate {kind} name '{name}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tensor_core::Dim;

    fn sample() -> Value {
        json!({
            "name": "detector",
            "version": "1.0.0",
            "producer_name": "exporter",
            "inputs": [
                {"name": "image", "content_type": "NDJSON", "dtype": "float32", "shape": ["batch", 3]}
            ],
            "outputs": [
                {"name": "boxes", "content_type": "NDJSON", "dtype": "float32", "shape": ["batch", 4]},
                {"name": "labels", "content_type": "JSON", "dtype": "labels_t"}
            ],
            "dynamic_attributes": [{"name": "threshold"}],
            "env_vars": [{"name": "DEVICE"}],
            "fnnx_version": "0.0.4"
        })
    }

    #[test]
    fn test_parse_manifest() {
        let m = Manifest::from_value(sample()).unwrap();
        assert_eq!(m.variant, "pipeline");
        assert_eq!(m.name, "detector");
        assert_eq!(m.inputs[0].shape.dims()[0], Dim::Symbolic("batch".into()));
        assert_eq!(m.inputs[0].shape.dims()[1], Dim::Fixed(3));
        assert_eq!(m.outputs[1].content_type, ContentType::Json);
        assert!(m.outputs[1].shape.is_unconstrained());
        assert_eq!(m.dynamic_attributes[0].content_type, ContentType::Json);
        assert_eq!(m.env_vars[0].name, "DEVICE");
        m.validate().unwrap();
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let m = Manifest::from_value(sample()).unwrap();
        assert_eq!(m.extra.get("fnnx_version"), Some(&json!("0.0.4")));
        let back = serde_json::to_value(&m).unwrap();
        assert_eq!(back["fnnx_version"], "0.0.4");
        assert_eq!(Manifest::from_value(back).unwrap(), m);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut raw = sample();
        raw["outputs"][1]["name"] = json!("boxes");
        let m = Manifest::from_value(raw).unwrap();
        assert!(matches!(m.validate(), Err(PackageError::InvalidManifest(msg)) if msg.contains("boxes")));
    }

    #[test]
    fn test_missing_required_field() {
        let mut raw = sample();
        raw.as_object_mut().unwrap().remove("inputs");
        assert!(matches!(
            Manifest::from_value(raw),
            Err(PackageError::Json { file, .. }) if file == "manifest.json"
        ));
    }

    #[test]
    fn test_lookup_by_name() {
        let m = Manifest::from_value(sample()).unwrap();
        assert!(m.input("image").is_some());
        assert!(m.output("image").is_none());
        assert_eq!(m.output_names().collect::<Vec<_>>(), ["boxes", "labels"]);
    }
}
