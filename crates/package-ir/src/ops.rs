// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator instance configurations (`ops.json`).

use serde_json::Value;
use std::collections::BTreeMap;
use tensor_core::ShapeSpec;

/// The tensor an operator instance expects at one input or output position.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OpTensorSpec {
    pub name: String,
    pub dtype: String,
    #[serde(default)]
    pub shape: ShapeSpec,
}

/// One configured operator instance.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OperatorInstanceConfig {
    /// Identifier referenced by topology nodes.
    pub id: String,
    /// Operator kind, resolved through the runtime's registry.
    pub op: String,
    #[serde(default)]
    pub inputs: Vec<OpTensorSpec>,
    #[serde(default)]
    pub outputs: Vec<OpTensorSpec>,
    /// Kind-specific static configuration.
    #[serde(default)]
    pub attributes: Value,
    /// Operator-visible name → caller dynamic attribute name.
    #[serde(default)]
    pub dynamic_attributes: BTreeMap<String, String>,
}

impl OperatorInstanceConfig {
    /// Returns a one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}): {} → {}",
            self.id,
            self.op,
            join_names(&self.inputs),
            join_names(&self.outputs)
        )
    }

    /// Reads a string attribute, e.g. the path of a weights file.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

fn join_names(specs: &[OpTensorSpec]) -> String {
    let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
    format!("[{}]", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ops() {
        let ops: Vec<OperatorInstanceConfig> = serde_json::from_str(
            r#"[
                {
                    "id": "detector",
                    "op": "ONNX_v1",
                    "inputs": [{"name": "x", "dtype": "float32", "shape": ["batch", 3]}],
                    "outputs": [{"name": "y", "dtype": "float32", "shape": ["batch", 4]}],
                    "attributes": {"model_path": "ops_artifacts/detector/model.onnx"},
                    "dynamic_attributes": {"score_threshold": "threshold"}
                },
                {"id": "noop", "op": "identity"}
            ]"#,
        )
        .unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0].attribute_str("model_path"),
            Some("ops_artifacts/detector/model.onnx")
        );
        assert_eq!(ops[0].dynamic_attributes["score_threshold"], "threshold");
        assert_eq!(ops[0].summary(), "detector (ONNX_v1): [x] → [y]");
        assert!(ops[1].inputs.is_empty());
        assert_eq!(ops[1].attributes, Value::Null);
    }
}
