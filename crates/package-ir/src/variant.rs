// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pipeline topology (`variant_config.json`).
//!
//! A topology is a list of nodes. Each node runs one operator instance,
//! reading and writing named bindings. Edges are implied by binding names:
//! a node depends on whichever node writes the bindings it reads.

use crate::{OperatorInstanceConfig, TopologyError};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One step of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeDef {
    pub op_instance_id: String,
    /// Bindings read, positionally matched to the operator's input specs.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Bindings written, positionally matched to the operator's outputs.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Node-level renames layered over the operator's dynamic attributes.
    #[serde(default)]
    pub extra_dynattrs: BTreeMap<String, String>,
}

/// The pipeline graph in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VariantTopology {
    pub nodes: Vec<NodeDef>,
}

impl VariantTopology {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Checks wiring that does not depend on caller inputs.
    ///
    /// # Checks
    /// - Every node refers to a configured operator instance.
    /// - Each node wires as many inputs and outputs as its operator declares.
    /// - No binding has two writers.
    /// - No node writes a pipeline input.
    pub fn validate_wiring<'a>(
        &self,
        ops: &[OperatorInstanceConfig],
        pipeline_inputs: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), TopologyError> {
        let pipeline_inputs: HashSet<&str> = pipeline_inputs.into_iter().collect();
        let mut writers: HashMap<&str, usize> = HashMap::new();

        for (i, node) in self.nodes.iter().enumerate() {
            let op = ops
                .iter()
                .find(|o| o.id == node.op_instance_id)
                .ok_or_else(|| TopologyError::UnknownOperator {
                    node: i,
                    op: node.op_instance_id.clone(),
                })?;

            for (direction, expected, actual) in [
                ("inputs", op.inputs.len(), node.inputs.len()),
                ("outputs", op.outputs.len(), node.outputs.len()),
            ] {
                if expected != actual {
                    return Err(TopologyError::ArityMismatch {
                        node: i,
                        op: node.op_instance_id.clone(),
                        direction,
                        expected,
                        actual,
                    });
                }
            }

            for binding in &node.outputs {
                if pipeline_inputs.contains(binding.as_str()) {
                    return Err(TopologyError::WritesPipelineInput {
                        node: i,
                        op: node.op_instance_id.clone(),
                        binding: binding.clone(),
                    });
                }
                if let Some(&first) = writers.get(binding.as_str()) {
                    return Err(TopologyError::DuplicateWriter {
                        binding: binding.clone(),
                        first,
                        second: i,
                    });
                }
                writers.insert(binding.as_str(), i);
            }
        }
        Ok(())
    }

    /// Computes the execution order given the initially available bindings.
    ///
    /// Repeatedly picks the earliest node, in declaration order, whose
    /// inputs are all available. The order is therefore deterministic.
    /// When no node is ready before all have been scheduled, reports a
    /// binding that nothing produces if there is one, otherwise a cycle.
    pub fn schedule<'a>(
        &self,
        available: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<usize>, TopologyError> {
        let mut ready: HashSet<&str> = available.into_iter().collect();
        let mut scheduled = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(i) = (0..self.nodes.len()).find(|&i| {
            !scheduled[i]
                && self.nodes[i]
                    .inputs
                    .iter()
                    .all(|b| ready.contains(b.as_str()))
        }) {
            scheduled[i] = true;
            order.push(i);
            ready.extend(self.nodes[i].outputs.iter().map(String::as_str));
        }

        if order.len() == self.nodes.len() {
            return Ok(order);
        }

        let producible: HashSet<&str> = self
            .nodes
            .iter()
            .flat_map(|n| n.outputs.iter().map(String::as_str))
            .chain(ready.iter().copied())
            .collect();
        let stuck: Vec<usize> = (0..self.nodes.len()).filter(|&i| !scheduled[i]).collect();
        for &i in &stuck {
            let node = &self.nodes[i];
            if let Some(binding) = node.inputs.iter().find(|b| !producible.contains(b.as_str())) {
                return Err(TopologyError::UnresolvedBinding {
                    node: i,
                    op: node.op_instance_id.clone(),
                    binding: binding.clone(),
                });
            }
        }
        Err(TopologyError::Cycle {
            ops: stuck
                .into_iter()
                .map(|i| self.nodes[i].op_instance_id.clone())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OpTensorSpec;

    fn node(op: &str, inputs: &[&str], outputs: &[&str]) -> NodeDef {
        NodeDef {
            op_instance_id: op.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            extra_dynattrs: BTreeMap::new(),
        }
    }

    fn op(id: &str, inputs: usize, outputs: usize) -> OperatorInstanceConfig {
        let spec = |i| OpTensorSpec {
            name: format!("t{i}"),
            dtype: "float32".into(),
            shape: Default::default(),
        };
        OperatorInstanceConfig {
            id: id.to_string(),
            op: "identity".to_string(),
            inputs: (0..inputs).map(spec).collect(),
            outputs: (0..outputs).map(spec).collect(),
            attributes: serde_json::Value::Null,
            dynamic_attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_parse_variant_config() {
        let topo: VariantTopology = serde_json::from_str(
            r#"{"nodes": [
                {"op_instance_id": "pre", "inputs": ["x"], "outputs": ["h"]},
                {"op_instance_id": "det", "inputs": ["h"], "outputs": ["y"],
                 "extra_dynattrs": {"iou": "iou_threshold"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(topo.len(), 2);
        assert_eq!(topo.nodes[1].extra_dynattrs["iou"], "iou_threshold");
    }

    #[test]
    fn test_schedule_follows_dependencies_not_declaration() {
        let topo = VariantTopology {
            nodes: vec![
                node("c", &["b_out"], &["c_out"]),
                node("b", &["a_out"], &["b_out"]),
                node("a", &["x"], &["a_out"]),
            ],
        };
        assert_eq!(topo.schedule(["x"]).unwrap(), [2, 1, 0]);
    }

    #[test]
    fn test_schedule_prefers_declaration_order_among_ready() {
        let topo = VariantTopology {
            nodes: vec![
                node("late", &["mid"], &["y"]),
                node("first", &["x"], &["mid"]),
                node("second", &["x"], &["z"]),
            ],
        };
        assert_eq!(topo.schedule(["x"]).unwrap(), [1, 0, 2]);
    }

    #[test]
    fn test_schedule_cycle() {
        let topo = VariantTopology {
            nodes: vec![
                node("ok", &["x"], &["a"]),
                node("p", &["a", "q_out"], &["p_out"]),
                node("q", &["p_out"], &["q_out"]),
            ],
        };
        assert_eq!(
            topo.schedule(["x"]).unwrap_err(),
            TopologyError::Cycle {
                ops: vec!["p".into(), "q".into()]
            }
        );
    }

    #[test]
    fn test_schedule_unresolved_binding() {
        let topo = VariantTopology {
            nodes: vec![node("a", &["x", "ghost"], &["y"])],
        };
        assert_eq!(
            topo.schedule(["x"]).unwrap_err(),
            TopologyError::UnresolvedBinding {
                node: 0,
                op: "a".into(),
                binding: "ghost".into()
            }
        );
    }

    #[test]
    fn test_validate_wiring() {
        let ops = [op("a", 1, 1), op("b", 1, 1)];

        let dup = VariantTopology {
            nodes: vec![node("a", &["x"], &["y"]), node("b", &["x"], &["y"])],
        };
        assert_eq!(
            dup.validate_wiring(&ops, ["x"]).unwrap_err(),
            TopologyError::DuplicateWriter {
                binding: "y".into(),
                first: 0,
                second: 1
            }
        );

        let overwrite = VariantTopology {
            nodes: vec![node("a", &["y"], &["x"])],
        };
        assert!(matches!(
            overwrite.validate_wiring(&ops, ["x"]),
            Err(TopologyError::WritesPipelineInput { .. })
        ));

        let unknown = VariantTopology {
            nodes: vec![node("zzz", &["x"], &["y"])],
        };
        assert!(matches!(
            unknown.validate_wiring(&ops, ["x"]),
            Err(TopologyError::UnknownOperator { node: 0, .. })
        ));

        let arity = VariantTopology {
            nodes: vec![node("a", &["x"], &["y", "z"])],
        };
        assert!(matches!(
            arity.validate_wiring(&ops, ["x"]),
            Err(TopologyError::ArityMismatch {
                direction: "outputs",
                expected: 1,
                actual: 2,
                ..
            })
        ));

        let ok = VariantTopology {
            nodes: vec![node("a", &["x"], &["h"]), node("b", &["h"], &["y"])],
        };
        ok.validate_wiring(&ops, ["x"]).unwrap();
    }
}
