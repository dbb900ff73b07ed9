// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dependency-ordered pipeline execution.
//!
//! A compute call runs in two phases:
//!
//! 1. **Plan**: check wiring, required caller inputs and (optionally) their
//!    declared shapes, then compute the complete node order. Nothing has run
//!    yet, so cycles and unresolved bindings never leave partial work behind.
//! 2. **Run**: await each node in order. Inputs are validated against the
//!    operator's declared shapes before the call and its positional outputs
//!    are bound to the node's output names after it.
//!
//! Bindings live for one call only, so concurrent calls share nothing but
//! the operator instances themselves.

use crate::operator::{DynamicAttributeView, DynamicAttributes, Operator, OperatorInputs};
use crate::{ComputeMetrics, ExecutionError};
use package_ir::{ContentType, Manifest, OperatorInstanceConfig, VariantTopology};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tensor_core::Tensor;

/// Named values produced by a compute call.
pub type PipelineOutputs = HashMap<String, Tensor>;

/// Executes one topology over a set of warmed operator instances.
///
/// The executor borrows everything it needs; it is built per call by
/// [`crate::PackageHandle`] and may also be driven directly.
pub struct PipelineExecutor<'a> {
    manifest: &'a Manifest,
    topology: &'a VariantTopology,
    configs: &'a [OperatorInstanceConfig],
    instances: &'a HashMap<String, Box<dyn Operator>>,
    validate_caller_inputs: bool,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(
        manifest: &'a Manifest,
        topology: &'a VariantTopology,
        configs: &'a [OperatorInstanceConfig],
        instances: &'a HashMap<String, Box<dyn Operator>>,
    ) -> Self {
        Self {
            manifest,
            topology,
            configs,
            instances,
            validate_caller_inputs: true,
        }
    }

    /// Enables or disables checking caller inputs against manifest shapes.
    pub fn validate_caller_inputs(mut self, enabled: bool) -> Self {
        self.validate_caller_inputs = enabled;
        self
    }

    /// Runs the pipeline and returns the manifest's declared outputs.
    pub async fn run(
        &self,
        inputs: HashMap<String, Tensor>,
        dynamic_attributes: &DynamicAttributes,
    ) -> Result<PipelineOutputs, ExecutionError> {
        let mut metrics = ComputeMetrics::new(self.topology.len());
        self.run_profiled(inputs, dynamic_attributes, &mut metrics)
            .await
    }

    /// Like [`run`](Self::run), recording per-node metrics.
    pub async fn run_profiled(
        &self,
        inputs: HashMap<String, Tensor>,
        dynamic_attributes: &DynamicAttributes,
        metrics: &mut ComputeMetrics,
    ) -> Result<PipelineOutputs, ExecutionError> {
        let start = Instant::now();
        let order = self.plan(&inputs)?;

        // Only declared inputs seed the bindings; anything else the caller
        // passes could shadow a node output.
        let mut bindings: HashMap<String, Arc<Tensor>> = HashMap::with_capacity(inputs.len());
        for (name, tensor) in inputs {
            if self.manifest.input(&name).is_some() {
                bindings.insert(name, Arc::new(tensor));
            } else {
                tracing::warn!("ignoring undeclared caller input '{}'", name);
            }
        }

        for node_index in order {
            self.run_node(node_index, &mut bindings, dynamic_attributes, metrics)
                .await?;
        }

        let outputs = self.collect_outputs(bindings)?;
        metrics.finalise(start.elapsed());
        tracing::debug!("{}", metrics.summary());
        Ok(outputs)
    }

    // ── Plan ──────────────────────────────────────────────────

    fn plan(&self, inputs: &HashMap<String, Tensor>) -> Result<Vec<usize>, ExecutionError> {
        self.topology
            .validate_wiring(self.configs, self.manifest.input_names())?;

        for decl in &self.manifest.inputs {
            let tensor = inputs
                .get(&decl.name)
                .ok_or_else(|| ExecutionError::MissingInput(decl.name.clone()))?;
            if self.validate_caller_inputs && decl.content_type == ContentType::NdJson {
                decl.shape
                    .validate(tensor.shape())
                    .map_err(|source| ExecutionError::InvalidInput {
                        name: decl.name.clone(),
                        source,
                    })?;
            }
        }

        let order = self.topology.schedule(self.manifest.input_names())?;
        tracing::debug!("execution order: {:?}", order);
        Ok(order)
    }

    // ── Run ───────────────────────────────────────────────────

    async fn run_node(
        &self,
        node_index: usize,
        bindings: &mut HashMap<String, Arc<Tensor>>,
        dynamic_attributes: &DynamicAttributes,
        metrics: &mut ComputeMetrics,
    ) -> Result<(), ExecutionError> {
        let node = &self.topology.nodes[node_index];
        let op_id = &node.op_instance_id;
        let unknown = || ExecutionError::UnknownOperator {
            node: node_index,
            op: op_id.clone(),
        };
        let config = self
            .configs
            .iter()
            .find(|c| &c.id == op_id)
            .ok_or_else(unknown)?;
        let instance = self.instances.get(op_id).ok_or_else(unknown)?;

        let mut node_inputs = Vec::with_capacity(node.inputs.len());
        for (binding, spec) in node.inputs.iter().zip(&config.inputs) {
            // The schedule guarantees every input is bound by now.
            let tensor = bindings.get(binding).ok_or_else(|| {
                ExecutionError::Topology(package_ir::TopologyError::UnresolvedBinding {
                    node: node_index,
                    op: op_id.clone(),
                    binding: binding.clone(),
                })
            })?;
            spec.shape
                .validate(tensor.shape())
                .map_err(|source| ExecutionError::ShapeMismatch {
                    node: node_index,
                    op: op_id.clone(),
                    binding: binding.clone(),
                    source,
                })?;
            node_inputs.push((binding.clone(), Arc::clone(tensor)));
        }
        let node_inputs = OperatorInputs::new(node_inputs);

        let view = DynamicAttributeView::new(
            dynamic_attributes,
            &config.dynamic_attributes,
            &node.extra_dynattrs,
        );

        let started = Instant::now();
        let result = instance
            .compute(&node_inputs, &view)
            .await
            .map_err(|source| ExecutionError::OperatorFailed {
                node: node_index,
                op: op_id.clone(),
                source,
            })?;
        let elapsed = started.elapsed();

        if result.outputs.len() != node.outputs.len() {
            return Err(ExecutionError::OutputArity {
                node: node_index,
                op: op_id.clone(),
                expected: node.outputs.len(),
                actual: result.outputs.len(),
            });
        }

        tracing::debug!(
            "node #{} '{}' ({}) produced {} outputs in {:?}",
            node_index,
            op_id,
            config.op,
            result.outputs.len(),
            elapsed
        );
        metrics.record_node(node_index, op_id.clone(), elapsed, result.outputs.len());

        for (binding, tensor) in node.outputs.iter().zip(result.outputs) {
            bindings.insert(binding.clone(), Arc::new(tensor));
        }
        Ok(())
    }

    fn collect_outputs(
        &self,
        mut bindings: HashMap<String, Arc<Tensor>>,
    ) -> Result<PipelineOutputs, ExecutionError> {
        let mut outputs = PipelineOutputs::with_capacity(self.manifest.outputs.len());
        for decl in &self.manifest.outputs {
            let tensor = bindings
                .remove(&decl.name)
                .ok_or_else(|| ExecutionError::MissingOutput(decl.name.clone()))?;
            // Other bindings are gone by now, so this rarely copies.
            let tensor = Arc::try_unwrap(tensor).unwrap_or_else(|shared| (*shared).clone());
            outputs.insert(decl.name.clone(), tensor);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::OperatorOutput;
    use crate::OperatorError;
    use async_trait::async_trait;
    use serde_json::json;
    use tensor_core::Shape;

    /// Concatenates its inputs' f32 values and appends `bias` (if given).
    struct Concat;

    #[async_trait]
    impl Operator for Concat {
        async fn compute(
            &self,
            inputs: &OperatorInputs,
            attrs: &DynamicAttributeView<'_>,
        ) -> Result<OperatorOutput, OperatorError> {
            let mut values = Vec::new();
            for (_, t) in inputs.iter() {
                values.extend(t.to_f32_vec()?);
            }
            if let Some(bias) = attrs.get("bias").and_then(|v| v.as_f64()) {
                values.push(bias as f32);
            }
            let t = Tensor::from_f32(Shape::vector(values.len()), &values)?;
            Ok(OperatorOutput::single(t))
        }
    }

    fn fixture(ops: serde_json::Value, nodes: serde_json::Value) -> (Manifest, VariantTopology, Vec<OperatorInstanceConfig>) {
        let manifest = Manifest::from_value(json!({
            "name": "t",
            "inputs": [{"name": "a", "dtype": "float32", "shape": [1]}],
            "outputs": [{"name": "out", "dtype": "float32"}]
        }))
        .unwrap();
        let topology: VariantTopology = serde_json::from_value(json!({ "nodes": nodes })).unwrap();
        let configs: Vec<OperatorInstanceConfig> = serde_json::from_value(ops).unwrap();
        (manifest, topology, configs)
    }

    fn instances(ids: &[&str]) -> HashMap<String, Box<dyn Operator>> {
        ids.iter()
            .map(|id| (id.to_string(), Box::new(Concat) as Box<dyn Operator>))
            .collect()
    }

    fn input(v: f32) -> HashMap<String, Tensor> {
        HashMap::from([("a".to_string(), Tensor::from_f32(Shape::vector(1), &[v]).unwrap())])
    }

    #[tokio::test]
    async fn test_chain_and_dynamic_attribute_mapping() {
        let (manifest, topology, configs) = fixture(
            json!([
                {"id": "first", "op": "concat", "inputs": [{"name": "x", "dtype": "float32"}],
                 "outputs": [{"name": "y", "dtype": "float32"}],
                 "dynamic_attributes": {"bias": "first_bias"}},
                {"id": "second", "op": "concat", "inputs": [{"name": "x", "dtype": "float32"}],
                 "outputs": [{"name": "y", "dtype": "float32"}]}
            ]),
            json!([
                {"op_instance_id": "second", "inputs": ["mid"], "outputs": ["out"],
                 "extra_dynattrs": {"bias": "second_bias"}},
                {"op_instance_id": "first", "inputs": ["a"], "outputs": ["mid"]}
            ]),
        );
        let instances = instances(&["first", "second"]);
        let executor = PipelineExecutor::new(&manifest, &topology, &configs, &instances);

        let attrs = DynamicAttributes::from([
            ("first_bias".to_string(), json!(10.0)),
            ("second_bias".to_string(), json!(20.0)),
        ]);
        let mut metrics = ComputeMetrics::new(topology.len());
        let out = executor
            .run_profiled(input(1.0), &attrs, &mut metrics)
            .await
            .unwrap();
        assert_eq!(out["out"].to_f32_vec().unwrap(), [1.0, 10.0, 20.0]);
        assert_eq!(metrics.execution_order(), [1, 0]);
    }

    #[tokio::test]
    async fn test_plan_failures_run_nothing() {
        let (manifest, topology, configs) = fixture(
            json!([{"id": "n", "op": "concat", "inputs": [{"name": "x", "dtype": "float32"}],
                    "outputs": [{"name": "y", "dtype": "float32"}]}]),
            json!([{"op_instance_id": "n", "inputs": ["ghost"], "outputs": ["out"]}]),
        );
        let instances = instances(&["n"]);
        let executor = PipelineExecutor::new(&manifest, &topology, &configs, &instances);

        let mut metrics = ComputeMetrics::new(1);
        let err = executor
            .run_profiled(input(1.0), &DynamicAttributes::new(), &mut metrics)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Topology(package_ir::TopologyError::UnresolvedBinding { .. })
        ));
        assert!(metrics.node_metrics.is_empty());

        let err = executor
            .run(HashMap::new(), &DynamicAttributes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::MissingInput(name) if name == "a"));
    }

    #[tokio::test]
    async fn test_caller_shape_check_can_be_disabled() {
        let (manifest, topology, configs) = fixture(
            json!([{"id": "n", "op": "concat", "inputs": [{"name": "x", "dtype": "float32"}],
                    "outputs": [{"name": "y", "dtype": "float32"}]}]),
            json!([{"op_instance_id": "n", "inputs": ["a"], "outputs": ["out"]}]),
        );
        let instances = instances(&["n"]);
        let wide = HashMap::from([(
            "a".to_string(),
            Tensor::from_f32(Shape::vector(2), &[1.0, 2.0]).unwrap(),
        )]);

        let strict = PipelineExecutor::new(&manifest, &topology, &configs, &instances);
        assert!(matches!(
            strict.run(wide.clone(), &DynamicAttributes::new()).await,
            Err(ExecutionError::InvalidInput { .. })
        ));

        let lenient = PipelineExecutor::new(&manifest, &topology, &configs, &instances)
            .validate_caller_inputs(false);
        let out = lenient.run(wide, &DynamicAttributes::new()).await.unwrap();
        assert_eq!(out["out"].to_f32_vec().unwrap(), [1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_undeclared_caller_input_cannot_shadow_node_output() {
        let (manifest, topology, configs) = fixture(
            json!([
                {"id": "first", "op": "concat", "inputs": [{"name": "x", "dtype": "float32"}],
                 "outputs": [{"name": "y", "dtype": "float32"}]},
                {"id": "second", "op": "concat", "inputs": [{"name": "x", "dtype": "float32"}],
                 "outputs": [{"name": "y", "dtype": "float32"}]}
            ]),
            json!([
                {"op_instance_id": "second", "inputs": ["mid"], "outputs": ["out"]},
                {"op_instance_id": "first", "inputs": ["a"], "outputs": ["mid"]}
            ]),
        );
        let instances = instances(&["first", "second"]);
        let executor = PipelineExecutor::new(&manifest, &topology, &configs, &instances);

        let mut inputs = input(1.0);
        inputs.insert(
            "mid".to_string(),
            Tensor::from_f32(Shape::vector(1), &[100.0]).unwrap(),
        );
        let mut metrics = ComputeMetrics::new(topology.len());
        let out = executor
            .run_profiled(inputs, &DynamicAttributes::new(), &mut metrics)
            .await
            .unwrap();
        assert_eq!(out["out"].to_f32_vec().unwrap(), [1.0]);
        assert_eq!(metrics.execution_order(), [1, 0]);
    }

    #[tokio::test]
    async fn test_missing_instance_is_unknown_operator() {
        let (manifest, topology, configs) = fixture(
            json!([{"id": "n", "op": "concat", "inputs": [{"name": "x", "dtype": "float32"}],
                    "outputs": [{"name": "y", "dtype": "float32"}]}]),
            json!([{"op_instance_id": "n", "inputs": ["a"], "outputs": ["out"]}]),
        );
        let instances = instances(&[]);
        let executor = PipelineExecutor::new(&manifest, &topology, &configs, &instances);
        assert!(matches!(
            executor.run(input(1.0), &DynamicAttributes::new()).await,
            Err(ExecutionError::UnknownOperator { node: 0, .. })
        ));
    }
}
