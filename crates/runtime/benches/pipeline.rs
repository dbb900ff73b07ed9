// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for package loading and pipeline scheduling overhead.

use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use package_ir::{OperatorInstanceConfig, PackageFiles};
use runtime::{
    DynamicAttributeView, DynamicAttributes, Operator, OperatorError, OperatorFactory,
    OperatorInputs, OperatorOutput, OperatorRegistry, PackageHandle, RuntimeConfig,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tensor_core::{Shape, Tensor};

struct Identity;

#[async_trait]
impl Operator for Identity {
    async fn compute(
        &self,
        inputs: &OperatorInputs,
        _: &DynamicAttributeView<'_>,
    ) -> Result<OperatorOutput, OperatorError> {
        Ok(OperatorOutput::single(inputs.require(0)?.clone()))
    }
}

struct IdentityFactory;

impl OperatorFactory for IdentityFactory {
    fn kind(&self) -> &str {
        "identity"
    }

    fn create(
        &self,
        _: &OperatorInstanceConfig,
        _: Arc<dyn PackageFiles>,
    ) -> Result<Box<dyn Operator>, OperatorError> {
        Ok(Box::new(Identity))
    }
}

/// A chain of `len` identity nodes declared in reverse dependency order,
/// the worst case for the ready-node scan.
fn chain_archive(len: usize) -> Vec<u8> {
    let ops: Vec<_> = (0..len)
        .map(|i| {
            json!({"id": format!("n{i}"), "op": "identity",
                   "inputs": [{"name": "x", "dtype": "float32"}],
                   "outputs": [{"name": "y", "dtype": "float32"}]})
        })
        .collect();
    let nodes: Vec<_> = (0..len)
        .rev()
        .map(|i| {
            let input = if i == 0 { "x".to_string() } else { format!("b{}", i - 1) };
            json!({"op_instance_id": format!("n{i}"), "inputs": [input], "outputs": [format!("b{i}")]})
        })
        .collect();
    let manifest = json!({
        "name": "chain",
        "inputs": [{"name": "x", "dtype": "float32"}],
        "outputs": [{"name": format!("b{}", len - 1), "dtype": "float32"}]
    });

    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in [
        ("manifest.json", manifest.to_string()),
        ("ops.json", json!(ops).to_string()),
        ("variant_config.json", json!({ "nodes": nodes }).to_string()),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        builder.append_data(&mut header, path, data.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap()
}

fn registry() -> OperatorRegistry {
    let mut registry = OperatorRegistry::new();
    registry.register(IdentityFactory);
    registry
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");
    for len in [8, 64] {
        let bytes = chain_archive(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &bytes, |b, bytes| {
            b.iter(|| {
                PackageHandle::from_bytes(bytes.clone(), registry(), RuntimeConfig::default())
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_compute(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let config = RuntimeConfig {
        enable_profiling: false,
        ..Default::default()
    };
    let mut group = c.benchmark_group("compute");
    for len in [8, 64] {
        let mut handle =
            PackageHandle::from_bytes(chain_archive(len), registry(), config.clone()).unwrap();
        rt.block_on(handle.warmup()).unwrap();
        let attrs = DynamicAttributes::new();
        group.bench_function(BenchmarkId::from_parameter(len), |b| {
            b.iter(|| {
                let inputs = HashMap::from([(
                    "x".to_string(),
                    Tensor::zeros(Shape::vector(16), tensor_core::DType::F32),
                )]);
                rt.block_on(handle.compute(inputs, &attrs)).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_load, bench_compute);
criterion_main!(benches);
