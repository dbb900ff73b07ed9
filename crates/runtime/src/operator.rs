// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator dispatch: the [`Operator`] trait, its factories and the
//! kind → factory [`OperatorRegistry`].
//!
//! New operator kinds are added by registering a factory; the executor
//! never needs to know about them.

use crate::OperatorError;
use async_trait::async_trait;
use package_ir::{OperatorInstanceConfig, PackageFiles};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tensor_core::Tensor;

/// Caller-supplied dynamic attributes, shared unchanged by every node.
pub type DynamicAttributes = HashMap<String, Value>;

// ── Inputs / outputs ──────────────────────────────────────────

/// The bindings a node reads, in the node's declared input order.
#[derive(Debug, Clone, Default)]
pub struct OperatorInputs {
    entries: Vec<(String, Arc<Tensor>)>,
}

impl OperatorInputs {
    pub fn new(entries: Vec<(String, Arc<Tensor>)>) -> Self {
        Self { entries }
    }

    /// Looks up an input by binding name.
    pub fn get(&self, binding: &str) -> Option<&Tensor> {
        self.entries
            .iter()
            .find(|(name, _)| name == binding)
            .map(|(_, t)| t.as_ref())
    }

    /// Returns the input at a position.
    pub fn at(&self, index: usize) -> Option<&Tensor> {
        self.entries.get(index).map(|(_, t)| t.as_ref())
    }

    /// Like [`at`](Self::at), failing with [`OperatorError::Input`].
    pub fn require(&self, index: usize) -> Result<&Tensor, OperatorError> {
        self.at(index).ok_or_else(|| {
            OperatorError::Input(format!(
                "expected at least {} inputs, got {}",
                index + 1,
                self.entries.len()
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Positional results of one operator call.
#[derive(Debug, Clone, Default)]
pub struct OperatorOutput {
    pub outputs: Vec<Tensor>,
}

impl OperatorOutput {
    pub fn new(outputs: Vec<Tensor>) -> Self {
        Self { outputs }
    }

    pub fn single(tensor: Tensor) -> Self {
        Self {
            outputs: vec![tensor],
        }
    }
}

// ── Dynamic attributes ────────────────────────────────────────

/// A read-only view of the caller's dynamic attributes as one node sees them.
///
/// Names are translated through the node's `extra_dynattrs` first, then the
/// operator instance's `dynamic_attributes`; unmapped names pass through.
/// Values are never copied or transformed.
#[derive(Clone, Copy)]
pub struct DynamicAttributeView<'a> {
    values: &'a DynamicAttributes,
    op_map: &'a BTreeMap<String, String>,
    node_map: &'a BTreeMap<String, String>,
}

impl<'a> DynamicAttributeView<'a> {
    pub fn new(
        values: &'a DynamicAttributes,
        op_map: &'a BTreeMap<String, String>,
        node_map: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            values,
            op_map,
            node_map,
        }
    }

    /// Resolves the caller-level name an operator-local name refers to.
    pub fn resolve<'n>(&self, name: &'n str) -> &'n str
    where
        'a: 'n,
    {
        self.node_map
            .get(name)
            .or_else(|| self.op_map.get(name))
            .map(String::as_str)
            .unwrap_or(name)
    }

    /// Looks up an attribute by the name the operator uses.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.values.get(self.resolve(name))
    }

    /// The unmapped caller attributes.
    pub fn raw(&self) -> &'a DynamicAttributes {
        self.values
    }
}

impl fmt::Debug for DynamicAttributeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicAttributeView")
            .field("attributes", &self.values.len())
            .field("op_map", self.op_map)
            .field("node_map", self.node_map)
            .finish()
    }
}

// ── Operator traits ───────────────────────────────────────────

/// A configured, executable pipeline step.
///
/// `warmup` runs once per handle before any compute; `compute` may run
/// concurrently from several callers and must not mutate shared state
/// without its own synchronisation.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Prepares the operator (loads weights, opens sessions).
    async fn warmup(&mut self) -> Result<(), OperatorError> {
        Ok(())
    }

    /// Computes the outputs for one node invocation.
    async fn compute(
        &self,
        inputs: &OperatorInputs,
        dynamic_attributes: &DynamicAttributeView<'_>,
    ) -> Result<OperatorOutput, OperatorError>;
}

/// Creates operator instances of one kind from their configuration.
pub trait OperatorFactory: Send + Sync {
    /// The `op` name this factory handles.
    fn kind(&self) -> &str;

    /// Instantiates an operator. Package resources are read through `files`.
    fn create(
        &self,
        config: &OperatorInstanceConfig,
        files: Arc<dyn PackageFiles>,
    ) -> Result<Box<dyn Operator>, OperatorError>;
}

/// Maps operator kind names to factories.
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    factories: HashMap<String, Arc<dyn OperatorFactory>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under its [`kind`](OperatorFactory::kind),
    /// replacing any earlier registration.
    pub fn register(&mut self, factory: impl OperatorFactory + 'static) -> &mut Self {
        let kind = factory.kind().to_string();
        if self
            .factories
            .insert(kind.clone(), Arc::new(factory))
            .is_some()
        {
            tracing::warn!("replacing operator factory for kind '{}'", kind);
        }
        self
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn OperatorFactory>> {
        self.factories.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
