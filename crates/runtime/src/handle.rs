// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The package handle and its lifecycle.
//!
//! ```text
//! PackageHandle::from_bytes / from_path
//!     │               (Uninitialized)
//!     │  .warmup()
//!     ▼
//!   Warmed ── .compute() / .compute_profiled() ──▶ outputs
//!     │
//!     │  .release()
//!     ▼
//!   Released
//! ```

use crate::executor::{PipelineExecutor, PipelineOutputs};
use crate::operator::{DynamicAttributes, Operator, OperatorRegistry};
use crate::resources::{map_archive, materialize};
use crate::{ComputeMetrics, ExtractMode, RuntimeConfig, RuntimeError};
use package_ir::{
    ArchiveFiles, AssembledPackage, DTypeRegistry, DirectoryFiles, Manifest,
    OperatorInstanceConfig, PackageAssembler, PackageFiles, VariantTopology,
};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tensor_core::Tensor;

/// Lifecycle state of a [`PackageHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Assembled; operators not yet instantiated.
    Uninitialized,
    /// Operators instantiated and warmed; ready to compute.
    Warmed,
    /// Scratch storage and operators dropped; unusable.
    Released,
}

impl std::fmt::Display for HandleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandleState::Uninitialized => "uninitialized",
            HandleState::Warmed => "warmed",
            HandleState::Released => "released",
        };
        f.write_str(s)
    }
}

/// A loaded inference package.
///
/// Construction assembles the package; [`warmup`](Self::warmup)
/// instantiates its operators; [`compute`](Self::compute) runs the
/// pipeline. Compute takes `&self`, so a warmed handle can serve concurrent
/// calls behind an `Arc`.
///
/// # Example
/// ```no_run
/// use runtime::{OperatorRegistry, PackageHandle, RuntimeConfig};
/// use std::collections::HashMap;
///
/// # async fn example() -> Result<(), runtime::RuntimeError> {
/// let registry = OperatorRegistry::new();
/// let mut handle =
///     PackageHandle::from_path("detector.fnnx", registry, RuntimeConfig::default()).await?;
/// handle.warmup().await?;
/// let outputs = handle.compute(HashMap::new(), &HashMap::new()).await?;
/// println!("{} outputs", outputs.len());
/// handle.release();
/// # Ok(())
/// # }
/// ```
pub struct PackageHandle {
    package: AssembledPackage,
    files: Arc<dyn PackageFiles>,
    scratch: Option<TempDir>,
    registry: OperatorRegistry,
    config: RuntimeConfig,
    instances: HashMap<String, Box<dyn Operator>>,
    state: HandleState,
}

// ── Construction ──────────────────────────────────────────────

impl PackageHandle {
    /// Loads a package from archive bytes.
    ///
    /// In [`ExtractMode::InMemory`] the bytes are indexed in place; in
    /// [`ExtractMode::Scratch`] they are extracted into a scratch directory.
    pub fn from_bytes(
        bytes: Vec<u8>,
        registry: OperatorRegistry,
        config: RuntimeConfig,
    ) -> Result<Self, RuntimeError> {
        match config.extract_mode {
            ExtractMode::InMemory => {
                let files = ArchiveFiles::from_vec(bytes)?;
                Self::open(Arc::new(files), None, registry, config)
            }
            ExtractMode::Scratch => {
                let (scratch, files) = materialize(&bytes, &config)?;
                Self::open(Arc::new(files), Some(scratch), registry, config)
            }
        }
    }

    /// Loads a package from disk.
    ///
    /// A directory is treated as an already extracted package. A file is
    /// memory-mapped ([`ExtractMode::InMemory`]) or extracted into scratch
    /// storage ([`ExtractMode::Scratch`]).
    pub async fn from_path(
        path: impl AsRef<Path>,
        registry: OperatorRegistry,
        config: RuntimeConfig,
    ) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|source| RuntimeError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        if meta.is_dir() {
            tracing::info!("opening extracted package {}", path.display());
            let files = DirectoryFiles::new(path)?;
            return Self::open(Arc::new(files), None, registry, config);
        }

        match config.extract_mode {
            ExtractMode::InMemory => {
                let files = ArchiveFiles::new(map_archive(path)?)?;
                Self::open(Arc::new(files), None, registry, config)
            }
            ExtractMode::Scratch => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|source| RuntimeError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Self::from_bytes(bytes, registry, config)
            }
        }
    }

    fn open(
        files: Arc<dyn PackageFiles>,
        scratch: Option<TempDir>,
        registry: OperatorRegistry,
        config: RuntimeConfig,
    ) -> Result<Self, RuntimeError> {
        let package = PackageAssembler::assemble(files.as_ref())?;
        match &scratch {
            Some(dir) => tracing::info!(
                "package '{}' loaded from scratch directory {}",
                package.manifest.name,
                dir.path().display()
            ),
            None => tracing::info!("package '{}' loaded from {:?}", package.manifest.name, files),
        }
        Ok(Self {
            package,
            files,
            scratch,
            registry,
            config,
            instances: HashMap::new(),
            state: HandleState::Uninitialized,
        })
    }
}

// ── Lifecycle ─────────────────────────────────────────────────

impl PackageHandle {
    /// Instantiates every operator instance and awaits its warmup.
    ///
    /// Calling this on a warmed handle does nothing. On failure the handle
    /// stays uninitialized and no instances are kept.
    pub async fn warmup(&mut self) -> Result<(), RuntimeError> {
        match self.state {
            HandleState::Released => return Err(RuntimeError::Released),
            HandleState::Warmed => {
                tracing::debug!("package '{}' already warmed", self.package.manifest.name);
                return Ok(());
            }
            HandleState::Uninitialized => {}
        }

        let mut instances: HashMap<String, Box<dyn Operator>> =
            HashMap::with_capacity(self.package.operators.len());
        for config in &self.package.operators {
            if instances.contains_key(&config.id) {
                return Err(RuntimeError::DuplicateOperator(config.id.clone()));
            }
            let factory =
                self.registry
                    .get(&config.op)
                    .ok_or_else(|| RuntimeError::UnknownOperatorKind {
                        id: config.id.clone(),
                        kind: config.op.clone(),
                    })?;
            let operator_error = |source| RuntimeError::Operator {
                id: config.id.clone(),
                source,
            };
            let mut instance = factory
                .create(config, Arc::clone(&self.files))
                .map_err(operator_error)?;
            instance.warmup().await.map_err(operator_error)?;
            tracing::debug!("warmed operator instance {}", config.summary());
            instances.insert(config.id.clone(), instance);
        }

        self.instances = instances;
        self.state = HandleState::Warmed;
        tracing::info!(
            "package '{}' warmed: {} operator instances",
            self.package.manifest.name,
            self.instances.len()
        );
        Ok(())
    }

    /// Runs the pipeline on named inputs.
    ///
    /// Returns the bindings the manifest declares as outputs. Errors leave
    /// the handle usable.
    pub async fn compute(
        &self,
        inputs: HashMap<String, Tensor>,
        dynamic_attributes: &DynamicAttributes,
    ) -> Result<PipelineOutputs, RuntimeError> {
        let (outputs, _) = self.compute_profiled(inputs, dynamic_attributes).await?;
        Ok(outputs)
    }

    /// Like [`compute`](Self::compute), also returning per-node metrics.
    pub async fn compute_profiled(
        &self,
        inputs: HashMap<String, Tensor>,
        dynamic_attributes: &DynamicAttributes,
    ) -> Result<(PipelineOutputs, ComputeMetrics), RuntimeError> {
        self.ensure_warmed()?;
        let executor = PipelineExecutor::new(
            &self.package.manifest,
            &self.package.topology,
            &self.package.operators,
            &self.instances,
        )
        .validate_caller_inputs(self.config.validate_caller_inputs);

        let mut metrics = ComputeMetrics::new(self.package.topology.len());
        let outputs = executor
            .run_profiled(inputs, dynamic_attributes, &mut metrics)
            .await?;
        if self.config.enable_profiling {
            tracing::info!("{}", metrics.summary());
        }
        Ok((outputs, metrics))
    }

    /// Drops operator instances and removes scratch storage. Idempotent.
    pub fn release(&mut self) {
        if self.state == HandleState::Released {
            return;
        }
        self.instances.clear();
        if let Some(scratch) = self.scratch.take() {
            let path = scratch.path().to_path_buf();
            if let Err(e) = scratch.close() {
                tracing::warn!("failed to remove scratch directory {}: {e}", path.display());
            }
        }
        self.state = HandleState::Released;
        tracing::info!("package '{}' released", self.package.manifest.name);
    }

    fn ensure_warmed(&self) -> Result<(), RuntimeError> {
        match self.state {
            HandleState::Warmed => Ok(()),
            HandleState::Uninitialized => Err(RuntimeError::NotWarmedUp),
            HandleState::Released => Err(RuntimeError::Released),
        }
    }
}

// ── Accessors ─────────────────────────────────────────────────

impl PackageHandle {
    /// Returns a copy of the patched manifest.
    pub fn manifest(&self) -> Manifest {
        self.package.manifest.clone()
    }

    pub fn metadata(&self) -> &[Value] {
        &self.package.metadata
    }

    pub fn dtypes(&self) -> &DTypeRegistry {
        &self.package.dtypes
    }

    pub fn operator_configs(&self) -> &[OperatorInstanceConfig] {
        &self.package.operators
    }

    pub fn topology(&self) -> &VariantTopology {
        &self.package.topology
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    pub fn is_warmed(&self) -> bool {
        self.state == HandleState::Warmed
    }

    /// Package file access, as handed to operator factories.
    pub fn files(&self) -> Arc<dyn PackageFiles> {
        Arc::clone(&self.files)
    }

    /// The scratch directory, when the package was extracted.
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }
}

impl std::fmt::Debug for PackageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageHandle")
            .field("package", &self.package.manifest.name)
            .field("state", &self.state)
            .field("extract_mode", &self.config.extract_mode.as_str())
            .field("scratch_dir", &self.scratch_dir())
            .field("instances", &self.instances.len())
            .field("registry", &self.registry)
            .finish()
    }
}
