// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the package runtime.

use std::path::PathBuf;

/// Errors raised by operator implementations.
#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    /// The operator instance's static configuration is unusable.
    #[error("invalid operator configuration: {0}")]
    Config(String),

    /// A package resource the operator needs is missing or malformed.
    #[error("resource '{path}': {detail}")]
    Resource { path: String, detail: String },

    /// The operator received inputs it cannot process.
    #[error("invalid input: {0}")]
    Input(String),

    /// The computation itself failed.
    #[error("compute failed: {0}")]
    Compute(String),

    /// A tensor operation failed.
    #[error(transparent)]
    Tensor(#[from] tensor_core::TensorError),

    /// Catch-all for errors from wrapped engines.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that abort a single compute call.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The topology is miswired or cannot be scheduled.
    #[error(transparent)]
    Topology(#[from] package_ir::TopologyError),

    /// A pipeline input declared by the manifest was not supplied.
    #[error("missing required input '{0}'")]
    MissingInput(String),

    /// A caller input does not match the manifest's declared shape.
    #[error("input '{name}' rejected: {source}")]
    InvalidInput {
        name: String,
        #[source]
        source: tensor_core::TensorError,
    },

    /// A binding does not match the operator's declared input shape.
    #[error("node #{node} ('{op}'), binding '{binding}': {source}")]
    ShapeMismatch {
        node: usize,
        op: String,
        binding: String,
        #[source]
        source: tensor_core::TensorError,
    },

    /// No warmed operator instance exists for a node.
    #[error("node #{node} refers to operator instance '{op}', which is not instantiated")]
    UnknownOperator { node: usize, op: String },

    /// An operator returned a different number of outputs than wired.
    #[error("node #{node} ('{op}') returned {actual} outputs, expected {expected}")]
    OutputArity {
        node: usize,
        op: String,
        expected: usize,
        actual: usize,
    },

    /// A declared pipeline output was never produced.
    #[error("pipeline output '{0}' was not produced by any node")]
    MissingOutput(String),

    /// An operator failed while computing.
    #[error("node #{node} ('{op}') failed: {source}")]
    OperatorFailed {
        node: usize,
        op: String,
        #[source]
        source: OperatorError,
    },
}

/// Errors surfaced by [`crate::PackageHandle`].
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Loading or assembling the package failed.
    #[error("package error: {0}")]
    Package(#[from] package_ir::PackageError),

    /// `compute` was called before `warmup`.
    #[error("handle is not warmed up; call warmup() first")]
    NotWarmedUp,

    /// The handle was released and can no longer be used.
    #[error("handle has been released")]
    Released,

    /// No factory is registered for an operator kind.
    #[error("operator instance '{id}' has unknown kind '{kind}'")]
    UnknownOperatorKind { id: String, kind: String },

    /// Two operator instances share an id.
    #[error("duplicate operator instance id '{0}'")]
    DuplicateOperator(String),

    /// Creating or warming an operator instance failed.
    #[error("operator instance '{id}' failed to initialise: {source}")]
    Operator {
        id: String,
        #[source]
        source: OperatorError,
    },

    /// A compute call failed.
    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Filesystem access failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
