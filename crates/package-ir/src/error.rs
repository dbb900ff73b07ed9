// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for package assembly.

use std::path::PathBuf;

/// Errors that abort loading a package.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// The package container is structurally invalid.
    #[error("archive error: {0}")]
    Archive(#[from] archive_reader::ArchiveError),

    /// A package file could not be read from disk.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required package file is absent.
    #[error("package is missing required file '{0}'")]
    MissingFile(&'static str),

    /// A package file is not valid JSON or does not match its schema.
    #[error("failed to parse '{file}': {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// A manifest patch could not be parsed or applied.
    #[error("manifest patch '{file}' failed: {source}")]
    Patch {
        file: String,
        #[source]
        source: manifest_patch::PatchError,
    },

    /// The final manifest is internally inconsistent.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// An entry path would escape the extraction directory.
    #[error("unsafe entry path '{0}'")]
    UnsafePath(String),
}

/// Static wiring defects in a variant topology.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// Two nodes declare the same output binding.
    #[error("binding '{binding}' is written by node #{first} and node #{second}")]
    DuplicateWriter {
        binding: String,
        first: usize,
        second: usize,
    },

    /// A node declares a pipeline input as one of its outputs.
    #[error("node #{node} ('{op}') writes pipeline input '{binding}'")]
    WritesPipelineInput {
        node: usize,
        op: String,
        binding: String,
    },

    /// A node refers to an operator instance that is not configured.
    #[error("node #{node} refers to unknown operator instance '{op}'")]
    UnknownOperator { node: usize, op: String },

    /// A node's binding count disagrees with its operator's specs.
    #[error("node #{node} ('{op}') wires {actual} {direction} but the operator declares {expected}")]
    ArityMismatch {
        node: usize,
        op: String,
        direction: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A node reads a binding that nothing can produce.
    #[error("node #{node} ('{op}') reads '{binding}', which is neither a pipeline input nor produced by any node")]
    UnresolvedBinding {
        node: usize,
        op: String,
        binding: String,
    },

    /// The remaining nodes depend on each other.
    #[error("dependency cycle among operator instances {ops:?}")]
    Cycle { ops: Vec<String> },
}
