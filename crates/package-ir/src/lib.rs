// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # package-ir
//!
//! The typed configuration of an inference package and the assembler that
//! builds it.
//!
//! - [`Manifest`]: declared inputs, outputs, producer info, dynamic
//!   attributes and env vars.
//! - [`OperatorInstanceConfig`]: one configured operator (`ops.json`).
//! - [`VariantTopology`]: the pipeline graph (`variant_config.json`), with
//!   static wiring checks and deterministic scheduling.
//! - [`PackageFiles`]: read access to package files, backed by an archive
//!   index ([`ArchiveFiles`]) or an extracted directory ([`DirectoryFiles`]).
//! - [`PackageAssembler`]: files → [`AssembledPackage`], applying manifest
//!   patches and collecting metadata.
//!
//! # Example
//! ```no_run
//! use package_ir::{ArchiveFiles, PackageAssembler};
//!
//! let bytes = std::fs::read("detector.fnnx").unwrap();
//! let files = ArchiveFiles::from_vec(bytes).unwrap();
//! let package = PackageAssembler::assemble(&files).unwrap();
//! for op in &package.operators {
//!     println!("  {}", op.summary());
//! }
//! ```

pub mod assembler;
mod error;
mod extract;
mod manifest;
mod ops;
pub mod source;
mod variant;

pub use assembler::{AssembledPackage, DTypeRegistry, PackageAssembler};
pub use error::{PackageError, TopologyError};
pub use extract::extract_archive;
pub use manifest::{ContentType, DynamicAttributeDecl, EnvVarDecl, Manifest, TensorDecl};
pub use ops::{OpTensorSpec, OperatorInstanceConfig};
pub use source::{ArchiveFiles, DirectoryFiles, PackageFiles, SharedBytes};
pub use variant::{NodeDef, VariantTopology};
