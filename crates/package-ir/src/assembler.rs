// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Package assembly: package files → ready-to-execute configuration.
//!
//! A package contains:
//! - `manifest.json`: the base manifest (see [`Manifest`]).
//! - `manifest-<id>.patch.json`: zero or more overlays, applied in name order.
//! - `ops.json`: the operator instance list.
//! - `variant_config.json`: the pipeline topology.
//! - `dtypes.json`: optional custom dtype schemas.
//! - `meta.json`, `meta-<id>.json`: zero or more metadata arrays.
//!
//! Only root-level files take part in patch and metadata discovery.

use crate::{Manifest, OperatorInstanceConfig, PackageError, PackageFiles, VariantTopology};
use manifest_patch::PatchDocument;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

pub(crate) const MANIFEST_FILE: &str = "manifest.json";
const OPS_FILE: &str = "ops.json";
const VARIANT_FILE: &str = "variant_config.json";
const DTYPES_FILE: &str = "dtypes.json";

/// Custom dtype name → schema, from `dtypes.json`.
pub type DTypeRegistry = BTreeMap<String, Value>;

/// Everything needed to instantiate and run a package.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPackage {
    pub manifest: Manifest,
    pub operators: Vec<OperatorInstanceConfig>,
    pub topology: VariantTopology,
    pub dtypes: DTypeRegistry,
    pub metadata: Vec<Value>,
}

impl AssembledPackage {
    /// Looks up an operator instance by id.
    pub fn operator(&self, id: &str) -> Option<&OperatorInstanceConfig> {
        self.operators.iter().find(|o| o.id == id)
    }

    /// Returns a one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "Package '{}' v{}: {} inputs, {} outputs, {} operator instances, {} nodes, {} metadata entries",
            self.manifest.name,
            self.manifest.version,
            self.manifest.inputs.len(),
            self.manifest.outputs.len(),
            self.operators.len(),
            self.topology.len(),
            self.metadata.len()
        )
    }
}

/// Builds an [`AssembledPackage`] from package files.
///
/// # Example
/// ```no_run
/// use package_ir::{DirectoryFiles, PackageAssembler};
///
/// let files = DirectoryFiles::new("./packages/detector").unwrap();
/// let package = PackageAssembler::assemble(&files).unwrap();
/// println!("{}", package.summary());
/// ```
pub struct PackageAssembler;

impl PackageAssembler {
    /// Assembles a package. Any failure aborts the whole assembly.
    ///
    /// Steps:
    /// 1. Apply the manifest patches to `manifest.json` and validate it.
    /// 2. Parse `ops.json` and `variant_config.json`.
    /// 3. Parse `dtypes.json` if present.
    /// 4. Collect metadata arrays.
    pub fn assemble(files: &dyn PackageFiles) -> Result<AssembledPackage, PackageError> {
        let root_names = files.root_names()?;

        let manifest = Self::build_manifest(files, &root_names)?;
        let operators: Vec<OperatorInstanceConfig> = read_json(files, OPS_FILE)?
            .ok_or(PackageError::MissingFile(OPS_FILE))?;
        let topology: VariantTopology = read_json(files, VARIANT_FILE)?
            .ok_or(PackageError::MissingFile(VARIANT_FILE))?;
        let dtypes: DTypeRegistry = read_json(files, DTYPES_FILE)?.unwrap_or_default();
        let metadata = Self::collect_metadata(files, &root_names)?;

        let package = AssembledPackage {
            manifest,
            operators,
            topology,
            dtypes,
            metadata,
        };
        tracing::info!("{}", package.summary());
        Ok(package)
    }

    fn build_manifest(
        files: &dyn PackageFiles,
        root_names: &[String],
    ) -> Result<Manifest, PackageError> {
        let mut doc: Value =
            read_json(files, MANIFEST_FILE)?.ok_or(PackageError::MissingFile(MANIFEST_FILE))?;

        let mut patch_names: Vec<&str> = root_names
            .iter()
            .map(String::as_str)
            .filter(|name| is_patch_file(name))
            .collect();
        patch_names.sort_unstable();

        // `doc` is this function's own copy; failures discard it whole.
        for name in patch_names {
            let bytes = read_required(files, name)?;
            let patch = PatchDocument::from_slice(&bytes).map_err(|source| PackageError::Patch {
                file: name.to_string(),
                source,
            })?;
            patch
                .apply_in_place(&mut doc)
                .map_err(|source| PackageError::Patch {
                    file: name.to_string(),
                    source,
                })?;
            tracing::debug!("applied manifest patch '{}' ({} operations)", name, patch.len());
        }

        let manifest = Manifest::from_value(doc)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn collect_metadata(
        files: &dyn PackageFiles,
        root_names: &[String],
    ) -> Result<Vec<Value>, PackageError> {
        let mut metadata = Vec::new();
        for name in root_names.iter().filter(|n| is_meta_file(n)) {
            let value: Value = read_json(files, name)?.unwrap_or(Value::Null);
            match value {
                Value::Array(items) => metadata.extend(items),
                other => tracing::warn!(
                    "ignoring metadata file '{}': expected an array, found {}",
                    name,
                    json_kind(&other)
                ),
            }
        }
        Ok(metadata)
    }
}

/// `manifest-<id>.patch.json` with a non-empty `<id>`.
pub fn is_patch_file(name: &str) -> bool {
    name.strip_prefix("manifest-")
        .and_then(|rest| rest.strip_suffix(".patch.json"))
        .is_some_and(|id| !id.is_empty() && !id.contains('/'))
}

/// `meta.json`, or `meta-<id>.json` with a non-empty `<id>`.
pub fn is_meta_file(name: &str) -> bool {
    name == "meta.json"
        || name
            .strip_prefix("meta-")
            .and_then(|rest| rest.strip_suffix(".json"))
            .is_some_and(|id| !id.is_empty() && !id.contains('/'))
}

fn read_required(files: &dyn PackageFiles, name: &str) -> Result<Vec<u8>, PackageError> {
    files
        .read(name)?
        .map(|bytes| bytes.into_owned())
        .ok_or_else(|| PackageError::Io {
            path: name.into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "listed file vanished"),
        })
}

/// Reads and decodes a JSON file; `Ok(None)` when the file is absent.
fn read_json<T: DeserializeOwned>(
    files: &dyn PackageFiles,
    name: &str,
) -> Result<Option<T>, PackageError> {
    let Some(bytes) = files.read(name)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| PackageError::Json {
            file: name.to_string(),
            source,
        })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
