// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Package storage: how package bytes reach operators.
//!
//! Archive packages on disk are memory-mapped with `memmap2` so an
//! in-memory handle never copies them. In scratch mode the archive is
//! instead extracted into a temporary directory that lives as long as the
//! handle. Operator factories read their resources through
//! [`load_tensor`] or [`PackageFiles::read`] either way.

use crate::{OperatorError, RuntimeConfig, RuntimeError};
use package_ir::{extract_archive, DirectoryFiles, PackageFiles, SharedBytes};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tensor_core::{DType, Shape, Tensor};

/// Memory-maps an archive file.
///
/// Empty files are returned as an empty buffer since they cannot be mapped.
pub(crate) fn map_archive(path: &Path) -> Result<SharedBytes, RuntimeError> {
    let io_error = |source| RuntimeError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(io_error)?;
    let len = file.metadata().map_err(io_error)?.len();
    if len == 0 {
        tracing::warn!("package '{}' is empty", path.display());
        return Ok(Arc::new(Vec::<u8>::new()));
    }
    // The mapping is read-only; callers must not truncate the file while a
    // handle is open.
    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(io_error)?;
    tracing::info!(
        "mmap'd package {} ({:.2} MB)",
        path.display(),
        mmap.len() as f64 / (1024.0 * 1024.0),
    );
    Ok(Arc::new(mmap))
}

/// Extracts an archive into a fresh scratch directory.
///
/// The returned [`TempDir`] owns the directory; dropping it removes the
/// extracted files.
pub(crate) fn materialize(
    archive: &[u8],
    config: &RuntimeConfig,
) -> Result<(TempDir, DirectoryFiles), RuntimeError> {
    let scratch = config.create_scratch_dir()?;
    let written = extract_archive(archive, scratch.path())?;
    let files = DirectoryFiles::new(scratch.path())?;
    tracing::info!(
        "extracted {} files into scratch directory {}",
        written,
        scratch.path().display()
    );
    Ok((scratch, files))
}

/// Reads a raw little-endian tensor from a package file.
///
/// The file must hold exactly `shape.size_bytes(dtype)` bytes.
///
/// # Example
/// ```no_run
/// use package_ir::{DirectoryFiles, PackageFiles};
/// use runtime::load_tensor;
/// use tensor_core::{DType, Shape};
///
/// let files = DirectoryFiles::new("./packages/detector").unwrap();
/// let weights = load_tensor(&files, "weights/w0.bin", DType::F32, Shape::matrix(3, 4)).unwrap();
/// assert_eq!(weights.size_bytes(), 48);
/// ```
pub fn load_tensor(
    files: &dyn PackageFiles,
    path: &str,
    dtype: DType,
    shape: Shape,
) -> Result<Tensor, OperatorError> {
    let bytes = files
        .read(path)
        .map_err(|e| OperatorError::Resource {
            path: path.to_string(),
            detail: e.to_string(),
        })?
        .ok_or_else(|| OperatorError::Resource {
            path: path.to_string(),
            detail: "not found in package".into(),
        })?;
    Tensor::from_bytes(shape, dtype, bytes.into_owned()).map_err(|e| OperatorError::Resource {
        path: path.to_string(),
        detail: e.to_string(),
    })
}
