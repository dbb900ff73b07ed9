// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Materializing a package archive into a directory.

use crate::source::normalize_path;
use crate::PackageError;
use archive_reader::{read_entries, EntryKind};
use std::path::{Component, Path, PathBuf};

/// Writes every file and directory of the archive in `buf` under `dest`.
///
/// Entries whose path is absolute or contains `..` are rejected before
/// anything is written. Returns the number of files written.
pub fn extract_archive(buf: &[u8], dest: &Path) -> Result<usize, PackageError> {
    let entries = read_entries(buf)?;
    let targets = entries
        .iter()
        .map(|e| safe_relative(&e.path))
        .collect::<Result<Vec<_>, _>>()?;

    let mut written = 0;
    for (entry, rel) in entries.iter().zip(targets) {
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(&rel);
        match entry.kind {
            EntryKind::Directory => {
                std::fs::create_dir_all(&target).map_err(io_error(&target))?;
            }
            EntryKind::File => {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent).map_err(io_error(parent))?;
                }
                let content = entry.content.as_deref().unwrap_or_default();
                std::fs::write(&target, content).map_err(io_error(&target))?;
                written += 1;
            }
        }
    }
    tracing::debug!("extracted {} files into {}", written, dest.display());
    Ok(written)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PackageError {
    let path = path.to_path_buf();
    move |source| PackageError::Io { path, source }
}

/// Converts an archive path to a relative path that stays under the root.
fn safe_relative(path: &str) -> Result<PathBuf, PackageError> {
    let mut rel = PathBuf::new();
    for component in Path::new(normalize_path(path)).components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PackageError::UnsafePath(path.to_string()));
            }
        }
    }
    Ok(rel)
}
