// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Where package files come from.
//!
//! The assembler and operator factories see a package only through
//! [`PackageFiles`]. Two sources exist:
//!
//! - [`ArchiveFiles`]: an index over an in-memory (or memory-mapped)
//!   archive; reads borrow straight from the archive bytes.
//! - [`DirectoryFiles`]: an already extracted package on disk.

use crate::PackageError;
use archive_reader::{index_entries, Span};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Bytes backing an [`ArchiveFiles`]: a `Vec<u8>`, a memory map, etc.
pub type SharedBytes = Arc<dyn AsRef<[u8]> + Send + Sync>;

/// Read access to the files of one package.
///
/// Paths are relative, `/`-separated, and never start with `./`.
pub trait PackageFiles: Send + Sync + fmt::Debug {
    /// Names of root-level files, in discovery order.
    fn root_names(&self) -> Result<Vec<String>, PackageError>;

    /// All file paths, in discovery order.
    fn paths(&self) -> Result<Vec<String>, PackageError>;

    /// Reads a file. `Ok(None)` when the package has no such file.
    fn read(&self, path: &str) -> Result<Option<Cow<'_, [u8]>>, PackageError>;

    fn contains(&self, path: &str) -> bool;
}

/// Strips a leading `./` (repeatedly) from an archive path.
pub fn normalize_path(path: &str) -> &str {
    let mut path = path;
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path
}

// ── ArchiveFiles ───────────────────────────────────────────────────

/// Zero-copy view over an archive's regular files.
pub struct ArchiveFiles {
    bytes: SharedBytes,
    files: Vec<(String, Span)>,
    by_path: HashMap<String, usize>,
}

impl ArchiveFiles {
    /// Indexes `bytes` as an archive. No file content is copied.
    pub fn new(bytes: SharedBytes) -> Result<Self, PackageError> {
        let index = index_entries(AsRef::<[u8]>::as_ref(&*bytes))?;
        let mut files: Vec<(String, Span)> = Vec::with_capacity(index.len());
        let mut by_path: HashMap<String, usize> = HashMap::with_capacity(index.len());
        for file in index.iter() {
            let path = normalize_path(&file.path);
            if path.is_empty() {
                continue;
            }
            match by_path.get(path) {
                Some(&slot) => files[slot].1 = file.span,
                None => {
                    by_path.insert(path.to_string(), files.len());
                    files.push((path.to_string(), file.span));
                }
            }
        }
        tracing::debug!(
            "indexed package archive: {} files, {} content bytes",
            files.len(),
            index.total_bytes()
        );
        Ok(Self {
            bytes,
            files,
            by_path,
        })
    }

    /// Convenience for an owned buffer.
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self, PackageError> {
        Self::new(Arc::new(bytes))
    }

    fn buf(&self) -> &[u8] {
        AsRef::<[u8]>::as_ref(&*self.bytes)
    }

    /// Returns the span of a file in the archive buffer.
    pub fn span(&self, path: &str) -> Option<Span> {
        self.by_path.get(path).map(|&slot| self.files[slot].1)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl fmt::Debug for ArchiveFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveFiles")
            .field("archive_bytes", &self.buf().len())
            .field("files", &self.files.len())
            .finish()
    }
}

impl PackageFiles for ArchiveFiles {
    fn root_names(&self) -> Result<Vec<String>, PackageError> {
        Ok(self
            .files
            .iter()
            .filter(|(path, _)| !path.contains('/'))
            .map(|(path, _)| path.clone())
            .collect())
    }

    fn paths(&self) -> Result<Vec<String>, PackageError> {
        Ok(self.files.iter().map(|(path, _)| path.clone()).collect())
    }

    fn read(&self, path: &str) -> Result<Option<Cow<'_, [u8]>>, PackageError> {
        Ok(self
            .span(normalize_path(path))
            .map(|span| Cow::Borrowed(span.slice(self.buf()))))
    }

    fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(normalize_path(path))
    }
}

// ── DirectoryFiles ─────────────────────────────────────────────────

/// An extracted package rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirectoryFiles {
    root: PathBuf,
}

impl DirectoryFiles {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, PackageError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(PackageError::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "package directory does not exist",
                ),
                path: root,
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a package path under the root, refusing escapes.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let rel = Path::new(normalize_path(path));
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        safe.then(|| self.root.join(rel))
    }

    fn walk(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<(), PackageError> {
        let io_err = |source| PackageError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries = std::fs::read_dir(dir)
            .map_err(io_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_err)?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = format!("{prefix}{name}");
            let file_type = entry.file_type().map_err(io_err)?;
            if file_type.is_dir() {
                self.walk(&entry.path(), &format!("{path}/"), out)?;
            } else if file_type.is_file() {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl PackageFiles for DirectoryFiles {
    fn root_names(&self) -> Result<Vec<String>, PackageError> {
        let io_err = |source| PackageError::Io {
            path: self.root.clone(),
            source,
        };
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if entry.file_type().map_err(io_err)?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn paths(&self) -> Result<Vec<String>, PackageError> {
        let mut out = Vec::new();
        self.walk(&self.root, "", &mut out)?;
        Ok(out)
    }

    fn read(&self, path: &str) -> Result<Option<Cow<'_, [u8]>>, PackageError> {
        let full = self
            .resolve(path)
            .ok_or_else(|| PackageError::UnsafePath(path.to_string()))?;
        if !full.is_file() {
            return Ok(None);
        }
        std::fs::read(&full)
            .map(|bytes| Some(Cow::Owned(bytes)))
            .map_err(|source| PackageError::Io { path: full, source })
    }

    fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|p| p.is_file())
    }
}
