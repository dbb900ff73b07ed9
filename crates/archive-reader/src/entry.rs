// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Entries recovered from an archive.

use std::collections::HashMap;

/// The kind of a materialized entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// A byte range of entry content inside the archive buffer.
///
/// `len` is the exact content length; block padding is never included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    /// Returns the bytes this span covers in `buf`.
    ///
    /// `buf` must be the buffer the span was produced from.
    ///
    /// # Panics
    /// Panics if the span lies outside `buf`.
    pub fn slice<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.offset..self.end()]
    }

    /// One past the last content byte.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// One path + kind + content record, as produced by [`crate::read_entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Fully resolved path (PAX, GNU long name, and prefix applied).
    pub path: String,
    pub kind: EntryKind,
    /// Copied file content; `None` for directories.
    pub content: Option<Vec<u8>>,
    /// Location of the content in the source buffer; `None` for directories.
    pub span: Option<Span>,
}

impl ArchiveEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A regular file in an [`ArchiveIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub path: String,
    pub span: Span,
}

/// Path → span index of the regular files in an archive.
///
/// Iteration follows archive order. When a path occurs more than once the
/// later span wins, as it would when extracting, but the entry keeps the
/// position of its first occurrence.
#[derive(Debug, Clone, Default)]
pub struct ArchiveIndex {
    files: Vec<IndexedFile>,
    by_path: HashMap<String, usize>,
}

impl ArchiveIndex {
    pub(crate) fn insert(&mut self, path: String, span: Span) {
        if let Some(&slot) = self.by_path.get(&path) {
            self.files[slot].span = span;
            return;
        }
        self.by_path.insert(path.clone(), self.files.len());
        self.files.push(IndexedFile { path, span });
    }

    pub fn get(&self, path: &str) -> Option<Span> {
        self.by_path.get(path).map(|&slot| self.files[slot].span)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total content bytes referenced by the index.
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.span.len).sum()
    }
}
