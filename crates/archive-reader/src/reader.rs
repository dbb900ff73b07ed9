// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Header walking and the two public enumeration modes.
//!
//! The walk is driven by a [`Cursor`] owned by exactly one call, so
//! concurrent reads of different buffers share no state.

use crate::header::{decode_path, Header};
use crate::{pax, ArchiveEntry, ArchiveError, ArchiveIndex, EntryKind, Span, BLOCK_SIZE};

/// Reads every file and directory entry, copying file content.
///
/// Entries of other types (links, devices) are skipped. Extended headers
/// are consumed and never returned.
pub fn read_entries(buf: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut entries = Vec::new();
    for record in Records::new(buf) {
        let record = record?;
        match record.typeflag {
            Typeflag::File => entries.push(ArchiveEntry {
                content: Some(record.span.slice(buf).to_vec()),
                span: Some(record.span),
                path: record.path,
                kind: EntryKind::File,
            }),
            Typeflag::Directory => entries.push(ArchiveEntry {
                path: record.path,
                kind: EntryKind::Directory,
                content: None,
                span: None,
            }),
            Typeflag::Other(flag) => {
                tracing::debug!("skipping entry '{}' of type {:?}", record.path, flag as char);
            }
        }
    }
    tracing::debug!("read {} entries from {} byte archive", entries.len(), buf.len());
    Ok(entries)
}

/// Indexes regular files by path without copying any content.
pub fn index_entries(buf: &[u8]) -> Result<ArchiveIndex, ArchiveError> {
    let mut index = ArchiveIndex::default();
    for record in Records::new(buf) {
        let record = record?;
        if record.typeflag == Typeflag::File {
            index.insert(record.path, record.span);
        }
    }
    tracing::debug!(
        "indexed {} files ({} content bytes) from {} byte archive",
        index.len(),
        index.total_bytes(),
        buf.len()
    );
    Ok(index)
}

// ── Walk ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Typeflag {
    File,
    Directory,
    Other(u8),
}

impl Typeflag {
    fn from_byte(flag: u8) -> Self {
        match flag {
            b'0' | b'\0' | b'7' => Typeflag::File,
            b'5' => Typeflag::Directory,
            other => Typeflag::Other(other),
        }
    }
}

/// A non-extended header with its resolved path and content span.
struct Record {
    path: String,
    typeflag: Typeflag,
    span: Span,
}

/// Read position within one buffer.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Returns the next header block, `None` at a clean end of archive.
    fn next_block(&mut self) -> Result<Option<Header<'a>>, ArchiveError> {
        let offset = self.pos;
        if offset >= self.buf.len() {
            return Ok(None);
        }
        let remaining = self.buf.len() - offset;
        if remaining < BLOCK_SIZE {
            return Err(ArchiveError::TruncatedHeader { offset, remaining });
        }
        let block = &self.buf[offset..offset + BLOCK_SIZE];
        if Header::is_zero_block(block) {
            return Ok(None);
        }
        Ok(Some(Header::new(block, offset)))
    }

    /// Claims the content following `header` and moves past its padding.
    fn take_content(&mut self, header: &Header<'_>, size: u64) -> Result<Span, ArchiveError> {
        let start = header.offset() + BLOCK_SIZE;
        let out_of_bounds = || ArchiveError::SpanOutOfBounds {
            offset: header.offset(),
            size,
            buffer_len: self.buf.len(),
        };
        let len = usize::try_from(size).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        if end > self.buf.len() {
            return Err(out_of_bounds());
        }
        self.pos = start.saturating_add(len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE);
        Ok(Span { offset: start, len })
    }
}

/// Path overrides collected from extended headers for the next entry.
#[derive(Default)]
struct PendingPath {
    pax: Option<String>,
    long_name: Option<String>,
}

impl PendingPath {
    /// Resolves the entry path by priority and clears both overrides.
    fn resolve(&mut self, header: &Header<'_>) -> Result<String, ArchiveError> {
        let pax = self.pax.take();
        let long_name = self.long_name.take();
        match pax.or(long_name) {
            Some(path) => Ok(path),
            None => header.path(),
        }
    }
}

struct Records<'a> {
    cursor: Cursor<'a>,
    pending: PendingPath,
    done: bool,
}

impl<'a> Records<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: Cursor { buf, pos: 0 },
            pending: PendingPath::default(),
            done: false,
        }
    }

    fn next_record(&mut self) -> Result<Option<Record>, ArchiveError> {
        loop {
            let Some(header) = self.cursor.next_block()? else {
                return Ok(None);
            };
            header.verify_checksum()?;
            let size = header.size()?;
            let span = self.cursor.take_content(&header, size)?;
            let data = span.slice(self.cursor.buf);

            match header.typeflag() {
                b'x' => {
                    if let Some(path) = pax::path_record(data, header.offset())? {
                        self.pending.pax = Some(path);
                    }
                }
                b'g' => {}
                b'L' => {
                    self.pending.long_name = Some(decode_path(data, header.offset())?.to_string());
                }
                b'K' => {}
                flag => {
                    let path = self.pending.resolve(&header)?;
                    return Ok(Some(Record {
                        path,
                        typeflag: Typeflag::from_byte(flag),
                        span,
                    }));
                }
            }
        }
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Record, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
