// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # archive-reader
//!
//! Reads the tape-archive container an inference package ships in.
//!
//! Two modes are offered over the same header walk:
//!
//! - [`read_entries`]: **materializing**: every file and directory, with
//!   file content copied out of the buffer.
//! - [`index_entries`]: **index-only**: regular files only, each mapped to
//!   a [`Span`] into the original buffer. Nothing is copied, so a
//!   memory-mapped package can be served without reading it into the heap.
//!
//! # Supported format
//! - ustar headers, including the legacy `prefix` field.
//! - PAX extended headers (`x`) carrying a `path` record.
//! - GNU long names (`L`); GNU long link names (`K`) are consumed.
//! - PAX global headers (`g`) are skipped.
//! - Octal and GNU base-256 size fields.
//!
//! Path priority for one entry: PAX `path` > GNU long name > `prefix/name`
//! > `name`. Extensions apply to the next non-extended header only.
//!
//! # Example
//! ```
//! let index = archive_reader::index_entries(&[0u8; 512]).unwrap();
//! assert!(index.is_empty());
//! ```

mod entry;
mod error;
mod header;
mod pax;
mod reader;

pub use entry::{ArchiveEntry, ArchiveIndex, EntryKind, IndexedFile, Span};
pub use error::ArchiveError;
pub use reader::{index_entries, read_entries};

/// Size of a header block and the granularity of content padding.
pub const BLOCK_SIZE: usize = 512;
