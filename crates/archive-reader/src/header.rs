// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Decoding of a single 512-byte header block.
//!
//! ```text
//! offset  size  field
//!      0   100  name
//!    124    12  size      (octal, or GNU base-256 when the high bit is set)
//!    148     8  checksum  (octal)
//!    156     1  typeflag
//!    257     6  magic     ("ustar\0" for POSIX, "ustar " for GNU)
//!    345   155  prefix    (POSIX only)
//! ```

use crate::{ArchiveError, BLOCK_SIZE};
use std::ops::Range;

const NAME: Range<usize> = 0..100;
const SIZE: Range<usize> = 124..136;
const CHECKSUM: Range<usize> = 148..156;
const TYPEFLAG: usize = 156;
const MAGIC: Range<usize> = 257..263;
const PREFIX: Range<usize> = 345..500;

const POSIX_MAGIC: &[u8] = b"ustar\0";

/// A borrowed header block plus the offset it was read from.
pub(crate) struct Header<'a> {
    block: &'a [u8],
    offset: usize,
}

impl<'a> Header<'a> {
    pub(crate) fn new(block: &'a [u8], offset: usize) -> Self {
        debug_assert_eq!(block.len(), BLOCK_SIZE);
        Self { block, offset }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn is_zero_block(block: &[u8]) -> bool {
        block.iter().all(|&b| b == 0)
    }

    /// Verifies the header checksum.
    ///
    /// The checksum is the unsigned sum of all 512 bytes with the checksum
    /// field itself counted as eight ASCII spaces.
    pub(crate) fn verify_checksum(&self) -> Result<(), ArchiveError> {
        let stored = parse_octal(&self.block[CHECKSUM]).ok_or(ArchiveError::InvalidField {
            offset: self.offset,
            field: "checksum",
        })?;
        let computed: u64 = self
            .block
            .iter()
            .enumerate()
            .map(|(i, &b)| if CHECKSUM.contains(&i) { u64::from(b' ') } else { u64::from(b) })
            .sum();
        if stored != computed {
            return Err(ArchiveError::ChecksumMismatch {
                offset: self.offset,
                stored,
                computed,
            });
        }
        Ok(())
    }

    pub(crate) fn typeflag(&self) -> u8 {
        self.block[TYPEFLAG]
    }

    /// Decodes the content size.
    pub(crate) fn size(&self) -> Result<u64, ArchiveError> {
        let field = &self.block[SIZE];
        if field[0] & 0x80 != 0 {
            return self.parse_base256(field);
        }
        if field.contains(&b'-') {
            return Err(ArchiveError::NegativeSize {
                offset: self.offset,
            });
        }
        parse_octal(field).ok_or(ArchiveError::InvalidField {
            offset: self.offset,
            field: "size",
        })
    }

    /// GNU base-256: the first byte's high bit marks the encoding, the
    /// remaining bits form a big-endian two's complement number.
    fn parse_base256(&self, field: &[u8]) -> Result<u64, ArchiveError> {
        if field[0] & 0x40 != 0 {
            return Err(ArchiveError::NegativeSize {
                offset: self.offset,
            });
        }
        let mut value: u64 = u64::from(field[0] & 0x3f);
        for &b in &field[1..] {
            value = value
                .checked_mul(256)
                .and_then(|v| v.checked_add(u64::from(b)))
                .ok_or(ArchiveError::InvalidField {
                    offset: self.offset,
                    field: "size",
                })?;
        }
        Ok(value)
    }

    /// Returns the path recorded in the header itself: `prefix/name` for
    /// POSIX headers with a non-empty prefix, otherwise `name`.
    pub(crate) fn path(&self) -> Result<String, ArchiveError> {
        let name = self.text(&self.block[NAME])?;
        if &self.block[MAGIC] == POSIX_MAGIC {
            let prefix = self.text(&self.block[PREFIX])?;
            if !prefix.is_empty() {
                return Ok(format!("{prefix}/{name}"));
            }
        }
        Ok(name.to_string())
    }

    fn text<'b>(&self, field: &'b [u8]) -> Result<&'b str, ArchiveError> {
        decode_path(field, self.offset)
    }
}

/// Decodes a NUL-terminated (or full-length) UTF-8 path.
pub(crate) fn decode_path(bytes: &[u8], offset: usize) -> Result<&str, ArchiveError> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end]).map_err(|_| ArchiveError::InvalidPath { offset })
}

/// Parses an octal field: optional leading spaces, digits, then an
/// optional run of NULs/spaces. An empty field is zero.
fn parse_octal(field: &[u8]) -> Option<u64> {
    let start = field.iter().position(|&b| b != b' ')?;
    let digits = &field[start..];
    let end = digits
        .iter()
        .position(|&b| b == 0 || b == b' ')
        .unwrap_or(digits.len());
    if digits[end..].iter().any(|&b| b != 0 && b != b' ') {
        return None;
    }
    digits[..end].iter().try_fold(0u64, |acc, &b| {
        if !(b'0'..=b'7').contains(&b) {
            return None;
        }
        acc.checked_mul(8)?.checked_add(u64::from(b - b'0'))
    })
}
