// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Structural errors found while walking an archive.
//!
//! Every variant carries the byte offset of the header it was found in.

/// Errors that abort archive enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchiveError {
    /// Fewer than 512 bytes remain where a header was expected.
    #[error("truncated header at offset {offset}: {remaining} bytes remain")]
    TruncatedHeader { offset: usize, remaining: usize },

    /// The stored checksum does not match the computed one.
    #[error("checksum mismatch in header at offset {offset}: stored {stored}, computed {computed}")]
    ChecksumMismatch {
        offset: usize,
        stored: u64,
        computed: u64,
    },

    /// A numeric header field could not be decoded.
    #[error("invalid {field} field in header at offset {offset}")]
    InvalidField { offset: usize, field: &'static str },

    /// The size field encodes a negative value.
    #[error("negative size in header at offset {offset}")]
    NegativeSize { offset: usize },

    /// The entry content runs past the end of the buffer.
    #[error(
        "content of header at offset {offset} spans {size} bytes, past the end of a {buffer_len}-byte buffer"
    )]
    SpanOutOfBounds {
        offset: usize,
        size: u64,
        buffer_len: usize,
    },

    /// A PAX extended header could not be parsed.
    #[error("malformed PAX record in header at offset {offset}: {detail}")]
    MalformedPax { offset: usize, detail: String },

    /// A path is not valid UTF-8.
    #[error("non-UTF-8 path in header at offset {offset}")]
    InvalidPath { offset: usize },
}
