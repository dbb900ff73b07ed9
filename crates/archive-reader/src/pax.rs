// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! PAX extended header records.
//!
//! The data of an `x` header is a sequence of records of the form
//! `"<len> <key>=<value>\n"`, where `<len>` is the decimal length of the
//! whole record including itself and the trailing newline.

use crate::ArchiveError;

/// Extracts the `path` record from a PAX extended header's data.
///
/// Returns `Ok(None)` when the header carries no `path`. If several `path`
/// records are present the last one wins.
pub(crate) fn path_record(data: &[u8], offset: usize) -> Result<Option<String>, ArchiveError> {
    let malformed = |detail: &str| ArchiveError::MalformedPax {
        offset,
        detail: detail.to_string(),
    };

    let mut path = None;
    let mut rest = data;
    while !rest.is_empty() {
        // Some writers NUL-pad the data block.
        if rest.iter().all(|&b| b == 0) {
            break;
        }
        let space = rest
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| malformed("record length not terminated by a space"))?;
        let len: usize = std::str::from_utf8(&rest[..space])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed("record length is not a decimal number"))?;
        if len <= space + 1 || len > rest.len() {
            return Err(malformed("record length out of range"));
        }
        let record = &rest[space + 1..len];
        let body = record
            .strip_suffix(b"\n")
            .ok_or_else(|| malformed("record not terminated by a newline"))?;
        let eq = body
            .iter()
            .position(|&b| b == b'=')
            .ok_or_else(|| malformed("record has no '='"))?;
        if &body[..eq] == b"path" {
            let value = std::str::from_utf8(&body[eq + 1..])
                .map_err(|_| ArchiveError::InvalidPath { offset })?;
            path = Some(value.to_string());
        }
        rest = &rest[len..];
    }
    Ok(path)
}
