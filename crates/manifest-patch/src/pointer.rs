// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Absolute JSON pointers.

use crate::PatchError;
use std::fmt;

/// A parsed, absolute, non-root JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    raw: String,
    tokens: Vec<String>,
}

impl Pointer {
    /// Parses a pointer such as `/inputs/0/shape`.
    ///
    /// Rejects the empty pointer (the document root), relative pointers,
    /// and `~` escapes other than `~0` and `~1`.
    pub fn parse(raw: &str) -> Result<Self, PatchError> {
        let invalid = |reason| PatchError::InvalidPointer {
            pointer: raw.to_string(),
            reason,
        };
        if raw.is_empty() {
            return Err(invalid("the document root cannot be patched"));
        }
        let Some(rest) = raw.strip_prefix('/') else {
            return Err(invalid("pointer must start with '/'"));
        };
        let tokens = rest
            .split('/')
            .map(|token| unescape(token).ok_or_else(|| invalid("'~' must be followed by '0' or '1'")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: raw.to_string(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Unescaped reference tokens, root first. Never empty.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Splits into the tokens locating the parent and the final token.
    pub(crate) fn split_last(&self) -> (&[String], &str) {
        match self.tokens.split_last() {
            Some((last, parents)) => (parents, last.as_str()),
            None => (&[], ""),
        }
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn unescape(token: &str) -> Option<String> {
    if !token.contains('~') {
        return Some(token.to_string());
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '0' => out.push('~'),
            '1' => out.push('/'),
            _ => return None,
        }
    }
    Some(out)
}

/// Parses an array index token. Leading zeros and signs are rejected.
pub(crate) fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    token.parse().ok()
}
