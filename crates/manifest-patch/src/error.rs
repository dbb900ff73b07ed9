// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for patch parsing and application.

/// Errors raised while parsing or applying a patch document.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The patch bytes are not valid JSON.
    #[error("failed to parse patch document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The patch document is not a JSON array of operations.
    #[error("patch document must be an array of operations")]
    NotADocument,

    /// An operation is not an object, or a field has the wrong JSON type.
    #[error("malformed operation #{index}: {detail}")]
    MalformedOperation { index: usize, detail: String },

    /// A required field (`op`, `path` or `value`) is absent.
    #[error("operation #{index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    /// The operation is something other than `add` or `replace`.
    #[error("unsupported operation '{op}' (only 'add' and 'replace' are supported)")]
    UnsupportedOp { op: String },

    /// The pointer is empty, relative, or contains a bad escape.
    #[error("invalid pointer '{pointer}': {reason}")]
    InvalidPointer {
        pointer: String,
        reason: &'static str,
    },

    /// An intermediate token does not resolve to an existing value.
    #[error("path '{pointer}' not found: no value at token '{token}'")]
    NotFound { pointer: String, token: String },

    /// Traversal reached a scalar where a container was required.
    #[error("path '{pointer}': cannot traverse into a scalar at token '{token}'")]
    NotAContainer { pointer: String, token: String },

    /// An array token is not a valid index.
    #[error("path '{pointer}': '{token}' is not a valid array index")]
    InvalidIndex { pointer: String, token: String },

    /// An array index lies outside the permitted range.
    #[error("path '{pointer}': index {index} out of range for array of length {len}")]
    IndexOutOfRange {
        pointer: String,
        index: usize,
        len: usize,
    },

    /// `replace` targeted an object key that does not exist.
    #[error("path '{pointer}': cannot replace missing key '{key}'")]
    MissingKey { pointer: String, key: String },
}
