// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor construction and shape validation.

use crate::{DType, Shape, ShapeSpec};

/// Errors that can occur when building or validating tensors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TensorError {
    /// The provided buffer size does not match the expected size for the given shape and dtype.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// A value's shape does not satisfy a declared shape specification.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: ShapeSpec, actual: Shape },

    /// The tensor holds a different dtype than the accessor requires.
    #[error("dtype mismatch in {op}: expected {expected}, got {actual}")]
    DTypeMismatch {
        op: &'static str,
        expected: DType,
        actual: DType,
    },

    /// A dtype name is not recognised.
    #[error("unknown dtype '{0}'")]
    UnknownDType(String),
}
