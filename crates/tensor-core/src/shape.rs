// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Concrete shapes of runtime values and declared shape specifications.
//!
//! A [`Shape`] is what a value actually has. A [`ShapeSpec`] is what the
//! package declares: a list of [`Dim`]s, each either a fixed size or a
//! symbolic name such as `"batch"` that accepts any size.

use crate::TensorError;
use std::fmt;

/// Describes the dimensionality of a [`crate::Tensor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        Self { dims: vec![] }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape.
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Returns the number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements (1 for a scalar).
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Computes the memory footprint in bytes for a given [`crate::DType`].
    pub fn size_bytes(&self, dtype: crate::DType) -> usize {
        self.num_elements() * dtype.size_bytes()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dims(f, self.dims.iter())
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

// ── Declared shapes ────────────────────────────────────────────────

/// One declared dimension.
///
/// Serialised as a bare JSON number (fixed) or string (symbolic), so a
/// package can write `"shape": ["batch", 3]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Dim {
    /// A concrete size the actual value must match exactly.
    Fixed(usize),
    /// A named size that is never checked against actual values.
    Symbolic(String),
}

impl Dim {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Dim::Symbolic(_))
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Fixed(n) => write!(f, "{n}"),
            Dim::Symbolic(name) => f.write_str(name),
        }
    }
}

/// A declared shape whose dimensions may be symbolic.
///
/// An empty spec places no constraint on the value at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ShapeSpec {
    dims: Vec<Dim>,
}

impl ShapeSpec {
    pub fn new(dims: Vec<Dim>) -> Self {
        Self { dims }
    }

    /// A spec that accepts any shape.
    pub fn unconstrained() -> Self {
        Self { dims: vec![] }
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.dims.is_empty()
    }

    /// Checks an actual shape against this spec.
    ///
    /// The rank must match unless the spec is unconstrained; every fixed
    /// dimension must equal the actual one. Symbolic dimensions match any
    /// size.
    pub fn validate(&self, actual: &Shape) -> Result<(), TensorError> {
        if self.is_unconstrained() {
            return Ok(());
        }
        let mismatch = || TensorError::ShapeMismatch {
            expected: self.clone(),
            actual: actual.clone(),
        };
        if self.rank() != actual.rank() {
            return Err(mismatch());
        }
        for (declared, &size) in self.dims.iter().zip(actual.dims()) {
            if let Dim::Fixed(expected) = declared {
                if *expected != size {
                    return Err(mismatch());
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ShapeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dims(f, self.dims.iter())
    }
}

impl From<Vec<Dim>> for ShapeSpec {
    fn from(dims: Vec<Dim>) -> Self {
        Self::new(dims)
    }
}

fn write_dims<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    dims: impl Iterator<Item = T>,
) -> fmt::Result {
    write!(f, "[")?;
    for (i, d) in dims.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{d}")?;
    }
    write!(f, "]")
}
