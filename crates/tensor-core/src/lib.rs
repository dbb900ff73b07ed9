// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Value types that flow through a packaged pipeline's bindings.
//!
//! This crate provides:
//! - [`Tensor`]: an owned n-dimensional buffer tagged with a shape and dtype.
//! - [`Shape`]: the concrete dimensions of a runtime value.
//! - [`ShapeSpec`] / [`Dim`]: declared shapes whose dimensions may be
//!   symbolic (e.g. `["batch", 3]`), with validation against a [`Shape`].
//! - [`DType`]: supported element data types.
//!
//! Arithmetic is deliberately absent: operators delegate numeric work to
//! their own engines. The runtime only needs to move values around and
//! check that they match what the package declares.

mod dtype;
mod error;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use shape::{Dim, Shape, ShapeSpec};
pub use tensor::Tensor;
