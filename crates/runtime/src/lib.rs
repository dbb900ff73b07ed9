// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! Loads an inference package and runs its pipeline.
//!
//! The runtime takes:
//! - Package bytes or a path, opened in memory or extracted into scratch
//!   storage per [`RuntimeConfig`].
//! - An [`OperatorRegistry`] mapping each operator kind (`op` in `ops.json`)
//!   to an [`OperatorFactory`].
//!
//! And produces a [`PackageHandle`] that instantiates operators on
//! [`warmup`](PackageHandle::warmup) and executes the variant topology in
//! dependency order on every [`compute`](PackageHandle::compute).
//!
//! # Async Execution
//! Operators are `async` (via `async-trait`) so they can wrap engines that
//! do their own I/O. The executor awaits one node at a time; concurrency
//! comes from running several compute calls against one warmed handle.

mod config;
mod error;
mod executor;
mod handle;
mod metrics;
mod operator;
mod resources;

pub use config::{ExtractMode, RuntimeConfig};
pub use error::{ExecutionError, OperatorError, RuntimeError};
pub use executor::{PipelineExecutor, PipelineOutputs};
pub use handle::{HandleState, PackageHandle};
pub use metrics::{ComputeMetrics, NodeMetrics};
pub use operator::{
    DynamicAttributeView, DynamicAttributes, Operator, OperatorFactory, OperatorInputs,
    OperatorOutput, OperatorRegistry,
};
pub use resources::load_tensor;
