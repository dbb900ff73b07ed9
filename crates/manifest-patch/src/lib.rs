// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # manifest-patch
//!
//! Overlays ordered patch documents onto a JSON document.
//!
//! Only two operations exist: `add` and `replace`. Paths are absolute
//! JSON pointers (`/inputs/0/shape`), with `~1` standing for `/` and `~0`
//! for `~` inside a token. The document root itself cannot be patched.
//!
//! [`apply_patches`] never touches its input: it works on a deep copy and
//! returns the result.
//!
//! # Example
//! ```
//! use manifest_patch::{apply_patches, PatchDocument};
//! use serde_json::json;
//!
//! let base = json!({"name": "detector", "tags": ["a"]});
//! let patch = PatchDocument::from_slice(
//!     br#"[{"op": "replace", "path": "/name", "value": "detector-int8"},
//!          {"op": "add", "path": "/tags/-", "value": "b"}]"#,
//! )
//! .unwrap();
//!
//! let patched = apply_patches(&base, &[patch]).unwrap();
//! assert_eq!(patched, json!({"name": "detector-int8", "tags": ["a", "b"]}));
//! assert_eq!(base["name"], "detector");
//! ```

mod error;
mod patch;
mod pointer;

pub use error::PatchError;
pub use patch::{apply_patches, PatchDocument, PatchOp, PatchOperation};
pub use pointer::Pointer;
