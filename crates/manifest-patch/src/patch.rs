// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Patch documents and their application.

use crate::pointer::{parse_index, Pointer};
use crate::PatchError;
use serde_json::Value;

/// The supported patch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchOp {
    /// Insert into an array, append with `-`, or set an object key.
    Add,
    /// Overwrite an existing array element or object key.
    Replace,
}

impl PatchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Replace => "replace",
        }
    }

    fn parse(op: &str) -> Option<Self> {
        match op {
            "add" => Some(PatchOp::Add),
            "replace" => Some(PatchOp::Replace),
            _ => None,
        }
    }
}

/// A single `{op, path, value}` operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: Pointer,
    pub value: Value,
}

impl PatchOperation {
    pub fn add(path: &str, value: Value) -> Result<Self, PatchError> {
        Ok(Self {
            op: PatchOp::Add,
            path: Pointer::parse(path)?,
            value,
        })
    }

    pub fn replace(path: &str, value: Value) -> Result<Self, PatchError> {
        Ok(Self {
            op: PatchOp::Replace,
            path: Pointer::parse(path)?,
            value,
        })
    }

    /// Decodes the operation at position `index` of a document.
    fn from_value(index: usize, raw: &Value) -> Result<Self, PatchError> {
        let malformed = |detail: &str| PatchError::MalformedOperation {
            index,
            detail: detail.to_string(),
        };
        let obj = raw
            .as_object()
            .ok_or_else(|| malformed("operation is not an object"))?;

        let op = obj
            .get("op")
            .ok_or(PatchError::MissingField { index, field: "op" })?
            .as_str()
            .ok_or_else(|| malformed("'op' is not a string"))?;
        let op = PatchOp::parse(op).ok_or_else(|| PatchError::UnsupportedOp { op: op.to_string() })?;

        let path = obj
            .get("path")
            .ok_or(PatchError::MissingField {
                index,
                field: "path",
            })?
            .as_str()
            .ok_or_else(|| malformed("'path' is not a string"))?;
        let path = Pointer::parse(path)?;

        // An explicit `null` is a value; only an absent key is missing.
        let value = obj.get("value").cloned().ok_or(PatchError::MissingField {
            index,
            field: "value",
        })?;

        Ok(Self { op, path, value })
    }

    /// Applies this operation to `doc` in place.
    pub fn apply(&self, doc: &mut Value) -> Result<(), PatchError> {
        let (parents, last) = self.path.split_last();
        let parent = resolve_parent(doc, parents, &self.path)?;
        let pointer = || self.path.to_string();

        match (self.op, parent) {
            (PatchOp::Add, Value::Array(items)) => {
                if last == "-" {
                    items.push(self.value.clone());
                    return Ok(());
                }
                let index = parse_index(last).ok_or_else(|| PatchError::InvalidIndex {
                    pointer: pointer(),
                    token: last.to_string(),
                })?;
                if index > items.len() {
                    return Err(PatchError::IndexOutOfRange {
                        pointer: pointer(),
                        index,
                        len: items.len(),
                    });
                }
                items.insert(index, self.value.clone());
            }
            (PatchOp::Replace, Value::Array(items)) => {
                let index = parse_index(last).ok_or_else(|| PatchError::InvalidIndex {
                    pointer: pointer(),
                    token: last.to_string(),
                })?;
                let len = items.len();
                let slot = items.get_mut(index).ok_or_else(|| PatchError::IndexOutOfRange {
                    pointer: pointer(),
                    index,
                    len,
                })?;
                *slot = self.value.clone();
            }
            (PatchOp::Add, Value::Object(map)) => {
                map.insert(last.to_string(), self.value.clone());
            }
            (PatchOp::Replace, Value::Object(map)) => {
                let slot = map.get_mut(last).ok_or_else(|| PatchError::MissingKey {
                    pointer: pointer(),
                    key: last.to_string(),
                })?;
                *slot = self.value.clone();
            }
            (_, _) => {
                return Err(PatchError::NotAContainer {
                    pointer: pointer(),
                    token: last.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Walks all tokens but the last; each must name an existing child.
fn resolve_parent<'v>(
    doc: &'v mut Value,
    tokens: &[String],
    pointer: &Pointer,
) -> Result<&'v mut Value, PatchError> {
    let mut current = doc;
    for token in tokens {
        let not_found = || PatchError::NotFound {
            pointer: pointer.to_string(),
            token: token.clone(),
        };
        current = match current {
            Value::Object(map) => map.get_mut(token.as_str()).ok_or_else(not_found)?,
            Value::Array(items) => {
                let index = parse_index(token).ok_or_else(|| PatchError::InvalidIndex {
                    pointer: pointer.to_string(),
                    token: token.clone(),
                })?;
                items.get_mut(index).ok_or_else(not_found)?
            }
            _ => {
                return Err(PatchError::NotAContainer {
                    pointer: pointer.to_string(),
                    token: token.clone(),
                })
            }
        };
    }
    Ok(current)
}

/// An ordered list of operations, applied in list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchDocument {
    operations: Vec<PatchOperation>,
}

impl PatchDocument {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self { operations }
    }

    /// Parses a document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PatchError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(&value)
    }

    /// Decodes a document from an already-parsed JSON array.
    pub fn from_value(value: &Value) -> Result<Self, PatchError> {
        let raw_ops = value.as_array().ok_or(PatchError::NotADocument)?;
        let operations = raw_ops
            .iter()
            .enumerate()
            .map(|(i, raw)| PatchOperation::from_value(i, raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { operations })
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Applies every operation to `doc` in place, stopping at the first
    /// failure. `doc` may be partially patched when an error is returned.
    pub fn apply_in_place(&self, doc: &mut Value) -> Result<(), PatchError> {
        for op in &self.operations {
            op.apply(doc)?;
        }
        Ok(())
    }
}

/// Applies `patches` in order to a deep copy of `base` and returns it.
///
/// Each document sees the result of the previous one. `base` is never
/// modified, including on failure.
pub fn apply_patches(base: &Value, patches: &[PatchDocument]) -> Result<Value, PatchError> {
    let mut doc = base.clone();
    for (i, patch) in patches.iter().enumerate() {
        patch.apply_in_place(&mut doc)?;
        tracing::debug!("applied patch document {} ({} operations)", i, patch.len());
    }
    Ok(doc)
}
