// MOI SDK: Rust client library for the MOI network
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2024-2025 by the MOI SDK contributors
//
// Copyright (C) 2024-2025 MOI SDK contributors. All rights under the above copyright are reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License
// is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express
// or implied. See the License for the specific language governing permissions and limitations under
// the License.

//! Deterministic derivation of storage addresses from state access paths.
//!
//! A path starts at the root slot of a state matrix and descends through typed accessors. Every
//! step is checked against the manifest's field and class graph, and every step mixes into the
//! running key as `sha256(key ‖ domain ‖ operand)` with a distinct domain byte per accessor kind.
//! The derivation must match the execution engine bit-for-bit, so it is a pure function of the
//! base slot and the accessor sequence - nothing else.

use core::fmt::{self, Display, Formatter};

use sha2::{Digest, Sha256};

use crate::manifest::{Logic, StateMode, TypeField};
use crate::util::encode_hex;

const DOMAIN_PROPERTY: u8 = 0x00;
const DOMAIN_INDEX: u8 = 0x01;
const DOMAIN_LENGTH: u8 = 0x02;
const DOMAIN_MAP_KEY: u8 = 0x03;

/// One step of a state access path.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Accessor {
    /// Descend into a named field of a class, or into a map entry by key.
    Property(String),
    /// Descend into an array element.
    Index(u64),
    /// Address the length-prefix slot of a dynamic container. Terminal: no further descent.
    Length,
}

impl Display for Accessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Property(label) => write!(f, ".{label}"),
            Accessor::Index(index) => write!(f, "[{index}]"),
            Accessor::Length => f.write_str(".length"),
        }
    }
}

/// Fixed-width storage address of one slot in a logic's persistent or ephemeral store.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct StorageKey([u8; 32]);

impl StorageKey {
    pub const fn to_byte_array(self) -> [u8; 32] { self.0 }

    pub fn as_slice(&self) -> &[u8] { &self.0 }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&encode_hex(&self.0)) }
}

/// Error of an access path that does not type-check against the manifest.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
pub enum StorageError {
    #[display("the manifest declares no {0} state")]
    StateNotFound(StateMode),

    #[display("field '{label}' does not exist on {context}")]
    FieldNotFound { label: String, context: String },

    #[display("type '{0}' is not an array and cannot be indexed")]
    NotIndexable(String),

    #[display("type '{0}' is not a dynamic container and has no length slot")]
    NotDynamic(String),

    #[display("type '{0}' is a leaf and cannot be descended into")]
    NotComposite(String),

    #[display("type '{0}' does not resolve against the manifest")]
    UnresolvedType(String),
}

/// What the current position of a path walk looks like after typedef chasing.
enum Shape {
    /// The root state matrix or an expanded class: named, slotted fields.
    Record(String, Vec<TypeField>),
    Array(String, String),
    Map(String, String),
    Leaf(String),
}

impl Shape {
    fn type_name(&self) -> &str {
        match self {
            Shape::Record(name, _) | Shape::Array(name, _) | Shape::Map(name, _) | Shape::Leaf(name) => name,
        }
    }
}

/// Type-checked walk from a state root to a storage key.
///
/// Identical `(base slot, accessor sequence)` inputs always produce identical keys; the builder
/// holds no hidden state and nothing is cached between walks.
pub struct StorageKeyBuilder<'a> {
    logic: &'a Logic,
    key: [u8; 32],
    shape: Shape,
}

impl<'a> StorageKeyBuilder<'a> {
    /// Starts a walk at the persistent state root.
    pub fn persistent(logic: &'a Logic) -> Result<Self, StorageError> { Self::state(logic, StateMode::Persistent) }

    /// Starts a walk at the ephemeral state root.
    pub fn ephemeral(logic: &'a Logic) -> Result<Self, StorageError> { Self::state(logic, StateMode::Ephemeral) }

    fn state(logic: &'a Logic, mode: StateMode) -> Result<Self, StorageError> {
        let (base_slot, state) = logic.state(mode).ok_or(StorageError::StateNotFound(mode))?;
        let mut key = [0u8; 32];
        key[24..32].copy_from_slice(&base_slot.to_be_bytes());
        Ok(StorageKeyBuilder {
            logic,
            key,
            shape: Shape::Record(format!("{mode} state"), state.fields.clone()),
        })
    }

    /// Applies a whole accessor path at once.
    pub fn derive(logic: &'a Logic, mode: StateMode, path: &[Accessor]) -> Result<StorageKey, StorageError> {
        let mut builder = Self::state(logic, mode)?;
        let mut path = path.iter().peekable();
        while let Some(accessor) = path.next() {
            builder = match accessor {
                Accessor::Property(label) => builder.field(label)?,
                Accessor::Index(index) => builder.index(*index)?,
                Accessor::Length => {
                    let key = builder.length()?;
                    return if path.peek().is_some() {
                        Err(StorageError::NotComposite(s!("length slot")))
                    } else {
                        Ok(key)
                    };
                }
            };
        }
        Ok(builder.finish())
    }

    /// Descends into a named field (on a record) or a keyed entry (on a map).
    pub fn field(mut self, label: &str) -> Result<Self, StorageError> {
        match self.resolve_shape()? {
            Shape::Record(context, fields) => {
                let field = fields
                    .iter()
                    .find(|field| field.label == label)
                    .ok_or_else(|| StorageError::FieldNotFound {
                        label: label.to_owned(),
                        context,
                    })?;
                self.key = mix(&self.key, DOMAIN_PROPERTY, &field.slot.to_be_bytes());
                self.shape = Shape::Leaf(field.type_name.clone());
                Ok(self)
            }
            Shape::Map(_, value) => {
                self.key = mix(&self.key, DOMAIN_MAP_KEY, label.as_bytes());
                self.shape = Shape::Leaf(value);
                Ok(self)
            }
            shape => Err(StorageError::NotComposite(shape.type_name().to_owned())),
        }
    }

    /// Descends into an array element.
    pub fn index(mut self, index: u64) -> Result<Self, StorageError> {
        match self.resolve_shape()? {
            Shape::Array(_, element) => {
                self.key = mix(&self.key, DOMAIN_INDEX, &index.to_be_bytes());
                self.shape = Shape::Leaf(element);
                Ok(self)
            }
            shape => Err(StorageError::NotIndexable(shape.type_name().to_owned())),
        }
    }

    /// Addresses the length slot of the current array or map. Terminal.
    pub fn length(mut self) -> Result<StorageKey, StorageError> {
        match self.resolve_shape()? {
            Shape::Array(..) | Shape::Map(..) => {
                self.key = mix(&self.key, DOMAIN_LENGTH, &[]);
                Ok(StorageKey(self.key))
            }
            shape => Err(StorageError::NotDynamic(shape.type_name().to_owned())),
        }
    }

    pub fn finish(self) -> StorageKey { StorageKey(self.key) }

    /// Resolves the current position into a concrete shape, chasing typedef aliases. The alias
    /// chain is bounded by the cycle check performed when the manifest was indexed.
    fn resolve_shape(&mut self) -> Result<Shape, StorageError> {
        let shape = core::mem::replace(&mut self.shape, Shape::Leaf(String::new()));
        let mut type_name = match shape {
            Shape::Leaf(name) => name,
            resolved => return Ok(resolved),
        };
        loop {
            if let Some(inner) = strip_composite(&type_name, "array") {
                return Ok(Shape::Array(type_name.clone(), inner.to_owned()));
            }
            if let Some(inner) = strip_composite(&type_name, "map") {
                let comma = split_comma(inner).ok_or_else(|| StorageError::UnresolvedType(type_name.clone()))?;
                return Ok(Shape::Map(type_name.clone(), inner[comma + 1..].trim().to_owned()));
            }
            if let Some(target) = self.logic.typedef(&type_name) {
                type_name = target.to_owned();
                continue;
            }
            if let Some(class) = self.logic.class(&type_name) {
                return Ok(Shape::Record(format!("class '{type_name}'"), class.fields.clone()));
            }
            return Ok(Shape::Leaf(type_name));
        }
    }
}

fn mix(key: &[u8; 32], domain: u8, operand: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.update([domain]);
    hasher.update(operand);
    hasher.finalize().into()
}

fn strip_composite<'a>(type_name: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = type_name.strip_prefix(keyword)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.trim())
}

fn split_comma(expr: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (pos, ch) in expr.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => return Some(pos),
            _ => {}
        }
    }
    None
}
