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

use std::collections::BTreeMap;

use crate::decode::{split_atom, PackReader};
use crate::encode::PackWriter;
use crate::wire::{write_varint, WireType};
use crate::{deserialize, serialize, DecodeError, EncodeError, Schema, Value};

/// POLO document: a labelled collection of independently encoded values.
///
/// On the wire a document is a load of alternating label words and raw entries, where each raw
/// entry is the complete standalone encoding of its value. Labels are emitted in ascending order,
/// so the document form is deterministic and fields remain individually decodable without the full
/// schema.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Document {
    entries: BTreeMap<String, Vec<u8>>,
}

impl Document {
    pub fn new() -> Self { Self::default() }

    /// Serializes `value` against `schema` and stores it under `label`.
    pub fn insert(&mut self, label: impl Into<String>, value: &Value, schema: &Schema) -> Result<(), EncodeError> {
        let raw = serialize(value, schema)?;
        self.entries.insert(label.into(), raw);
        Ok(())
    }

    /// Stores an already encoded atom under `label`.
    pub fn insert_raw(&mut self, label: impl Into<String>, raw: Vec<u8>) { self.entries.insert(label.into(), raw); }

    /// The raw standalone encoding stored under `label`.
    pub fn get(&self, label: &str) -> Option<&[u8]> { self.entries.get(label).map(Vec::as_slice) }

    /// Decodes the entry under `label` against `schema`; `None` for absent labels.
    pub fn decode_field(&self, label: &str, schema: &Schema) -> Result<Option<Value>, DecodeError> {
        self.entries.get(label).map(|raw| deserialize(raw, schema)).transpose()
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn labels(&self) -> impl Iterator<Item = &str> { self.entries.keys().map(String::as_str) }

    /// Encodes the document as a standalone atom.
    pub fn encode(&self) -> Vec<u8> {
        let mut pack = PackWriter::default();
        for (label, raw) in &self.entries {
            pack.push(WireType::Word, label.as_bytes());
            pack.push(WireType::Raw, raw);
        }
        let payload = pack.finish();
        let mut buf = Vec::with_capacity(payload.len() + 1);
        write_varint(&mut buf, WireType::Doc.code() as u64);
        buf.extend_from_slice(&payload);
        buf
    }

    /// Decodes a standalone document atom.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let (wire, payload) = split_atom(data)?;
        if wire != WireType::Doc {
            return Err(DecodeError::WireMismatch {
                expected: "document",
                found: wire,
            });
        }
        Self::decode_payload(payload)
    }

    /// Decodes a document load (without the standalone tag).
    pub(crate) fn decode_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let pack = PackReader::parse(payload)?;
        if pack.len() % 2 != 0 {
            return Err(DecodeError::OddMapLength(pack.len()));
        }
        let mut entries = BTreeMap::new();
        for no in (0..pack.len()).step_by(2) {
            let (wire, label) = pack.item(no);
            if wire != WireType::Word {
                return Err(DecodeError::WireMismatch {
                    expected: "string",
                    found: wire,
                });
            }
            let label = core::str::from_utf8(label).map_err(|_| DecodeError::InvalidUtf8)?;
            let (wire, raw) = pack.item(no + 1);
            if wire != WireType::Raw {
                return Err(DecodeError::WireMismatch {
                    expected: "bytes",
                    found: wire,
                });
            }
            entries.insert(label.to_owned(), raw.to_vec());
        }
        Ok(Document { entries })
    }
}

impl FromIterator<(String, Vec<u8>)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Vec<u8>)>>(iter: T) -> Self {
        Document {
            entries: iter.into_iter().collect(),
        }
    }
}
