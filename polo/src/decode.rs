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

use crate::document::Document;
use crate::wire::{read_varint, UnknownWire, VarintError, WireType};
use crate::{Schema, Value};

/// Deserializes a standalone POLO atom against `schema`.
///
/// The wire is self-describing, so shape violations (a word where the schema expects an integer,
/// a malformed load, an over-wide integer) surface as structured errors instead of garbage values.
/// A null atom decodes to [`Value::Null`] under any schema.
pub fn deserialize(data: &[u8], schema: &Schema) -> Result<Value, DecodeError> {
    let (wire, payload) = split_atom(data)?;
    decode_body(wire, payload, schema)
}

/// Error of interpreting wire data against a schema.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
pub enum DecodeError {
    #[from]
    #[display(inner)]
    Varint(VarintError),

    #[from]
    #[display(inner)]
    Wire(UnknownWire),

    /// A compound atom whose load does not open with the load wire tag.
    #[display("compound payload does not open with a load tag (found {0:#04x})")]
    MissingLoad(u8),

    /// The head of a load addresses bytes outside its body.
    #[display("load head addresses offset {offset} beyond the body length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// Load head offsets must never decrease.
    #[display("load head offsets are not monotonic")]
    NonMonotonicOffsets,

    /// The wire carries a different shape than the schema expects.
    #[display("schema expects {expected}, but the wire carries {found}")]
    WireMismatch { expected: &'static str, found: WireType },

    /// Integer payload wider than the 128 bits the value model carries.
    #[display("integer payload of {0} bytes exceeds the supported 16")]
    IntegerOverflow(usize),

    /// Word payload which is not valid UTF-8.
    #[display("word payload is not valid UTF-8")]
    InvalidUtf8,

    /// A map pack must carry an even number of elements (alternating keys and values).
    #[display("map pack carries an odd number of elements ({0})")]
    OddMapLength(usize),

    /// A struct pack must carry exactly one element per schema field.
    #[display("struct pack carries {found} elements, the schema defines {expected} fields")]
    FieldCountMismatch { expected: usize, found: usize },

    /// Wire type defined by the format but unsupported by this value model.
    #[display("wire type {0} is not supported")]
    UnsupportedWire(WireType),
}

/// Splits a standalone atom into its wire type and payload (the rest of the buffer).
pub(crate) fn split_atom(data: &[u8]) -> Result<(WireType, &[u8]), DecodeError> {
    let mut pos = 0;
    let tag = read_varint(data, &mut pos)?;
    let wire = WireType::from_code(u8::try_from(tag).map_err(|_| UnknownWire(0xFF))?)?;
    Ok((wire, &data[pos..]))
}

pub(crate) fn decode_body(wire: WireType, payload: &[u8], schema: &Schema) -> Result<Value, DecodeError> {
    let mismatch = |found: WireType| DecodeError::WireMismatch {
        expected: schema.kind_name(),
        found,
    };
    Ok(match (wire, schema) {
        (WireType::Null, _) => Value::Null,

        (WireType::False, Schema::Bool) => Value::Bool(false),
        (WireType::True, Schema::Bool) => Value::Bool(true),

        (WireType::PosInt, Schema::Integer) => Value::Uint(read_uint(payload)?),
        (WireType::NegInt, Schema::Integer) => {
            let magnitude = read_uint(payload)?;
            if magnitude > i128::MAX as u128 {
                return Err(DecodeError::IntegerOverflow(payload.len()));
            }
            Value::Int(-(magnitude as i128))
        }

        (WireType::Raw, Schema::Bytes) => Value::Bytes(payload.to_vec()),
        (WireType::Word, Schema::Str) => {
            Value::String(core::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)?.to_owned())
        }

        (WireType::Pack, Schema::List(inner)) => {
            let pack = PackReader::parse(payload)?;
            let mut items = Vec::with_capacity(pack.len());
            for no in 0..pack.len() {
                let (wire, payload) = pack.item(no);
                items.push(decode_body(wire, payload, inner)?);
            }
            Value::List(items)
        }

        (WireType::Pack, Schema::Map { key, value }) => {
            let pack = PackReader::parse(payload)?;
            if pack.len() % 2 != 0 {
                return Err(DecodeError::OddMapLength(pack.len()));
            }
            let mut entries = BTreeMap::new();
            for no in (0..pack.len()).step_by(2) {
                let (wire, payload) = pack.item(no);
                let k = decode_body(wire, payload, key)?;
                let (wire, payload) = pack.item(no + 1);
                let v = decode_body(wire, payload, value)?;
                entries.insert(k, v);
            }
            Value::Map(entries)
        }

        (WireType::Pack, Schema::Struct(layout)) => {
            let pack = PackReader::parse(payload)?;
            if pack.len() != layout.len() {
                return Err(DecodeError::FieldCountMismatch {
                    expected: layout.len(),
                    found: pack.len(),
                });
            }
            let mut fields = Vec::with_capacity(layout.len());
            for (no, (label, field_schema)) in layout.iter().enumerate() {
                let (wire, payload) = pack.item(no);
                fields.push((label.clone(), decode_body(wire, payload, field_schema)?));
            }
            Value::Struct(fields)
        }

        // Documents carry labels, so a labelled struct can also arrive as a document
        (WireType::Doc, Schema::Struct(layout)) => {
            let doc = Document::decode_payload(payload)?;
            let mut fields = Vec::with_capacity(layout.len());
            for (label, field_schema) in layout {
                let value = match doc.get(label) {
                    Some(raw) => deserialize(raw, field_schema)?,
                    None => Value::Null,
                };
                fields.push((label.clone(), value));
            }
            Value::Struct(fields)
        }

        (WireType::Float, _) => return Err(DecodeError::UnsupportedWire(WireType::Float)),
        (wire, _) => return Err(mismatch(wire)),
    })
}

/// Big-endian integer payload; the empty payload is zero.
fn read_uint(payload: &[u8]) -> Result<u128, DecodeError> {
    if payload.len() > 16 {
        return Err(DecodeError::IntegerOverflow(payload.len()));
    }
    let mut value = 0u128;
    for byte in payload {
        value = (value << 8) | *byte as u128;
    }
    Ok(value)
}

/// Parsed load of a pack: head entries plus the body slice.
pub(crate) struct PackReader<'a> {
    entries: Vec<(usize, WireType)>,
    body: &'a [u8],
}

impl<'a> PackReader<'a> {
    pub(crate) fn parse(payload: &'a [u8]) -> Result<Self, DecodeError> {
        let mut pos = 0;
        let header = read_varint(payload, &mut pos)?;
        if header & 0x0F != WireType::Load.code() as u64 {
            return Err(DecodeError::MissingLoad((header & 0x0F) as u8));
        }
        let head_len = (header >> 4) as usize;
        let head_end = pos.checked_add(head_len).filter(|end| *end <= payload.len()).ok_or(
            DecodeError::OffsetOutOfRange {
                offset: head_len,
                len: payload.len().saturating_sub(pos),
            },
        )?;
        let body = &payload[head_end..];

        let mut entries = Vec::new();
        let mut last_offset = 0usize;
        while pos < head_end {
            let entry = read_varint(&payload[..head_end], &mut pos)?;
            let wire = WireType::from_code((entry & 0x0F) as u8)?;
            let offset = (entry >> 4) as usize;
            if offset > body.len() {
                return Err(DecodeError::OffsetOutOfRange { offset, len: body.len() });
            }
            if offset < last_offset {
                return Err(DecodeError::NonMonotonicOffsets);
            }
            last_offset = offset;
            entries.push((offset, wire));
        }
        Ok(PackReader { entries, body })
    }

    pub(crate) fn len(&self) -> usize { self.entries.len() }

    /// Payload of element `no`: from its offset up to the next element's offset (or the body end).
    pub(crate) fn item(&self, no: usize) -> (WireType, &'a [u8]) {
        let (offset, wire) = self.entries[no];
        let end = self.entries.get(no + 1).map(|(next, _)| *next).unwrap_or(self.body.len());
        (wire, &self.body[offset..end])
    }
}
