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

use crate::wire::{write_varint, WireType};
use crate::{Schema, Value};

/// Serializes `value` against `schema` into a standalone POLO atom.
///
/// The output opens with the value's wire-type tag; compound values continue with their load.
/// Serialization is deterministic: equal values yield byte-identical output.
pub fn serialize(value: &Value, schema: &Schema) -> Result<Vec<u8>, EncodeError> {
    let (wire, payload) = encode_value(value, schema)?;
    let mut buf = Vec::with_capacity(payload.len() + 1);
    write_varint(&mut buf, wire.code() as u64);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Error of a value/schema shape mismatch during serialization.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
pub enum EncodeError {
    /// The value's kind does not match what the schema expects at this position.
    #[display("can't encode {found} value against {expected} schema")]
    TypeMismatch { expected: &'static str, found: &'static str },

    /// A field required by a struct schema is absent from the value.
    #[display("field '{0}' required by the schema is missing from the value")]
    MissingField(String),

    /// The value carries a field the struct schema does not define.
    #[display("field '{0}' is not defined by the schema")]
    UnknownField(String),
}

/// Encodes a value into its wire type and payload, without the standalone tag.
pub(crate) fn encode_value(value: &Value, schema: &Schema) -> Result<(WireType, Vec<u8>), EncodeError> {
    let mismatch = || EncodeError::TypeMismatch {
        expected: schema.kind_name(),
        found: value.kind_name(),
    };
    Ok(match (value, schema) {
        (Value::Null, _) => (WireType::Null, vec![]),

        (Value::Bool(false), Schema::Bool) => (WireType::False, vec![]),
        (Value::Bool(true), Schema::Bool) => (WireType::True, vec![]),

        (Value::Uint(value), Schema::Integer) => (WireType::PosInt, uint_bytes(*value)),
        (Value::Int(value), Schema::Integer) if *value >= 0 => (WireType::PosInt, uint_bytes(*value as u128)),
        (Value::Int(value), Schema::Integer) => (WireType::NegInt, uint_bytes(value.unsigned_abs())),

        (Value::Bytes(bytes), Schema::Bytes) => (WireType::Raw, bytes.clone()),
        (Value::String(s), Schema::Str) => (WireType::Word, s.as_bytes().to_vec()),

        (Value::List(items), Schema::List(inner)) => {
            let mut pack = PackWriter::default();
            for item in items {
                let (wire, payload) = encode_value(item, inner)?;
                pack.push(wire, &payload);
            }
            (WireType::Pack, pack.finish())
        }

        (Value::Map(entries), Schema::Map { key, value }) => {
            // BTreeMap iterates in ascending key order, which pins the wire form
            let mut pack = PackWriter::default();
            for (k, v) in entries {
                let (wire, payload) = encode_value(k, key)?;
                pack.push(wire, &payload);
                let (wire, payload) = encode_value(v, value)?;
                pack.push(wire, &payload);
            }
            (WireType::Pack, pack.finish())
        }

        (Value::Struct(fields), Schema::Struct(layout)) => {
            if let Some((label, _)) = fields.iter().find(|(label, _)| !layout.contains_key(label)) {
                return Err(EncodeError::UnknownField(label.clone()));
            }
            let mut pack = PackWriter::default();
            for (label, field_schema) in layout {
                let field = value
                    .field(label)
                    .ok_or_else(|| EncodeError::MissingField(label.clone()))?;
                let (wire, payload) = encode_value(field, field_schema)?;
                pack.push(wire, &payload);
            }
            (WireType::Pack, pack.finish())
        }

        _ => return Err(mismatch()),
    })
}

/// Minimal big-endian representation; zero is the empty payload.
fn uint_bytes(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|byte| **byte == 0).count();
    bytes[skip..].to_vec()
}

/// Accumulates pack elements into the head/body layout of a load.
#[derive(Default)]
pub(crate) struct PackWriter {
    head: Vec<u8>,
    body: Vec<u8>,
}

impl PackWriter {
    pub(crate) fn push(&mut self, wire: WireType, payload: &[u8]) {
        let offset = self.body.len() as u64;
        write_varint(&mut self.head, (offset << 4) | wire.code() as u64);
        self.body.extend_from_slice(payload);
    }

    /// Assembles the load: `varint(head_len << 4 | load)`, the head, then the body.
    pub(crate) fn finish(self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.head.len() + self.body.len() + 2);
        write_varint(&mut buf, ((self.head.len() as u64) << 4) | WireType::Load.code() as u64);
        buf.extend_from_slice(&self.head);
        buf.extend_from_slice(&self.body);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_atom_is_tag_plus_utf8() {
        let encoded = serialize(&Value::from("RIO"), &Schema::Str).unwrap();
        assert_eq!(encoded, vec![0x06, b'R', b'I', b'O']);
    }

    #[test]
    fn integers_use_minimal_big_endian() {
        assert_eq!(serialize(&Value::from(0u64), &Schema::Integer).unwrap(), vec![0x03]);
        assert_eq!(serialize(&Value::from(500u64), &Schema::Integer).unwrap(), vec![0x03, 0x01, 0xF4]);
        assert_eq!(serialize(&Value::Int(-2), &Schema::Integer).unwrap(), vec![0x04, 0x02]);
    }

    #[test]
    fn bools_and_null_have_no_payload() {
        assert_eq!(serialize(&Value::from(false), &Schema::Bool).unwrap(), vec![0x01]);
        assert_eq!(serialize(&Value::from(true), &Schema::Bool).unwrap(), vec![0x02]);
        assert_eq!(serialize(&Value::Null, &Schema::Bytes).unwrap(), vec![0x00]);
    }

    #[test]
    fn struct_layout_matches_known_vector() {
        // Exception layout {class, data, trace}; full vector pinned in decode tests as well
        let schema = Schema::structure([
            ("class", Schema::Str),
            ("data", Schema::Str),
            ("trace", Schema::list(Schema::Str)),
        ]);
        let value = Value::structure([
            ("class", Value::from("string")),
            ("data", Value::from("Something went wrong")),
            ("trace", Value::list([Value::from("function1()"), Value::from("function2()")])),
        ]);
        let encoded = serialize(&value, &schema).unwrap();
        assert_eq!(&encoded[..6], &[0x0E, 0x4F, 0x06, 0x66, 0xAE, 0x03]);
        let mut expect = vec![0x0E, 0x4F, 0x06, 0x66, 0xAE, 0x03];
        expect.extend_from_slice(b"string");
        expect.extend_from_slice(b"Something went wrong");
        expect.extend_from_slice(&[0x3F, 0x06, 0xB6, 0x01]);
        expect.extend_from_slice(b"function1()");
        expect.extend_from_slice(b"function2()");
        assert_eq!(encoded, expect);
    }

    #[test]
    fn struct_rejects_missing_and_unknown_fields() {
        let schema = Schema::structure([("a", Schema::Integer)]);
        assert_eq!(
            serialize(&Value::structure([("b", Value::from(1u8))]), &schema),
            Err(EncodeError::UnknownField(s!("b")))
        );
        assert_eq!(
            serialize(&Value::structure(Vec::<(String, Value)>::new()), &schema),
            Err(EncodeError::MissingField(s!("a")))
        );
    }

    #[test]
    fn shape_mismatch_is_reported() {
        assert_eq!(
            serialize(&Value::from("nope"), &Schema::Integer),
            Err(EncodeError::TypeMismatch {
                expected: "integer",
                found: "string"
            })
        );
    }
}
