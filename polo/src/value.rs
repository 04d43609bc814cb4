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

use core::fmt::{self, Display, Formatter};
use std::collections::BTreeMap;

use amplify::hex::ToHex;

/// Dynamic value model for POLO data.
///
/// Values are what schemas interpret wire payloads into, and what gets serialized back out.
/// Unsigned integers are carried up to 128 bits; a wider wire integer surfaces as a structured
/// decode error rather than a truncated value. The model carries no floats: no MOI schema type
/// resolves to one.
///
/// Struct fields keep their declared order; map entries order by key, which together with the
/// minimal integer form makes encoding deterministic.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Uint(u128),
    Int(i128),
    Bytes(Vec<u8>),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<Value, Value>),
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Constructs a struct value from labelled fields, keeping their order.
    pub fn structure<L: Into<String>>(fields: impl IntoIterator<Item = (L, Value)>) -> Self {
        Value::Struct(fields.into_iter().map(|(label, value)| (label.into(), value)).collect())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self { Value::List(items.into_iter().collect()) }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(entries.into_iter().collect())
    }

    /// Looks up a field of a struct value by its label; `None` for missing labels and non-struct
    /// values.
    pub fn field(&self, label: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(l, _)| l == label).map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u128> {
        match self {
            Value::Uint(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub const fn is_null(&self) -> bool { matches!(self, Value::Null) }

    /// Human-readable name of the value's own kind, used in error reporting.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Uint(_) | Value::Int(_) => "integer",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(value) => Display::fmt(value, f),
            Value::Uint(value) => Display::fmt(value, f),
            Value::Int(value) => Display::fmt(value, f),
            Value::Bytes(bytes) => write!(f, "0x{}", bytes.to_hex()),
            Value::String(s) => write!(f, "\"{s}\""),
            Value::List(items) => {
                f.write_str("[")?;
                for (no, item) in items.iter().enumerate() {
                    if no > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(item, f)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (no, (key, value)) in entries.iter().enumerate() {
                    if no > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key} -> {value}")?;
                }
                f.write_str("}")
            }
            Value::Struct(fields) => {
                f.write_str("{")?;
                for (no, (label, value)) in fields.iter().enumerate() {
                    if no > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{label}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self { Value::Bool(value) }
}
impl From<u8> for Value {
    fn from(value: u8) -> Self { Value::Uint(value as u128) }
}
impl From<u16> for Value {
    fn from(value: u16) -> Self { Value::Uint(value as u128) }
}
impl From<u32> for Value {
    fn from(value: u32) -> Self { Value::Uint(value as u128) }
}
impl From<u64> for Value {
    fn from(value: u64) -> Self { Value::Uint(value as u128) }
}
impl From<u128> for Value {
    fn from(value: u128) -> Self { Value::Uint(value) }
}
impl From<i64> for Value {
    fn from(value: i64) -> Self { Value::Int(value as i128) }
}
impl From<i128> for Value {
    fn from(value: i128) -> Self { Value::Int(value) }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self { Value::String(value.to_owned()) }
}
impl From<String> for Value {
    fn from(value: String) -> Self { Value::String(value) }
}
impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self { Value::Bytes(value) }
}
impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self { Value::Bytes(value.to_vec()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup() {
        let value = Value::structure([("name", Value::from("RIO")), ("supply", Value::from(500u64))]);
        assert_eq!(value.field("name").and_then(Value::as_str), Some("RIO"));
        assert_eq!(value.field("supply").and_then(Value::as_uint), Some(500));
        assert_eq!(value.field("absent"), None);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(&b"\x01\xF4"[..]).to_string(), "0x01f4");
        assert_eq!(Value::list([Value::from(1u8), Value::from("a")]).to_string(), "[1, \"a\"]");
        assert_eq!(
            Value::structure([("ok", Value::from(true))]).to_string(),
            "{ok: true}"
        );
    }

    #[test]
    fn map_orders_by_key() {
        let map = Value::map([
            (Value::from("b"), Value::from(2u8)),
            (Value::from("a"), Value::from(1u8)),
        ]);
        assert_eq!(map.to_string(), "{\"a\" -> 1, \"b\" -> 2}");
    }
}
