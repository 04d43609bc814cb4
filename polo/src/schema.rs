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

use indexmap::IndexMap;

/// Schema tree interpreting POLO payloads.
///
/// Struct field order is significant: fields are laid out positionally on the wire, so two struct
/// schemas with the same fields in different order describe different encodings.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Schema {
    /// Unsigned or negative integer in minimal big-endian form.
    Integer,
    Bool,
    Str,
    Bytes,
    List(Box<Schema>),
    Map { key: Box<Schema>, value: Box<Schema> },
    Struct(IndexMap<String, Schema>),
}

impl Schema {
    pub fn list(inner: Schema) -> Self { Schema::List(Box::new(inner)) }

    pub fn map(key: Schema, value: Schema) -> Self {
        Schema::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Constructs a struct schema from labelled fields, keeping their order.
    pub fn structure<L: Into<String>>(fields: impl IntoIterator<Item = (L, Schema)>) -> Self {
        Schema::Struct(fields.into_iter().map(|(label, schema)| (label.into(), schema)).collect())
    }

    /// Human-readable name of the schema's own kind, used in error reporting.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Schema::Integer => "integer",
            Schema::Bool => "bool",
            Schema::Str => "string",
            Schema::Bytes => "bytes",
            Schema::List(_) => "list",
            Schema::Map { .. } => "map",
            Schema::Struct(_) => "struct",
        }
    }
}
