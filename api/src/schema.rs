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

//! Translation of manifest type strings into POLO schemas.
//!
//! A type string is a primitive name, a composite expression (`array(T)`, `map(K,V)` with
//! arbitrary nesting), or a typedef/class name resolved against the manifest tables. Resolution is
//! recursive and memoized through an explicit [`SchemaCache`] scoped to one logic: manifests are
//! read many times more often than they are constructed.

use std::collections::HashMap;
use std::sync::RwLock;

use indexmap::IndexMap;
use polo::Schema;

use crate::manifest::{Logic, TypeField};

/// Memoization cache of resolved type schemas, keyed by the type string.
///
/// Scoped to a single logic: type names from different manifests must never share a cache. Safe to
/// share read-only across threads once populated; concurrent resolution of the same type inserts
/// the same schema, so insert-if-absent keeps the cache consistent.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<String, Schema>>,
}

impl SchemaCache {
    pub fn new() -> Self { Self::default() }

    fn get(&self, type_name: &str) -> Option<Schema> {
        self.entries.read().expect("schema cache lock poisoned").get(type_name).cloned()
    }

    fn insert(&self, type_name: &str, schema: &Schema) {
        self.entries
            .write()
            .expect("schema cache lock poisoned")
            .entry(type_name.to_owned())
            .or_insert_with(|| schema.clone());
    }

    pub fn len(&self) -> usize { self.entries.read().expect("schema cache lock poisoned").len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Resolver of manifest type strings into [`Schema`] trees.
#[derive(Copy, Clone)]
pub struct SchemaBuilder<'a> {
    logic: &'a Logic,
    cache: &'a SchemaCache,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(logic: &'a Logic, cache: &'a SchemaCache) -> Self { SchemaBuilder { logic, cache } }

    /// Resolves a type string; `context` names the routine or field asking, for diagnosability of
    /// failures.
    pub fn resolve(&self, type_name: &str, context: &str) -> Result<Schema, SchemaError> {
        let mut visiting = Vec::new();
        self.resolve_inner(type_name, context, &mut visiting)
    }

    /// Builds the struct schema of a field list, with fields ordered by their declared slots.
    pub fn fields_schema(&self, fields: &[TypeField], context: &str) -> Result<Schema, SchemaError> {
        let mut sorted: Vec<&TypeField> = fields.iter().collect();
        sorted.sort_by_key(|field| field.slot);
        let mut layout = IndexMap::with_capacity(sorted.len());
        for field in sorted {
            let schema = self.resolve(&field.type_name, context)?;
            if layout.insert(field.label.clone(), schema).is_some() {
                return Err(SchemaError::DuplicateField {
                    label: field.label.clone(),
                    context: context.to_owned(),
                });
            }
        }
        Ok(Schema::Struct(layout))
    }

    fn resolve_inner(&self, type_name: &str, context: &str, visiting: &mut Vec<String>) -> Result<Schema, SchemaError> {
        let type_name = type_name.trim();
        if let Some(schema) = self.cache.get(type_name) {
            return Ok(schema);
        }
        let schema = match parse_type(type_name).ok_or_else(|| SchemaError::Malformed(type_name.to_owned()))? {
            TypeExpr::Primitive(schema) => schema,
            TypeExpr::Array(inner) => Schema::list(self.resolve_inner(inner, context, visiting)?),
            TypeExpr::Map(key, value) => Schema::map(
                self.resolve_inner(key, context, visiting)?,
                self.resolve_inner(value, context, visiting)?,
            ),
            TypeExpr::Named(name) => {
                if visiting.iter().any(|seen| seen == name) {
                    return Err(SchemaError::CyclicType {
                        type_name: name.to_owned(),
                        context: context.to_owned(),
                    });
                }
                visiting.push(name.to_owned());
                // Typedefs shadow classes of the same name
                let schema = if let Some(target) = self.logic.typedef(name) {
                    self.resolve_inner(target, context, visiting)?
                } else if let Some(class) = self.logic.class(name) {
                    let mut sorted: Vec<&TypeField> = class.fields.iter().collect();
                    sorted.sort_by_key(|field| field.slot);
                    let mut layout = IndexMap::with_capacity(sorted.len());
                    for field in sorted {
                        let field_schema = self.resolve_inner(&field.type_name, context, visiting)?;
                        if layout.insert(field.label.clone(), field_schema).is_some() {
                            return Err(SchemaError::DuplicateField {
                                label: field.label.clone(),
                                context: format!("class '{name}'"),
                            });
                        }
                    }
                    Schema::Struct(layout)
                } else {
                    return Err(SchemaError::UnresolvedType {
                        type_name: name.to_owned(),
                        context: context.to_owned(),
                    });
                };
                visiting.pop();
                schema
            }
        };
        self.cache.insert(type_name, &schema);
        Ok(schema)
    }
}

/// Error of resolving a manifest type string. Definitional: fatal and never retried.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
pub enum SchemaError {
    /// The name matches no primitive, typedef, or class of the manifest.
    #[display("type '{type_name}' used by {context} matches no primitive, typedef or class")]
    UnresolvedType { type_name: String, context: String },

    #[display("malformed type expression '{0}'")]
    Malformed(String),

    /// A typedef or class resolves through itself.
    #[display("type '{type_name}' used by {context} resolves through itself")]
    CyclicType { type_name: String, context: String },

    #[display("field label '{label}' is declared twice in {context}")]
    DuplicateField { label: String, context: String },
}

enum TypeExpr<'a> {
    Primitive(Schema),
    Array(&'a str),
    Map(&'a str, &'a str),
    Named(&'a str),
}

/// Parses the outermost form of a type expression. Inner expressions of composites are resolved
/// recursively by the builder.
fn parse_type(type_name: &str) -> Option<TypeExpr<'_>> {
    if let Some(schema) = primitive_schema(type_name) {
        return Some(TypeExpr::Primitive(schema));
    }
    if let Some(inner) = composite(type_name, "array") {
        if inner.is_empty() {
            return None;
        }
        return Some(TypeExpr::Array(inner));
    }
    if let Some(inner) = composite(type_name, "map") {
        let comma = top_level_comma(inner)?;
        let (key, value) = (inner[..comma].trim(), inner[comma + 1..].trim());
        if key.is_empty() || value.is_empty() {
            return None;
        }
        return Some(TypeExpr::Map(key, value));
    }
    if type_name.is_empty() || type_name.contains(['(', ')', ',']) {
        return None;
    }
    Some(TypeExpr::Named(type_name))
}

/// Primitive leaf table: fixed-width unsigned integers, booleans, strings, and the two byte-string
/// forms (`address` is a 32-byte identifier on the wire, but schema-wise plain bytes).
fn primitive_schema(type_name: &str) -> Option<Schema> {
    Some(match type_name {
        "u8" | "u16" | "u32" | "u64" | "u128" | "u256" => Schema::Integer,
        "bool" => Schema::Bool,
        "string" => Schema::Str,
        "address" | "bytes" => Schema::Bytes,
        _ => return None,
    })
}

fn composite<'a>(type_name: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = type_name.strip_prefix(keyword)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.trim())
}

/// Position of the comma separating map key and value expressions, skipping nested parentheses.
fn top_level_comma(expr: &str) -> Option<usize> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;

    fn sample_logic() -> Logic {
        let json = r#"{
            "syntax": 1,
            "engine": {"kind": "PISA", "flags": []},
            "elements": [
                {"ptr": 0, "kind": "typedef", "data": {"name": "addr", "type": "address"}},
                {"ptr": 1, "kind": "class", "data": {"name": "Order", "fields": [
                    {"slot": 0, "label": "maker", "type": "addr"},
                    {"slot": 1, "label": "amounts", "type": "array(u64)"}
                ]}},
                {"ptr": 2, "kind": "class", "data": {"name": "Book", "fields": [
                    {"slot": 0, "label": "orders", "type": "map(string,Order)"}
                ]}}
            ]
        }"#;
        Logic::with(Manifest::from_json(json).unwrap()).unwrap()
    }

    #[test]
    fn primitives_resolve_to_leaf_schemas() {
        let logic = sample_logic();
        let cache = SchemaCache::new();
        let builder = SchemaBuilder::new(&logic, &cache);
        assert_eq!(builder.resolve("u64", "test").unwrap(), Schema::Integer);
        assert_eq!(builder.resolve("u256", "test").unwrap(), Schema::Integer);
        assert_eq!(builder.resolve("bool", "test").unwrap(), Schema::Bool);
        assert_eq!(builder.resolve("string", "test").unwrap(), Schema::Str);
        assert_eq!(builder.resolve("address", "test").unwrap(), Schema::Bytes);
        assert_eq!(builder.resolve("bytes", "test").unwrap(), Schema::Bytes);
    }

    #[test]
    fn composites_nest_arbitrarily() {
        let logic = sample_logic();
        let cache = SchemaCache::new();
        let builder = SchemaBuilder::new(&logic, &cache);
        let schema = builder.resolve("array(map(string,array(u64)))", "test").unwrap();
        assert_eq!(schema, Schema::list(Schema::map(Schema::Str, Schema::list(Schema::Integer))));
    }

    #[test]
    fn typedefs_and_classes_expand() {
        let logic = sample_logic();
        let cache = SchemaCache::new();
        let builder = SchemaBuilder::new(&logic, &cache);
        assert_eq!(builder.resolve("addr", "test").unwrap(), Schema::Bytes);
        let order = builder.resolve("Order", "test").unwrap();
        assert_eq!(
            order,
            Schema::structure([("maker", Schema::Bytes), ("amounts", Schema::list(Schema::Integer))])
        );
        let book = builder.resolve("Book", "test").unwrap();
        assert_eq!(book, Schema::structure([("orders", Schema::map(Schema::Str, order))]));
    }

    #[test]
    fn unresolved_type_names_the_offender_and_context() {
        let logic = sample_logic();
        let cache = SchemaCache::new();
        let builder = SchemaBuilder::new(&logic, &cache);
        assert_eq!(builder.resolve("Missing", "routine 'Transfer!'").unwrap_err(), SchemaError::UnresolvedType {
            type_name: s!("Missing"),
            context: s!("routine 'Transfer!'"),
        });
    }

    #[test]
    fn cyclic_typedefs_are_rejected_not_looped() {
        let json = r#"{
            "syntax": 1,
            "engine": {"kind": "PISA", "flags": []},
            "elements": [
                {"ptr": 0, "kind": "typedef", "data": {"name": "a", "type": "b"}},
                {"ptr": 1, "kind": "typedef", "data": {"name": "b", "type": "a"}}
            ]
        }"#;
        // The cycle is already fatal when the manifest is indexed
        assert!(matches!(
            Logic::from_json(json),
            Err(crate::ManifestError::Schema(SchemaError::CyclicType { .. }))
        ));
    }

    #[test]
    fn self_referential_class_is_rejected() {
        let json = r#"{
            "syntax": 1,
            "engine": {"kind": "MERU", "flags": []},
            "elements": [
                {"ptr": 0, "kind": "class", "data": {"name": "Node", "fields": [
                    {"slot": 0, "label": "next", "type": "Node"}
                ]}}
            ]
        }"#;
        assert!(matches!(
            Logic::from_json(json),
            Err(crate::ManifestError::Schema(SchemaError::CyclicType { .. }))
        ));
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        let logic = sample_logic();
        let cache = SchemaCache::new();
        let builder = SchemaBuilder::new(&logic, &cache);
        for bad in ["array(u64", "map(u64)", "array()", ""] {
            assert!(builder.resolve(bad, "test").is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn resolution_is_memoized_per_cache() {
        let logic = sample_logic();
        let cache = SchemaCache::new();
        let builder = SchemaBuilder::new(&logic, &cache);
        assert!(cache.is_empty());
        builder.resolve("Book", "test").unwrap();
        let after_first = cache.len();
        assert!(after_first >= 1);
        builder.resolve("Book", "test").unwrap();
        assert_eq!(cache.len(), after_first);
    }

    #[test]
    fn fields_schema_orders_by_slot() {
        let logic = sample_logic();
        let cache = SchemaCache::new();
        let builder = SchemaBuilder::new(&logic, &cache);
        let fields = vec![
            TypeField {
                slot: 1,
                label: s!("b"),
                type_name: s!("u64"),
            },
            TypeField {
                slot: 0,
                label: s!("a"),
                type_name: s!("string"),
            },
        ];
        let schema = builder.fields_schema(&fields, "test").unwrap();
        assert_eq!(schema, Schema::structure([("a", Schema::Str), ("b", Schema::Integer)]));
    }
}
