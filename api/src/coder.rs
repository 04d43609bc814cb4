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

//! Encoding and decoding at the manifest/routine boundary: routine arguments and outputs,
//! exceptions, event logs, state fields, and the manifest itself.
//!
//! Every decode path shares one contract: the empty payload `"0x"` means "nothing was returned"
//! and decodes to `None` - distinguishing it from a returned zero value, which carries a wire tag.

use amplify::hex;
use polo::{Document, Schema, Value};

use crate::manifest::{
    ClassDef, ConstantDef, Element, ElementBody, Engine, EngineKind, EventDef, Logic, Manifest, MethodDef, RoutineDef,
    RoutineKind, StateDef, StateMode, TypeField, TypedefDef,
};
use crate::schema::{SchemaBuilder, SchemaCache, SchemaError};
use crate::util::{decode_hex, is_empty_payload};

/// Coder for values crossing the routine boundary of one logic.
///
/// Owns the schema cache memoizing type resolution across calls; the cache can also be supplied
/// explicitly when its lifetime should outlive the coder.
pub struct ManifestCoder<'a> {
    logic: &'a Logic,
    cache: SchemaCache,
}

impl<'a> ManifestCoder<'a> {
    pub fn new(logic: &'a Logic) -> Self { Self::with_cache(logic, SchemaCache::new()) }

    pub fn with_cache(logic: &'a Logic, cache: SchemaCache) -> Self { ManifestCoder { logic, cache } }

    pub fn cache(&self) -> &SchemaCache { &self.cache }

    fn builder(&self) -> SchemaBuilder<'_> { SchemaBuilder::new(self.logic, &self.cache) }

    /// Encodes positional arguments for the named routine as a POLO document keyed by the
    /// routine's accepted field labels.
    pub fn encode_arguments(&self, routine_name: &str, args: &[Value]) -> Result<Vec<u8>, CoderError> {
        let routine = self
            .logic
            .routine(routine_name)
            .ok_or_else(|| CoderError::RoutineNotFound(routine_name.to_owned()))?;
        self.encode_field_arguments(routine.accepts(), args, &format!("routine '{routine_name}'"))
    }

    /// Encodes positional arguments against an explicit field list. Arguments map to fields in
    /// slot order; the count must match exactly.
    pub fn encode_field_arguments(
        &self,
        fields: &[TypeField],
        args: &[Value],
        context: &str,
    ) -> Result<Vec<u8>, CoderError> {
        if fields.len() != args.len() {
            return Err(CoderError::ArityMismatch {
                context: context.to_owned(),
                expected: fields.len(),
                found: args.len(),
            });
        }
        let builder = self.builder();
        let mut sorted: Vec<&TypeField> = fields.iter().collect();
        sorted.sort_by_key(|field| field.slot);
        let mut doc = Document::new();
        for (field, arg) in sorted.into_iter().zip(args) {
            let schema = builder.resolve(&field.type_name, context)?;
            doc.insert(field.label.as_str(), arg, &schema).map_err(|error| CoderError::Argument {
                label: field.label.clone(),
                error,
            })?;
        }
        Ok(doc.encode())
    }

    /// Decodes the output of the named routine; `None` for the empty payload.
    pub fn decode_output(&self, routine_name: &str, data: &str) -> Result<Option<Value>, CoderError> {
        let routine = self
            .logic
            .routine(routine_name)
            .ok_or_else(|| CoderError::RoutineNotFound(routine_name.to_owned()))?;
        self.decode_field_output(routine.returns(), data, &format!("routine '{routine_name}'"))
    }

    /// Decodes a payload against an explicit field list; `None` for the empty payload.
    pub fn decode_field_output(
        &self,
        fields: &[TypeField],
        data: &str,
        context: &str,
    ) -> Result<Option<Value>, CoderError> {
        if is_empty_payload(data) {
            return Ok(None);
        }
        let schema = self.builder().fields_schema(fields, context)?;
        let bytes = decode_hex(data)?;
        Ok(Some(polo::deserialize(&bytes, &schema)?))
    }

    /// Decodes the log payload of the named event; `None` for the empty payload.
    pub fn decode_event_output(&self, event_name: &str, data: &str) -> Result<Option<Value>, CoderError> {
        let event = self
            .logic
            .event(event_name)
            .ok_or_else(|| CoderError::EventNotFound(event_name.to_owned()))?;
        self.decode_field_output(&event.fields, data, &format!("event '{event_name}'"))
    }

    /// Decodes one field of a state matrix. The label must belong to the given layout; the
    /// payload may be a whole state struct (decoded entirely, then projected) or the single
    /// slot value of the field itself - the wire tag tells the two apart.
    pub fn decode_state(&self, data: &str, label: &str, fields: &[TypeField]) -> Result<Option<Value>, CoderError> {
        let field = fields
            .iter()
            .find(|field| field.label == label)
            .ok_or_else(|| CoderError::StateFieldNotFound(label.to_owned()))?;
        if is_empty_payload(data) {
            return Ok(None);
        }
        let context = format!("state field '{label}'");
        let full = self.builder().fields_schema(fields, &context)?;
        let bytes = decode_hex(data)?;
        match polo::deserialize(&bytes, &full) {
            Ok(value) => Ok(value.field(label).filter(|field| !field.is_null()).cloned()),
            Err(polo::DecodeError::WireMismatch { .. }) | Err(polo::DecodeError::FieldCountMismatch { .. }) => {
                let schema = self.builder().resolve(&field.type_name, &context)?;
                Ok(Some(polo::deserialize(&bytes, &schema)?))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Serializes a whole manifest with the fixed schema of the manifest's own shape (distinct
    /// from the per-type schemas built for routine data).
    pub fn encode_manifest(manifest: &Manifest) -> Result<Vec<u8>, CoderError> {
        let mut elements = Vec::with_capacity(manifest.elements.len());
        for element in &manifest.elements {
            let (data_value, data_schema) = element_data_value(&element.body)?;
            let data = polo::serialize(&data_value, &data_schema)?;
            elements.push(Value::structure([
                ("ptr", Value::from(element.ptr)),
                ("parent", element.parent.map(Value::from).unwrap_or(Value::Null)),
                ("kind", Value::from(element.body.kind_name())),
                ("deps", Value::list(element.deps.iter().map(|dep| Value::from(*dep)))),
                ("data", Value::from(data)),
            ]));
        }
        let value = Value::structure([
            ("syntax", Value::from(manifest.syntax)),
            ("engine", Value::structure([
                ("kind", Value::from(manifest.engine.kind.to_string())),
                ("flags", Value::list(manifest.engine.flags.iter().map(|flag| Value::from(flag.as_str())))),
            ])),
            ("elements", Value::List(elements)),
        ]);
        Ok(polo::serialize(&value, &manifest_schema())?)
    }

    /// The inverse of [`Self::encode_manifest`], for manifests arriving in binary form.
    pub fn decode_manifest(data: &[u8]) -> Result<Manifest, CoderError> {
        let value = polo::deserialize(data, &manifest_schema())?;
        let engine = value.field("engine").ok_or(malformed("engine"))?;
        let kind = match get_str(engine, "kind")?.as_str() {
            "PISA" => EngineKind::Pisa,
            "MERU" => EngineKind::Meru,
            _ => return Err(malformed("engine.kind")),
        };
        let flags = get_list(engine, "flags")?
            .iter()
            .map(|flag| flag.as_str().map(str::to_owned).ok_or(malformed("engine.flags")))
            .collect::<Result<_, _>>()?;

        let mut elements = Vec::new();
        for element in get_list(&value, "elements")? {
            elements.push(decode_element(element)?);
        }
        Ok(Manifest {
            syntax: get_uint(&value, "syntax")? as u32,
            engine: Engine { kind, flags },
            elements,
        })
    }

    /// Decodes the exception payload reported by a failed routine; `None` for the empty payload.
    pub fn decode_exception(data: &str) -> Result<Option<LogicException>, CoderError> {
        if is_empty_payload(data) {
            return Ok(None);
        }
        let value = polo::deserialize(&decode_hex(data)?, &exception_schema())?;
        let class = value.field("class").and_then(Value::as_str).ok_or(CoderError::MalformedException)?;
        let message = value.field("data").and_then(Value::as_str).ok_or(CoderError::MalformedException)?;
        let trace = value
            .field("trace")
            .and_then(Value::as_list)
            .ok_or(CoderError::MalformedException)?
            .iter()
            .map(|frame| frame.as_str().map(str::to_owned).ok_or(CoderError::MalformedException))
            .collect::<Result<_, _>>()?;
        Ok(Some(LogicException {
            class: class.to_owned(),
            data: message.to_owned(),
            trace,
        }))
    }
}

impl crate::manifest::Routine<'_> {
    /// Encodes positional arguments for this routine: the calldata half of a call, the other half
    /// being submission through a provider.
    pub fn calldata(&self, coder: &ManifestCoder, args: &[Value]) -> Result<Vec<u8>, CoderError> {
        coder.encode_field_arguments(self.accepts(), args, &format!("routine '{}'", self.name()))
    }

    /// Decodes this routine's output payload; `None` for the empty payload.
    pub fn decode_result(&self, coder: &ManifestCoder, data: &str) -> Result<Option<Value>, CoderError> {
        coder.decode_field_output(self.returns(), data, &format!("routine '{}'", self.name()))
    }
}

/// Exception reported by a logic routine: the error class, the message, and the call-stack trace
/// in call order.
#[derive(Clone, Eq, PartialEq, Debug, Display, Serialize, Deserialize)]
#[display("{class}: {data}")]
pub struct LogicException {
    pub class: String,
    pub data: String,
    pub trace: Vec<String>,
}

/// Error of the manifest coder.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
pub enum CoderError {
    #[display("routine '{0}' is not defined by the manifest")]
    RoutineNotFound(String),

    #[display("event '{0}' is not defined by the manifest")]
    EventNotFound(String),

    #[display("field '{0}' is not part of the state layout")]
    StateFieldNotFound(String),

    /// Positional arguments must match the accepted field count exactly.
    #[display("{context} accepts {expected} arguments, {found} given")]
    ArityMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    /// An argument failed to encode under its field's schema.
    #[display("argument '{label}': {error}")]
    Argument { label: String, error: polo::EncodeError },

    #[from]
    #[display(inner)]
    Schema(SchemaError),

    #[from]
    #[display(inner)]
    Encode(polo::EncodeError),

    #[from]
    #[display(inner)]
    Decode(polo::DecodeError),

    #[from]
    #[display(inner)]
    Hex(hex::Error),

    #[display("manifest payload is malformed at '{0}'")]
    MalformedManifest(String),

    #[display("exception payload does not carry class, data and trace")]
    MalformedException,
}

fn malformed(context: &str) -> CoderError { CoderError::MalformedManifest(context.to_owned()) }

fn get_str(value: &Value, label: &str) -> Result<String, CoderError> {
    value.field(label).and_then(Value::as_str).map(str::to_owned).ok_or(malformed(label))
}

fn get_uint(value: &Value, label: &str) -> Result<u128, CoderError> {
    value.field(label).and_then(Value::as_uint).ok_or(malformed(label))
}

fn get_bool(value: &Value, label: &str) -> Result<bool, CoderError> {
    value.field(label).and_then(Value::as_bool).ok_or(malformed(label))
}

fn get_bytes<'v>(value: &'v Value, label: &str) -> Result<&'v [u8], CoderError> {
    value.field(label).and_then(Value::as_bytes).ok_or(malformed(label))
}

fn get_list<'v>(value: &'v Value, label: &str) -> Result<&'v [Value], CoderError> {
    value.field(label).and_then(Value::as_list).ok_or(malformed(label))
}

fn get_strings(value: &Value, label: &str) -> Result<Vec<String>, CoderError> {
    get_list(value, label)?
        .iter()
        .map(|item| item.as_str().map(str::to_owned).ok_or(malformed(label)))
        .collect()
}

// The fixed schemas of the manifest's own shape

fn field_schema() -> Schema {
    Schema::structure([("slot", Schema::Integer), ("label", Schema::Str), ("type", Schema::Str)])
}

fn fields_schema() -> Schema { Schema::list(field_schema()) }

fn manifest_schema() -> Schema {
    Schema::structure([
        ("syntax", Schema::Integer),
        ("engine", Schema::structure([("kind", Schema::Str), ("flags", Schema::list(Schema::Str))])),
        ("elements", Schema::list(Schema::structure([
            ("ptr", Schema::Integer),
            ("parent", Schema::Integer),
            ("kind", Schema::Str),
            ("deps", Schema::list(Schema::Integer)),
            ("data", Schema::Bytes),
        ]))),
    ])
}

fn exception_schema() -> Schema {
    Schema::structure([("class", Schema::Str), ("data", Schema::Str), ("trace", Schema::list(Schema::Str))])
}

fn typedef_schema() -> Schema { Schema::structure([("name", Schema::Str), ("type", Schema::Str)]) }

fn constant_schema() -> Schema { Schema::structure([("type", Schema::Str), ("value", Schema::Bytes)]) }

fn class_schema() -> Schema { Schema::structure([("name", Schema::Str), ("fields", fields_schema())]) }

fn state_schema() -> Schema { Schema::structure([("mode", Schema::Str), ("fields", fields_schema())]) }

fn routine_schema() -> Schema {
    Schema::structure([
        ("name", Schema::Str),
        ("kind", Schema::Str),
        ("mutable", Schema::Bool),
        ("accepts", fields_schema()),
        ("returns", fields_schema()),
        ("catches", Schema::list(Schema::Str)),
    ])
}

fn method_schema() -> Schema {
    Schema::structure([
        ("name", Schema::Str),
        ("class", Schema::Integer),
        ("accepts", fields_schema()),
        ("returns", fields_schema()),
    ])
}

fn event_schema() -> Schema {
    Schema::structure([("name", Schema::Str), ("topics", Schema::Integer), ("fields", fields_schema())])
}

fn fields_value(fields: &[TypeField]) -> Value {
    Value::list(fields.iter().map(|field| {
        Value::structure([
            ("slot", Value::from(field.slot)),
            ("label", Value::from(field.label.as_str())),
            ("type", Value::from(field.type_name.as_str())),
        ])
    }))
}

fn decode_fields(value: &Value, label: &str) -> Result<Vec<TypeField>, CoderError> {
    get_list(value, label)?
        .iter()
        .map(|field| {
            Ok(TypeField {
                slot: get_uint(field, "slot")? as u64,
                label: get_str(field, "label")?,
                type_name: get_str(field, "type")?,
            })
        })
        .collect()
}

fn element_data_value(body: &ElementBody) -> Result<(Value, Schema), CoderError> {
    Ok(match body {
        ElementBody::Constant(def) => (
            Value::structure([
                ("type", Value::from(def.type_name.as_str())),
                ("value", Value::from(decode_hex(&def.value)?)),
            ]),
            constant_schema(),
        ),
        ElementBody::Typedef(def) => (
            Value::structure([
                ("name", Value::from(def.name.as_str())),
                ("type", Value::from(def.type_name.as_str())),
            ]),
            typedef_schema(),
        ),
        ElementBody::Class(def) => (
            Value::structure([("name", Value::from(def.name.as_str())), ("fields", fields_value(&def.fields))]),
            class_schema(),
        ),
        ElementBody::State(def) => (
            Value::structure([
                ("mode", Value::from(def.mode.to_string())),
                ("fields", fields_value(&def.fields)),
            ]),
            state_schema(),
        ),
        ElementBody::Routine(def) => (
            Value::structure([
                ("name", Value::from(def.name.as_str())),
                ("kind", Value::from(def.kind.to_string())),
                ("mutable", Value::from(def.mutable)),
                ("accepts", fields_value(&def.accepts)),
                ("returns", fields_value(&def.returns)),
                ("catches", Value::list(def.catches.iter().map(|name| Value::from(name.as_str())))),
            ]),
            routine_schema(),
        ),
        ElementBody::Method(def) => (
            Value::structure([
                ("name", Value::from(def.name.as_str())),
                ("class", Value::from(def.class)),
                ("accepts", fields_value(&def.accepts)),
                ("returns", fields_value(&def.returns)),
            ]),
            method_schema(),
        ),
        ElementBody::Event(def) => (
            Value::structure([
                ("name", Value::from(def.name.as_str())),
                ("topics", Value::from(def.topics)),
                ("fields", fields_value(&def.fields)),
            ]),
            event_schema(),
        ),
    })
}

fn decode_element(element: &Value) -> Result<Element, CoderError> {
    let kind = get_str(element, "kind")?;
    let data = get_bytes(element, "data")?;
    let body = match kind.as_str() {
        "constant" => {
            let value = polo::deserialize(data, &constant_schema())?;
            ElementBody::Constant(ConstantDef {
                type_name: get_str(&value, "type")?,
                value: crate::util::encode_hex(get_bytes(&value, "value")?),
            })
        }
        "typedef" => {
            let value = polo::deserialize(data, &typedef_schema())?;
            ElementBody::Typedef(TypedefDef {
                name: get_str(&value, "name")?,
                type_name: get_str(&value, "type")?,
            })
        }
        "class" => {
            let value = polo::deserialize(data, &class_schema())?;
            ElementBody::Class(ClassDef {
                name: get_str(&value, "name")?,
                fields: decode_fields(&value, "fields")?,
            })
        }
        "state" => {
            let value = polo::deserialize(data, &state_schema())?;
            let mode = match get_str(&value, "mode")?.as_str() {
                "persistent" => StateMode::Persistent,
                "ephemeral" => StateMode::Ephemeral,
                _ => return Err(malformed("state.mode")),
            };
            ElementBody::State(StateDef {
                mode,
                fields: decode_fields(&value, "fields")?,
            })
        }
        "routine" => {
            let value = polo::deserialize(data, &routine_schema())?;
            let kind = match get_str(&value, "kind")?.as_str() {
                "invoke" => RoutineKind::Invoke,
                "deploy" => RoutineKind::Deploy,
                "enlist" => RoutineKind::Enlist,
                _ => return Err(malformed("routine.kind")),
            };
            ElementBody::Routine(RoutineDef {
                name: get_str(&value, "name")?,
                kind,
                mutable: get_bool(&value, "mutable")?,
                accepts: decode_fields(&value, "accepts")?,
                returns: decode_fields(&value, "returns")?,
                catches: get_strings(&value, "catches")?,
            })
        }
        "method" => {
            let value = polo::deserialize(data, &method_schema())?;
            ElementBody::Method(MethodDef {
                name: get_str(&value, "name")?,
                class: get_uint(&value, "class")? as u64,
                accepts: decode_fields(&value, "accepts")?,
                returns: decode_fields(&value, "returns")?,
            })
        }
        "event" => {
            let value = polo::deserialize(data, &event_schema())?;
            ElementBody::Event(EventDef {
                name: get_str(&value, "name")?,
                topics: get_uint(&value, "topics")? as u32,
                fields: decode_fields(&value, "fields")?,
            })
        }
        _ => return Err(malformed("element.kind")),
    };
    Ok(Element {
        ptr: get_uint(element, "ptr")? as u64,
        parent: match element.field("parent") {
            Some(Value::Null) | None => None,
            Some(value) => Some(value.as_uint().ok_or(malformed("element.parent"))? as u64),
        },
        deps: get_list(element, "deps")?
            .iter()
            .map(|dep| dep.as_uint().map(|dep| dep as u64).ok_or(malformed("element.deps")))
            .collect::<Result<_, _>>()?,
        body,
    })
}
