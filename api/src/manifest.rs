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

//! Declarative description of a logic module: its engine, types, state layout, routines and
//! events.
//!
//! A [`Manifest`] is plain data parsed from JSON. A [`Logic`] wraps it with name and pointer
//! lookup tables built once at load, verifying on the way that every pointer is unique, every name
//! unambiguous, and every type string resolves to primitives.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use indexmap::IndexMap;

use crate::schema::{SchemaBuilder, SchemaCache, SchemaError};

/// Manifest of a logic module: the unit shipped on deployment and returned by the network when a
/// deployed logic is queried. Immutable once loaded.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Manifest {
    /// Version of the manifest format itself.
    pub syntax: u32,
    pub engine: Engine,
    pub elements: Vec<Element>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, ManifestError> { Ok(serde_json::from_str(json)?) }
}

/// Execution engine the logic targets.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Engine {
    pub kind: EngineKind,
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize, Deserialize)]
pub enum EngineKind {
    #[display("PISA")]
    #[serde(rename = "PISA")]
    Pisa,

    #[display("MERU")]
    #[serde(rename = "MERU")]
    Meru,
}

/// A single manifest element. The pointer is the stable addressing unit: routines, state matrices
/// and class references all refer to elements by `ptr`.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Element {
    pub ptr: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<u64>,
    #[serde(flatten)]
    pub body: ElementBody,
}

/// Kind-specific payload of an element.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ElementBody {
    Constant(ConstantDef),
    Typedef(TypedefDef),
    Class(ClassDef),
    State(StateDef),
    Routine(RoutineDef),
    Method(MethodDef),
    Event(EventDef),
}

impl ElementBody {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            ElementBody::Constant(_) => "constant",
            ElementBody::Typedef(_) => "typedef",
            ElementBody::Class(_) => "class",
            ElementBody::State(_) => "state",
            ElementBody::Routine(_) => "routine",
            ElementBody::Method(_) => "method",
            ElementBody::Event(_) => "event",
        }
    }
}

/// A typed, slotted field: the building block of class layouts, state matrices and routine
/// signatures. The `type` string is a primitive name, a composite expression (`array(T)`,
/// `map(K,V)`) or a typedef/class name resolved against the manifest.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct TypeField {
    pub slot: u64,
    pub label: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Type alias: occurrences of `name` in type strings resolve to `type`. Aliases may chain, but
/// must terminate; self-referential aliases are rejected when the manifest is indexed.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct TypedefDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Compile-time constant: a type string plus the hex of the POLO-encoded value.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConstantDef {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub fields: Vec<TypeField>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct StateDef {
    pub mode: StateMode,
    pub fields: Vec<TypeField>,
}

/// The two storage regions of a logic.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMode {
    #[display("persistent")]
    Persistent,

    #[display("ephemeral")]
    Ephemeral,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct RoutineDef {
    pub name: String,
    pub kind: RoutineKind,
    #[serde(default)]
    pub mutable: bool,
    #[serde(default)]
    pub accepts: Vec<TypeField>,
    #[serde(default)]
    pub returns: Vec<TypeField>,
    #[serde(default)]
    pub catches: Vec<String>,
}

/// How a routine is reached: through a logic invocation, at deployment, or on enlistment.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineKind {
    #[display("invoke")]
    Invoke,

    #[display("deploy")]
    Deploy,

    #[display("enlist")]
    Enlist,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    /// Pointer of the class element the method belongs to.
    pub class: u64,
    #[serde(default)]
    pub accepts: Vec<TypeField>,
    #[serde(default)]
    pub returns: Vec<TypeField>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct EventDef {
    pub name: String,
    pub topics: u32,
    #[serde(default)]
    pub fields: Vec<TypeField>,
}

/// Error of loading or indexing a manifest. These are definitional: they are fatal, surfaced
/// immediately, and never retried.
#[derive(Debug, Display, Error, From)]
pub enum ManifestError {
    #[from]
    #[display(inner)]
    Json(serde_json::Error),

    #[from]
    #[display(inner)]
    Io(io::Error),

    #[display("element pointer {0} is used more than once")]
    DuplicatePointer(u64),

    #[display("{kind} name '{name}' is defined more than once")]
    DuplicateName { kind: &'static str, name: String },

    #[display("{0} state is declared more than once")]
    DuplicateState(StateMode),

    #[from]
    #[display(inner)]
    Schema(SchemaError),
}

/// A manifest wrapped with its lookup tables, the form consumed by the coder and the storage key
/// builder.
#[derive(Debug)]
pub struct Logic {
    manifest: Manifest,
    by_ptr: HashMap<u64, usize>,
    routines: IndexMap<String, usize>,
    classes: IndexMap<String, usize>,
    typedefs: IndexMap<String, usize>,
    events: IndexMap<String, usize>,
    persistent: Option<usize>,
    ephemeral: Option<usize>,
}

impl Logic {
    /// Indexes a manifest and verifies its definitions: unique pointers, unambiguous names, and
    /// every type string resolving transitively to primitives (cyclic definitions are rejected
    /// here, not looped over later).
    pub fn with(manifest: Manifest) -> Result<Self, ManifestError> {
        let mut by_ptr = HashMap::new();
        let mut routines = IndexMap::new();
        let mut classes = IndexMap::new();
        let mut typedefs = IndexMap::new();
        let mut events = IndexMap::new();
        let mut persistent = None;
        let mut ephemeral = None;

        for (no, element) in manifest.elements.iter().enumerate() {
            if by_ptr.insert(element.ptr, no).is_some() {
                return Err(ManifestError::DuplicatePointer(element.ptr));
            }
            let kind = element.body.kind_name();
            let (table, name) = match &element.body {
                ElementBody::Routine(def) => (&mut routines, def.name.clone()),
                ElementBody::Class(def) => (&mut classes, def.name.clone()),
                ElementBody::Event(def) => (&mut events, def.name.clone()),
                ElementBody::Typedef(def) => (&mut typedefs, def.name.clone()),
                ElementBody::State(def) => {
                    let slot = match def.mode {
                        StateMode::Persistent => &mut persistent,
                        StateMode::Ephemeral => &mut ephemeral,
                    };
                    if slot.replace(no).is_some() {
                        return Err(ManifestError::DuplicateState(def.mode));
                    }
                    continue;
                }
                ElementBody::Constant(_) | ElementBody::Method(_) => continue,
            };
            if table.insert(name.clone(), no).is_some() {
                return Err(ManifestError::DuplicateName { kind, name });
            }
        }

        let logic = Logic {
            manifest,
            by_ptr,
            routines,
            classes,
            typedefs,
            events,
            persistent,
            ephemeral,
        };
        logic.verify_types()?;
        Ok(logic)
    }

    pub fn from_json(json: &str) -> Result<Self, ManifestError> { Self::with(Manifest::from_json(json)?) }

    /// Loads a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn manifest(&self) -> &Manifest { &self.manifest }

    pub fn engine(&self) -> &Engine { &self.manifest.engine }

    pub fn element(&self, ptr: u64) -> Option<&Element> {
        self.by_ptr.get(&ptr).map(|no| &self.manifest.elements[*no])
    }

    pub fn routine(&self, name: &str) -> Option<Routine<'_>> {
        let no = *self.routines.get(name)?;
        let element = &self.manifest.elements[no];
        match &element.body {
            ElementBody::Routine(def) => Some(Routine { ptr: element.ptr, def }),
            _ => None,
        }
    }

    pub fn routines(&self) -> impl Iterator<Item = Routine<'_>> {
        self.routines.values().filter_map(|no| {
            let element = &self.manifest.elements[*no];
            match &element.body {
                ElementBody::Routine(def) => Some(Routine { ptr: element.ptr, def }),
                _ => None,
            }
        })
    }

    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        let no = *self.classes.get(name)?;
        match &self.manifest.elements[no].body {
            ElementBody::Class(def) => Some(def),
            _ => None,
        }
    }

    /// The alias target of a typedef, if a typedef with this alias name exists.
    pub fn typedef(&self, name: &str) -> Option<&str> {
        let no = *self.typedefs.get(name)?;
        match &self.manifest.elements[no].body {
            ElementBody::Typedef(def) => Some(&def.type_name),
            _ => None,
        }
    }

    pub fn event(&self, name: &str) -> Option<&EventDef> {
        let no = *self.events.get(name)?;
        match &self.manifest.elements[no].body {
            ElementBody::Event(def) => Some(def),
            _ => None,
        }
    }

    /// The state matrix of the given mode with the pointer of its element (the storage base
    /// slot), if the logic declares one.
    pub fn state(&self, mode: StateMode) -> Option<(u64, &StateDef)> {
        let no = match mode {
            StateMode::Persistent => self.persistent?,
            StateMode::Ephemeral => self.ephemeral?,
        };
        let element = &self.manifest.elements[no];
        match &element.body {
            ElementBody::State(def) => Some((element.ptr, def)),
            _ => None,
        }
    }

    fn verify_types(&self) -> Result<(), SchemaError> {
        let cache = SchemaCache::new();
        let builder = SchemaBuilder::new(self, &cache);
        for element in &self.manifest.elements {
            match &element.body {
                ElementBody::Constant(def) => {
                    builder.resolve(&def.type_name, "constant")?;
                }
                ElementBody::Class(def) => {
                    builder.fields_schema(&def.fields, &format!("class '{}'", def.name))?;
                }
                ElementBody::State(def) => {
                    builder.fields_schema(&def.fields, &format!("{} state", def.mode))?;
                }
                ElementBody::Routine(def) => {
                    let context = format!("routine '{}'", def.name);
                    builder.fields_schema(&def.accepts, &context)?;
                    builder.fields_schema(&def.returns, &context)?;
                }
                ElementBody::Method(def) => {
                    let context = format!("method '{}'", def.name);
                    builder.fields_schema(&def.accepts, &context)?;
                    builder.fields_schema(&def.returns, &context)?;
                }
                ElementBody::Event(def) => {
                    builder.fields_schema(&def.fields, &format!("event '{}'", def.name))?;
                }
                ElementBody::Typedef(def) => {
                    builder.resolve(&def.type_name, &format!("typedef '{}'", def.name))?;
                }
            }
        }
        Ok(())
    }
}

/// A named, typed entry point into a logic.
///
/// The callable surface is explicit data: callers inspect the accepted and returned fields, check
/// mutability, and produce calldata through the coder. Nothing is synthesized at runtime.
#[derive(Copy, Clone, Debug)]
pub struct Routine<'a> {
    ptr: u64,
    def: &'a RoutineDef,
}

impl<'a> Routine<'a> {
    pub fn ptr(&self) -> u64 { self.ptr }

    pub fn name(&self) -> &'a str { &self.def.name }

    pub fn kind(&self) -> RoutineKind { self.def.kind }

    /// Whether invoking the routine may change logic state.
    pub fn is_mutable(&self) -> bool { self.def.mutable }

    pub fn accepts(&self) -> &'a [TypeField] { &self.def.accepts }

    pub fn returns(&self) -> &'a [TypeField] { &self.def.returns }

    pub fn catches(&self) -> &'a [String] { &self.def.catches }
}
