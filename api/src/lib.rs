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

//! Data representation layer of the MOI client SDK: tagged identifiers, the logic manifest model,
//! schema construction from manifest type strings, the manifest coder, and storage key derivation.
//!
//! Everything in this crate is synchronous, pure computation over immutable inputs. A manifest is
//! loaded once (from a file or from RPC), wrapped into a [`Logic`] index, and read many times; the
//! only shared state is the [`SchemaCache`] memoizing resolved type schemas per logic.

#![deny(
    unsafe_code,
    dead_code,
    unused_variables,
    unused_mut,
    unused_imports,
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case
)]

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate serde;

mod util;
mod identifier;
mod manifest;
mod schema;
mod coder;
mod storage;

pub use coder::{CoderError, LogicException, ManifestCoder};
pub use identifier::{
    AssetId, IdError, IdKind, IdTag, Identifier, LogicId, ParticipantId, FLAG_AUXILIARY, FLAG_LOGICAL, FLAG_STATEFUL,
    FLAG_SYSTEMIC, ID_LENGTH,
};
pub use manifest::{
    ClassDef, ConstantDef, Element, ElementBody, Engine, EngineKind, EventDef, Logic, Manifest, ManifestError,
    MethodDef, Routine, RoutineDef, RoutineKind, StateDef, StateMode, TypeField, TypedefDef,
};
pub use schema::{SchemaBuilder, SchemaCache, SchemaError};
pub use storage::{Accessor, StorageError, StorageKey, StorageKeyBuilder};
pub use util::{decode_hex, encode_hex, is_empty_payload, EMPTY_PAYLOAD};
