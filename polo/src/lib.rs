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

//! POLO is the self-describing binary serialization format used on the MOI wire.
//!
//! Every encoded atom starts with a wire-type tag. Compound values (packs and documents) carry a
//! _load_: a head of `(offset, wire-type)` varint entries followed by the concatenated payloads,
//! which makes the format navigable without a schema. Schemas ([`Schema`]) are still required to
//! interpret payloads into structured values ([`Value`]): the wire carries no field labels and no
//! integer widths.
//!
//! Encoding is deterministic: map keys and document labels are emitted in ascending order, and
//! integers use their minimal big-endian form. Two equal values under the same schema always
//! produce byte-identical output.

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

mod wire;
mod value;
mod schema;
mod encode;
mod decode;
mod document;

pub use decode::{deserialize, DecodeError};
pub use document::Document;
pub use encode::{serialize, EncodeError};
pub use schema::Schema;
pub use value::Value;
pub use wire::{UnknownWire, VarintError, WireType};
