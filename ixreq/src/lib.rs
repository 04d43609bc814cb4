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

//! Interaction requests: the typed operations an interaction may carry, their wire descriptors,
//! and the assembly of a full interaction envelope ready for signing.
//!
//! Each operation type owns a schema, a pure validator and a wire transform, collected in an
//! [`OpRegistry`] that is constructed once and passed by reference - multiple registries (say,
//! for different protocol versions) can coexist in one process.

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

mod op;
mod registry;
mod ix;

pub use ix::{
    ConsensusPreference, Fund, InteractionRequest, IxError, IxParticipant, LockType, Preferences, Sender,
};
pub use op::{
    AssetApprove, AssetBurn, AssetCreate, AssetMint, AssetTransfer, KeyConfig, LogicDeploy, LogicEnlist, LogicInvoke,
    LogicPayload, OpType, Operation, ParticipantCreate, UnknownOpType, Violation,
};
pub use registry::{OpDescriptor, OpError, OpRegistry};
