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

//! Client SDK for the MOI network.
//!
//! The data representation core lives in the member crates, re-exported here: `moi-polo` (the
//! POLO wire format), `moi-api` (identifiers, manifests, the ABI coder, storage keys) and
//! `moi-ixreq` (operations and interaction envelopes). This crate layers the thin orchestration
//! on top: signing interactions, talking JSON-RPC through an opaque [`Transport`], and the
//! keystore file model of the wallet collaborator.

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

pub use ixreq::*;
pub use moiapi::*;
pub use polo::{Document, Schema, Value};

mod signer;
mod provider;
mod wallet;

pub use provider::{IxReceipt, Provider, ProviderError, RetryPolicy, RpcError, Simulation, Transport};
pub use signer::{
    ix_digest, sign_interaction, IxSignature, SigAlgo, SignError, Signature, SignedInteraction, Signer, SignerError,
};
pub use wallet::{CipherParams, KdfParams, Keystore, KeystoreError};
