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

//! Typed operation payloads and their pure validators and wire transforms.
//!
//! Validators never panic: they return the first violated field as a [`Violation`] or nothing.
//! Wire transforms normalize user-facing payloads into the value shapes the schemas encode
//! (identifiers to bytes, timestamps to epoch seconds, absent optionals to null) and always run
//! before schema application.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use moiapi::{AssetId, Identifier, LogicId, ParticipantId};
use polo::Value;

/// Operation type of the tagged payload union, with its wire code.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum OpType {
    #[display("participant.create")]
    ParticipantCreate = 1,

    #[display("asset.transfer")]
    AssetTransfer = 2,

    #[display("asset.create")]
    AssetCreate = 3,

    #[display("asset.approve")]
    AssetApprove = 4,

    #[display("asset.mint")]
    AssetMint = 5,

    #[display("asset.burn")]
    AssetBurn = 6,

    #[display("logic.deploy")]
    LogicDeploy = 7,

    #[display("logic.invoke")]
    LogicInvoke = 8,

    #[display("logic.enlist")]
    LogicEnlist = 9,
}

impl OpType {
    pub const ALL: [OpType; 9] = [
        OpType::ParticipantCreate,
        OpType::AssetTransfer,
        OpType::AssetCreate,
        OpType::AssetApprove,
        OpType::AssetMint,
        OpType::AssetBurn,
        OpType::LogicDeploy,
        OpType::LogicInvoke,
        OpType::LogicEnlist,
    ];

    pub const fn code(self) -> u16 { self as u16 }

    pub fn from_code(code: u16) -> Result<Self, UnknownOpType> {
        Self::ALL.into_iter().find(|ty| ty.code() == code).ok_or(UnknownOpType(code))
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("unknown operation type code {0}")]
pub struct UnknownOpType(pub u16);

/// First violated field of an operation or interaction payload, reported by a validator.
#[derive(Clone, Eq, PartialEq, Debug, Display, Serialize, Deserialize)]
#[display("{field}: {message} (value: {value})")]
pub struct Violation {
    pub field: String,
    pub message: String,
    pub value: String,
}

impl Violation {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>, value: impl ToString) -> Self {
        Violation {
            field: field.into(),
            message: message.into(),
            value: value.to_string(),
        }
    }

    /// Prefixes the field path, producing qualified paths like `operations[2].symbol`.
    pub(crate) fn nested(mut self, prefix: &str) -> Self {
        self.field = format!("{prefix}.{}", self.field);
        self
    }
}

/// One typed action within an interaction.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Operation {
    ParticipantCreate(ParticipantCreate),
    AssetTransfer(AssetTransfer),
    AssetCreate(AssetCreate),
    AssetApprove(AssetApprove),
    AssetMint(AssetMint),
    AssetBurn(AssetBurn),
    LogicDeploy(LogicDeploy),
    LogicInvoke(LogicInvoke),
    LogicEnlist(LogicEnlist),
}

impl Operation {
    pub const fn op_type(&self) -> OpType {
        match self {
            Operation::ParticipantCreate(_) => OpType::ParticipantCreate,
            Operation::AssetTransfer(_) => OpType::AssetTransfer,
            Operation::AssetCreate(_) => OpType::AssetCreate,
            Operation::AssetApprove(_) => OpType::AssetApprove,
            Operation::AssetMint(_) => OpType::AssetMint,
            Operation::AssetBurn(_) => OpType::AssetBurn,
            Operation::LogicDeploy(_) => OpType::LogicDeploy,
            Operation::LogicInvoke(_) => OpType::LogicInvoke,
            Operation::LogicEnlist(_) => OpType::LogicEnlist,
        }
    }

    /// The first violated field of the payload, or nothing. Pure: same payload, same result.
    pub fn validate(&self) -> Option<Violation> {
        match self {
            Operation::ParticipantCreate(op) => op.validate(),
            Operation::AssetTransfer(op) => op.validate(),
            Operation::AssetCreate(op) => op.validate(),
            Operation::AssetApprove(op) => op.validate(),
            Operation::AssetMint(op) => op.validate(),
            Operation::AssetBurn(op) => op.validate(),
            Operation::LogicDeploy(op) => op.validate(),
            Operation::LogicInvoke(op) => op.validate(),
            Operation::LogicEnlist(op) => op.validate(),
        }
    }

    /// The wire-ready value of the payload; fed into the descriptor's schema afterwards.
    pub(crate) fn to_wire(&self) -> Value {
        match self {
            Operation::ParticipantCreate(op) => op.to_wire(),
            Operation::AssetTransfer(op) => op.to_wire(),
            Operation::AssetCreate(op) => op.to_wire(),
            Operation::AssetApprove(op) => op.to_wire(),
            Operation::AssetMint(op) => op.to_wire(),
            Operation::AssetBurn(op) => op.to_wire(),
            Operation::LogicDeploy(op) => op.to_wire(),
            Operation::LogicInvoke(op) => op.to_wire(),
            Operation::LogicEnlist(op) => op.to_wire(),
        }
    }

    /// Addresses the operation structurally touches, in payload order. Used when gathering the
    /// implicit participant list of an interaction.
    pub(crate) fn touched(&self) -> Vec<Identifier> {
        match self {
            Operation::ParticipantCreate(op) => vec![(*op.address).into()],
            Operation::AssetTransfer(op) => vec![(*op.beneficiary).into()],
            Operation::AssetApprove(op) => vec![(*op.beneficiary).into()],
            Operation::AssetMint(op) => vec![(*op.asset_id).into()],
            Operation::AssetBurn(op) => vec![(*op.asset_id).into()],
            Operation::LogicInvoke(op) => vec![(*op.logic_id).into()],
            Operation::LogicEnlist(op) => vec![(*op.logic_id).into()],
            Operation::AssetCreate(_) | Operation::LogicDeploy(_) => vec![],
        }
    }

    /// The asset movement the operation implies, if any. Used when gathering interaction funds.
    pub(crate) fn fund(&self) -> Option<(AssetId, u128)> {
        match self {
            Operation::AssetTransfer(op) => Some((op.asset_id, op.amount)),
            Operation::AssetApprove(op) => Some((op.asset_id, op.amount)),
            Operation::AssetMint(op) => Some((op.asset_id, op.amount)),
            Operation::AssetBurn(op) => Some((op.asset_id, op.amount)),
            _ => None,
        }
    }
}

/// Registers a new participant account.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ParticipantCreate {
    pub address: ParticipantId,
    pub amount: u128,
    #[serde(default)]
    pub keys: Vec<KeyConfig>,
}

/// A key enrolled for a new participant.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct KeyConfig {
    pub public_key: Vec<u8>,
    pub weight: u32,
    pub algorithm: u8,
}

impl ParticipantCreate {
    fn validate(&self) -> Option<Violation> {
        self.keys
            .iter()
            .position(|key| key.public_key.is_empty())
            .map(|no| Violation::new(format!("keys[{no}].public_key"), "public key must not be empty", "0x"))
    }

    fn to_wire(&self) -> Value {
        Value::structure([
            ("address", Value::from(self.address.to_byte_array().to_vec())),
            ("amount", Value::from(self.amount)),
            ("keys", Value::list(self.keys.iter().map(|key| {
                Value::structure([
                    ("public_key", Value::from(key.public_key.clone())),
                    ("weight", Value::from(key.weight)),
                    ("algorithm", Value::from(key.algorithm)),
                ])
            }))),
        ])
    }
}

/// Creates a new asset.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct AssetCreate {
    pub symbol: String,
    pub supply: u128,
    /// Asset standard enumerant (mirrored into the metadata bytes of the asset identifier).
    pub standard: u16,
    #[serde(default)]
    pub dimension: u32,
    #[serde(default)]
    pub is_stateful: bool,
    #[serde(default)]
    pub is_logical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<LogicPayload>,
}

impl AssetCreate {
    fn validate(&self) -> Option<Violation> {
        if self.symbol.is_empty() {
            return Some(Violation::new("symbol", "symbol must not be empty", "\"\""));
        }
        if self.symbol.chars().any(char::is_whitespace) {
            return Some(Violation::new("symbol", "symbol must not contain whitespace", &self.symbol));
        }
        if self.is_logical && self.logic.is_none() {
            return Some(Violation::new("logic", "logical assets require a logic payload", "null"));
        }
        None
    }

    fn to_wire(&self) -> Value {
        Value::structure([
            ("symbol", Value::from(self.symbol.as_str())),
            ("supply", Value::from(self.supply)),
            ("standard", Value::from(self.standard)),
            ("dimension", Value::from(self.dimension)),
            ("is_stateful", Value::from(self.is_stateful)),
            ("is_logical", Value::from(self.is_logical)),
            ("logic", self.logic.as_ref().map(LogicPayload::to_wire).unwrap_or(Value::Null)),
        ])
    }
}

/// Transfers asset units to a beneficiary.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct AssetTransfer {
    pub asset_id: AssetId,
    pub beneficiary: ParticipantId,
    pub amount: u128,
}

impl AssetTransfer {
    fn validate(&self) -> Option<Violation> {
        if self.amount == 0 {
            return Some(Violation::new("amount", "transfer amount must be positive", self.amount));
        }
        None
    }

    fn to_wire(&self) -> Value { asset_movement_wire(&self.asset_id, Some(&self.beneficiary), self.amount, None) }
}

/// Approves a beneficiary to spend asset units until a deadline.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct AssetApprove {
    pub asset_id: AssetId,
    pub beneficiary: ParticipantId,
    pub amount: u128,
    /// Expiry of the approval. Required: the validator rejects approvals without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl AssetApprove {
    fn validate(&self) -> Option<Violation> {
        if self.timestamp.is_none() {
            return Some(Violation::new("timestamp", "approve requires a timestamp", "null"));
        }
        None
    }

    fn to_wire(&self) -> Value {
        asset_movement_wire(&self.asset_id, Some(&self.beneficiary), self.amount, Some(
            self.timestamp.map(|ts| Value::from(ts.timestamp())).unwrap_or(Value::Null),
        ))
    }
}

/// Mints new units of an asset.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct AssetMint {
    pub asset_id: AssetId,
    pub amount: u128,
}

impl AssetMint {
    fn validate(&self) -> Option<Violation> {
        if self.amount == 0 {
            return Some(Violation::new("amount", "mint amount must be positive", self.amount));
        }
        None
    }

    fn to_wire(&self) -> Value { asset_movement_wire(&self.asset_id, None, self.amount, None) }
}

/// Burns units of an asset.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct AssetBurn {
    pub asset_id: AssetId,
    pub amount: u128,
}

impl AssetBurn {
    fn validate(&self) -> Option<Violation> {
        if self.amount == 0 {
            return Some(Violation::new("amount", "burn amount must be positive", self.amount));
        }
        None
    }

    fn to_wire(&self) -> Value { asset_movement_wire(&self.asset_id, None, self.amount, None) }
}

/// Call payload shared by deployment and invocation forms.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct LogicPayload {
    /// POLO-encoded manifest bytes.
    pub manifest: Vec<u8>,
    pub callsite: String,
    #[serde(default)]
    pub calldata: Vec<u8>,
}

impl LogicPayload {
    fn to_wire(&self) -> Value {
        Value::structure([
            ("manifest", Value::from(self.manifest.clone())),
            ("callsite", Value::from(self.callsite.as_str())),
            ("calldata", Value::from(self.calldata.clone())),
            ("interfaces", Value::Null),
        ])
    }
}

/// Deploys a new logic module.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct LogicDeploy {
    /// POLO-encoded manifest bytes. Required.
    pub manifest: Vec<u8>,
    pub callsite: String,
    #[serde(default)]
    pub calldata: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<BTreeMap<String, LogicId>>,
}

impl LogicDeploy {
    fn validate(&self) -> Option<Violation> {
        if self.manifest.is_empty() {
            return Some(Violation::new("manifest", "deploy requires a manifest", "0x"));
        }
        if self.callsite.is_empty() {
            return Some(Violation::new("callsite", "callsite must not be empty", "\"\""));
        }
        None
    }

    fn to_wire(&self) -> Value {
        Value::structure([
            ("manifest", Value::from(self.manifest.clone())),
            ("callsite", Value::from(self.callsite.as_str())),
            ("calldata", Value::from(self.calldata.clone())),
            ("interfaces", interfaces_wire(self.interfaces.as_ref())),
        ])
    }
}

/// Invokes a routine of a deployed logic.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct LogicInvoke {
    pub logic_id: LogicId,
    pub callsite: String,
    #[serde(default)]
    pub calldata: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<BTreeMap<String, LogicId>>,
}

impl LogicInvoke {
    fn validate(&self) -> Option<Violation> { callsite_violation(&self.callsite) }

    fn to_wire(&self) -> Value { logic_call_wire(&self.logic_id, &self.callsite, &self.calldata, self.interfaces.as_ref()) }
}

/// Enlists the sender into a deployed logic.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct LogicEnlist {
    pub logic_id: LogicId,
    pub callsite: String,
    #[serde(default)]
    pub calldata: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<BTreeMap<String, LogicId>>,
}

impl LogicEnlist {
    fn validate(&self) -> Option<Violation> { callsite_violation(&self.callsite) }

    fn to_wire(&self) -> Value { logic_call_wire(&self.logic_id, &self.callsite, &self.calldata, self.interfaces.as_ref()) }
}

fn callsite_violation(callsite: &str) -> Option<Violation> {
    if callsite.is_empty() {
        return Some(Violation::new("callsite", "callsite must not be empty", "\"\""));
    }
    None
}

fn asset_movement_wire(
    asset_id: &AssetId,
    beneficiary: Option<&ParticipantId>,
    amount: u128,
    timestamp: Option<Value>,
) -> Value {
    let mut fields = vec![("asset_id", Value::from(asset_id.to_byte_array().to_vec()))];
    if let Some(beneficiary) = beneficiary {
        fields.push(("beneficiary", Value::from(beneficiary.to_byte_array().to_vec())));
    }
    fields.push(("amount", Value::from(amount)));
    if let Some(timestamp) = timestamp {
        fields.push(("timestamp", timestamp));
    }
    Value::structure(fields)
}

fn logic_call_wire(
    logic_id: &LogicId,
    callsite: &str,
    calldata: &[u8],
    interfaces: Option<&BTreeMap<String, LogicId>>,
) -> Value {
    Value::structure([
        ("logic_id", Value::from(logic_id.to_byte_array().to_vec())),
        ("callsite", Value::from(callsite)),
        ("calldata", Value::from(calldata)),
        ("interfaces", interfaces_wire(interfaces)),
    ])
}

fn interfaces_wire(interfaces: Option<&BTreeMap<String, LogicId>>) -> Value {
    match interfaces {
        None => Value::Null,
        Some(map) => Value::map(map.iter().map(|(alias, id)| {
            (Value::from(alias.as_str()), Value::from(id.to_byte_array().to_vec()))
        })),
    }
}
