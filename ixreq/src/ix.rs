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

//! Assembly of a full interaction envelope: participant and fund gathering, per-operation
//! encoding, the fixed top-level schema, and the structural validation pass run before signing.

use moiapi::{AssetId, Identifier, ParticipantId};
use polo::{Schema, Value};

use crate::op::{Operation, Violation};
use crate::registry::{OpError, OpRegistry};

/// Originator of an interaction.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Sender {
    pub address: ParticipantId,
    pub sequence_id: u64,
    pub key_id: u64,
}

/// An asset amount escrowed by the interaction.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Fund {
    pub asset_id: AssetId,
    pub amount: u128,
}

/// How a participant's account state is locked for the duration of the interaction.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LockType {
    #[display("mutate")]
    Mutate = 0,

    #[display("read")]
    Read = 1,

    #[display("none")]
    NoLock = 2,
}

/// A participant whose state the interaction touches.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct IxParticipant {
    pub address: Identifier,
    pub lock_type: LockType,
    #[serde(default)]
    pub notary: bool,
}

impl IxParticipant {
    fn mutating(address: Identifier) -> Self {
        IxParticipant {
            address,
            lock_type: LockType::Mutate,
            notary: false,
        }
    }
}

/// Consensus-side preferences of an interaction.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct ConsensusPreference {
    pub mtq: u64,
    #[serde(default)]
    pub trust_nodes: Vec<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub compute: Vec<u8>,
    #[serde(default)]
    pub consensus: ConsensusPreference,
}

/// An unsigned interaction: one or more operations plus the fuel and participant envelope.
///
/// Constructed per call, serialized once, discarded after submission.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct InteractionRequest {
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<ParticipantId>,
    pub fuel_price: u128,
    pub fuel_limit: u128,
    #[serde(default)]
    pub funds: Vec<Fund>,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub participants: Vec<IxParticipant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perception: Option<Vec<u8>>,
}

impl InteractionRequest {
    pub fn new(sender: Sender, fuel_price: u128, fuel_limit: u128) -> Self {
        InteractionRequest {
            sender,
            payer: None,
            fuel_price,
            fuel_limit,
            funds: vec![],
            operations: vec![],
            participants: vec![],
            preferences: None,
            perception: None,
        }
    }

    pub fn pay_by(mut self, payer: ParticipantId) -> Self {
        self.payer = Some(payer);
        self
    }

    pub fn add_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn add_fund(mut self, asset_id: AssetId, amount: u128) -> Self {
        self.funds.push(Fund { asset_id, amount });
        self
    }

    pub fn add_participant(mut self, participant: IxParticipant) -> Self {
        self.participants.push(participant);
        self
    }

    pub fn use_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn use_perception(mut self, perception: Vec<u8>) -> Self {
        self.perception = Some(perception);
        self
    }

    /// The effective participant list: sender and payer first (always mutate-locked), then every
    /// address the operations structurally touch, then explicitly declared participants. Each
    /// address appears once; the first occurrence wins.
    pub fn gather_participants(&self) -> Vec<IxParticipant> {
        let mut gathered: Vec<IxParticipant> = vec![IxParticipant::mutating(*self.sender.address)];
        let mut push = |participant: IxParticipant| {
            if !gathered.iter().any(|seen| seen.address == participant.address) {
                gathered.push(participant);
            }
        };
        if let Some(payer) = &self.payer {
            push(IxParticipant::mutating(**payer));
        }
        for op in &self.operations {
            for address in op.touched() {
                push(IxParticipant::mutating(address));
            }
        }
        for participant in &self.participants {
            push(*participant);
        }
        gathered
    }

    /// The effective fund list: amounts scanned from asset-moving operations (summed per asset),
    /// then declared funds for assets not already scanned. Scanned operations take precedence on
    /// conflict.
    // TODO: Confirm the scanned-over-declared precedence against the protocol specification
    pub fn gather_funds(&self) -> Vec<Fund> {
        let mut gathered: Vec<Fund> = vec![];
        for op in &self.operations {
            if let Some((asset_id, amount)) = op.fund() {
                match gathered.iter_mut().find(|fund| fund.asset_id == asset_id) {
                    Some(fund) => fund.amount += amount,
                    None => gathered.push(Fund { asset_id, amount }),
                }
            }
        }
        for fund in &self.funds {
            if !gathered.iter().any(|seen| seen.asset_id == fund.asset_id) {
                gathered.push(*fund);
            }
        }
        gathered
    }

    /// Serializes the full envelope: every operation encoded independently through its registry
    /// descriptor, participants and funds gathered, and the fixed top-level schema applied.
    pub fn encode(&self, registry: &OpRegistry) -> Result<Vec<u8>, IxError> {
        let mut operations = Vec::with_capacity(self.operations.len());
        for op in &self.operations {
            let payload = registry.descriptor(op.op_type())?.encode(op)?;
            operations.push(Value::structure([
                ("type", Value::from(op.op_type().code())),
                ("payload", Value::from(payload)),
            ]));
        }
        let participants = self.gather_participants().into_iter().map(|participant| {
            Value::structure([
                ("address", Value::from(participant.address.to_byte_array().to_vec())),
                ("lock_type", Value::from(participant.lock_type as u8)),
                ("notary", Value::from(participant.notary)),
            ])
        });
        let funds = self.gather_funds().into_iter().map(|fund| {
            Value::structure([
                ("asset_id", Value::from(fund.asset_id.to_byte_array().to_vec())),
                ("amount", Value::from(fund.amount)),
            ])
        });
        let value = Value::structure([
            ("sender", Value::structure([
                ("address", Value::from(self.sender.address.to_byte_array().to_vec())),
                ("sequence_id", Value::from(self.sender.sequence_id)),
                ("key_id", Value::from(self.sender.key_id)),
            ])),
            ("payer", self
                .payer
                .map(|payer| Value::from(payer.to_byte_array().to_vec()))
                .unwrap_or(Value::Null)),
            ("fuel_price", Value::from(self.fuel_price)),
            ("fuel_limit", Value::from(self.fuel_limit)),
            ("funds", Value::list(funds)),
            ("ix_operations", Value::List(operations)),
            ("participants", Value::list(participants)),
            ("preferences", self.preferences.as_ref().map(preferences_wire).unwrap_or(Value::Null)),
            ("perception", self
                .perception
                .as_ref()
                .map(|perception| Value::from(perception.clone()))
                .unwrap_or(Value::Null)),
        ]);
        Ok(polo::serialize(&value, &interaction_schema())?)
    }

    /// Full structural pass run before signing and submission: returns the first violation found
    /// (short-circuit, no accumulation), or nothing for a well-formed request.
    pub fn validate(&self, registry: &OpRegistry) -> Option<Violation> {
        if self.operations.is_empty() {
            return Some(Violation::new("operations", "an interaction carries at least one operation", "[]"));
        }
        if self.fuel_limit == 0 {
            return Some(Violation::new("fuel_limit", "fuel limit must be positive", 0u8));
        }
        for (no, op) in self.operations.iter().enumerate() {
            let violation = match registry.descriptor(op.op_type()) {
                Err(_) => Some(Violation::new("type", "operation type is not registered", op.op_type())),
                Ok(descriptor) => descriptor.validate(op),
            };
            if let Some(violation) = violation {
                return Some(violation.nested(&format!("operations[{no}]")));
            }
        }
        for (no, participant) in self.participants.iter().enumerate() {
            if let Err(err) = participant.address.validate_structure() {
                return Some(Violation::new(
                    format!("participants[{no}].address"),
                    err.to_string(),
                    participant.address,
                ));
            }
        }
        None
    }
}

fn preferences_wire(preferences: &Preferences) -> Value {
    Value::structure([
        ("compute", Value::from(preferences.compute.clone())),
        ("consensus", Value::structure([
            ("mtq", Value::from(preferences.consensus.mtq)),
            ("trust_nodes", Value::list(
                preferences.consensus.trust_nodes.iter().map(|node| Value::from(node.as_str())),
            )),
        ])),
    ])
}

/// The fixed top-level schema of the interaction envelope.
fn interaction_schema() -> Schema {
    Schema::structure([
        ("sender", Schema::structure([
            ("address", Schema::Bytes),
            ("sequence_id", Schema::Integer),
            ("key_id", Schema::Integer),
        ])),
        ("payer", Schema::Bytes),
        ("fuel_price", Schema::Integer),
        ("fuel_limit", Schema::Integer),
        ("funds", Schema::list(Schema::structure([("asset_id", Schema::Bytes), ("amount", Schema::Integer)]))),
        ("ix_operations", Schema::list(Schema::structure([
            ("type", Schema::Integer),
            ("payload", Schema::Bytes),
        ]))),
        ("participants", Schema::list(Schema::structure([
            ("address", Schema::Bytes),
            ("lock_type", Schema::Integer),
            ("notary", Schema::Bool),
        ]))),
        ("preferences", Schema::structure([
            ("compute", Schema::Bytes),
            ("consensus", Schema::structure([("mtq", Schema::Integer), ("trust_nodes", Schema::list(Schema::Str))])),
        ])),
        ("perception", Schema::Bytes),
    ])
}

/// Error of assembling an interaction envelope. Validation failures are not errors here: the
/// structural pass reports them as [`Violation`] values through [`InteractionRequest::validate`].
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
pub enum IxError {
    #[from]
    #[display(inner)]
    Op(OpError),

    #[from]
    #[display(inner)]
    Encode(polo::EncodeError),
}
