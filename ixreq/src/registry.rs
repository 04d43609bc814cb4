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
use polo::Schema;

use crate::op::{OpType, Operation, Violation};

/// Descriptor of one operation type: its wire schema plus the validate and encode entry points.
#[derive(Clone, Debug)]
pub struct OpDescriptor {
    op_type: OpType,
    schema: Schema,
}

impl OpDescriptor {
    pub fn new(op_type: OpType) -> Self {
        OpDescriptor {
            op_type,
            schema: payload_schema(op_type),
        }
    }

    pub fn op_type(&self) -> OpType { self.op_type }

    pub fn schema(&self) -> &Schema { &self.schema }

    /// Runs the payload validator after checking the operation matches this descriptor.
    pub fn validate(&self, op: &Operation) -> Option<Violation> {
        if op.op_type() != self.op_type {
            return Some(Violation::new(
                "type",
                format!("operation is {}, descriptor covers {}", op.op_type(), self.op_type),
                op.op_type().code(),
            ));
        }
        op.validate()
    }

    /// Transforms the payload into wire values and serializes it under this descriptor's schema.
    /// The transform runs strictly before schema application.
    pub fn encode(&self, op: &Operation) -> Result<Vec<u8>, OpError> {
        if op.op_type() != self.op_type {
            return Err(OpError::TypeMismatch {
                expected: self.op_type,
                found: op.op_type(),
            });
        }
        polo::serialize(&op.to_wire(), &self.schema).map_err(|error| OpError::Encode {
            op_type: self.op_type,
            error,
        })
    }
}

/// Registry of operation descriptors: constructed once, passed by reference wherever operations
/// are validated or encoded. Not a process-wide singleton, so registries for several protocol
/// versions can coexist.
#[derive(Clone, Debug)]
pub struct OpRegistry {
    descriptors: IndexMap<OpType, OpDescriptor>,
}

impl OpRegistry {
    /// The registry covering every operation type of this protocol version.
    pub fn standard() -> Self { Self::with(OpType::ALL.into_iter().map(OpDescriptor::new)) }

    pub fn with(descriptors: impl IntoIterator<Item = OpDescriptor>) -> Self {
        OpRegistry {
            descriptors: descriptors.into_iter().map(|desc| (desc.op_type(), desc)).collect(),
        }
    }

    pub fn descriptor(&self, op_type: OpType) -> Result<&OpDescriptor, OpError> {
        self.descriptors.get(&op_type).ok_or(OpError::Unknown(op_type))
    }

    pub fn contains(&self, op_type: OpType) -> bool { self.descriptors.contains_key(&op_type) }

    pub fn len(&self) -> usize { self.descriptors.len() }

    pub fn is_empty(&self) -> bool { self.descriptors.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &OpDescriptor> { self.descriptors.values() }
}

/// Error of encoding an operation payload, carrying the operation type for diagnosability.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
pub enum OpError {
    #[display("operation type {0} is not covered by the registry")]
    Unknown(OpType),

    #[display("descriptor for {expected} cannot encode a {found} operation")]
    TypeMismatch { expected: OpType, found: OpType },

    #[display("encoding {op_type} payload: {error}")]
    Encode { op_type: OpType, error: polo::EncodeError },
}

fn logic_payload_schema() -> Schema {
    Schema::structure([
        ("manifest", Schema::Bytes),
        ("callsite", Schema::Str),
        ("calldata", Schema::Bytes),
        ("interfaces", Schema::map(Schema::Str, Schema::Bytes)),
    ])
}

fn logic_call_schema() -> Schema {
    Schema::structure([
        ("logic_id", Schema::Bytes),
        ("callsite", Schema::Str),
        ("calldata", Schema::Bytes),
        ("interfaces", Schema::map(Schema::Str, Schema::Bytes)),
    ])
}

/// The fixed wire schema of each payload variant. Field order is part of the wire contract.
fn payload_schema(op_type: OpType) -> Schema {
    match op_type {
        OpType::ParticipantCreate => Schema::structure([
            ("address", Schema::Bytes),
            ("amount", Schema::Integer),
            ("keys", Schema::list(Schema::structure([
                ("public_key", Schema::Bytes),
                ("weight", Schema::Integer),
                ("algorithm", Schema::Integer),
            ]))),
        ]),
        OpType::AssetCreate => Schema::structure([
            ("symbol", Schema::Str),
            ("supply", Schema::Integer),
            ("standard", Schema::Integer),
            ("dimension", Schema::Integer),
            ("is_stateful", Schema::Bool),
            ("is_logical", Schema::Bool),
            ("logic", logic_payload_schema()),
        ]),
        OpType::AssetTransfer => Schema::structure([
            ("asset_id", Schema::Bytes),
            ("beneficiary", Schema::Bytes),
            ("amount", Schema::Integer),
        ]),
        OpType::AssetApprove => Schema::structure([
            ("asset_id", Schema::Bytes),
            ("beneficiary", Schema::Bytes),
            ("amount", Schema::Integer),
            ("timestamp", Schema::Integer),
        ]),
        OpType::AssetMint | OpType::AssetBurn => {
            Schema::structure([("asset_id", Schema::Bytes), ("amount", Schema::Integer)])
        }
        OpType::LogicDeploy => logic_payload_schema(),
        OpType::LogicInvoke | OpType::LogicEnlist => logic_call_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::AssetCreate;

    #[test]
    fn standard_registry_covers_all_types() {
        let registry = OpRegistry::standard();
        assert_eq!(registry.len(), OpType::ALL.len());
        for ty in OpType::ALL {
            assert!(registry.contains(ty));
            assert_eq!(registry.descriptor(ty).unwrap().op_type(), ty);
        }
    }

    #[test]
    fn partial_registry_reports_unknown_types() {
        let registry = OpRegistry::with([OpDescriptor::new(OpType::AssetCreate)]);
        assert_eq!(registry.descriptor(OpType::AssetMint).unwrap_err(), OpError::Unknown(OpType::AssetMint));
    }

    #[test]
    fn asset_create_payload_matches_pinned_vector() {
        let registry = OpRegistry::standard();
        let op = Operation::AssetCreate(AssetCreate {
            symbol: s!("MOI"),
            supply: 500,
            standard: 0,
            dimension: 0,
            is_stateful: false,
            is_logical: false,
            logic: None,
        });
        let encoded = registry.descriptor(OpType::AssetCreate).unwrap().encode(&op).unwrap();
        assert_eq!(
            encoded,
            vec![0x0E, 0x7F, 0x06, 0x33, 0x53, 0x53, 0x51, 0x51, 0x50, 0x4D, 0x4F, 0x49, 0x01, 0xF4]
        );
    }

    #[test]
    fn descriptor_rejects_mismatched_operations() {
        let registry = OpRegistry::standard();
        let op = Operation::AssetCreate(AssetCreate {
            symbol: s!("MOI"),
            supply: 1,
            standard: 0,
            dimension: 0,
            is_stateful: false,
            is_logical: false,
            logic: None,
        });
        let desc = registry.descriptor(OpType::AssetMint).unwrap();
        assert!(matches!(desc.encode(&op), Err(OpError::TypeMismatch { .. })));
        assert!(desc.validate(&op).is_some());
    }
}
