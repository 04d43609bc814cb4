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

//! End-to-end walk through the SDK with an ERC20-like token logic: manifest loading, argument and
//! state codecs, storage keys, interaction assembly, signing and submission.

use std::cell::RefCell;
use std::num::NonZeroU32;

use moi::{
    decode_hex, encode_hex, ix_digest, sign_interaction, Accessor, AssetCreate, IdKind, IdTag, Identifier,
    InteractionRequest, IxParticipant, LockType, Logic, LogicDeploy, LogicId, LogicInvoke, ManifestCoder, OpRegistry,
    OpType, Operation, ParticipantId, Provider, RetryPolicy, RpcError, Schema, Sender, SigAlgo, Signature, Signer,
    SignerError, StateMode, StorageKeyBuilder, Transport, Value,
};
use serde_json::{json, Value as Json};

const TOKEN_MANIFEST: &str = r#"{
    "syntax": 1,
    "engine": {"kind": "PISA", "flags": []},
    "elements": [
        {"ptr": 0, "kind": "typedef", "data": {"name": "balance", "type": "u256"}},
        {"ptr": 1, "kind": "constant", "data": {"type": "string", "value": "0x064d4f49"}},
        {"ptr": 2, "kind": "class", "data": {"name": "Allowance", "fields": [
            {"slot": 0, "label": "spender", "type": "address"},
            {"slot": 1, "label": "amount", "type": "balance"}
        ]}},
        {"ptr": 3, "kind": "state", "data": {"mode": "persistent", "fields": [
            {"slot": 0, "label": "name", "type": "string"},
            {"slot": 1, "label": "symbol", "type": "string"},
            {"slot": 2, "label": "supply", "type": "balance"},
            {"slot": 3, "label": "balances", "type": "map(address,balance)"},
            {"slot": 4, "label": "allowances", "type": "array(Allowance)"}
        ]}},
        {"ptr": 4, "kind": "routine", "deps": [3], "data": {"name": "Seeder!", "kind": "deploy", "mutable": true,
            "accepts": [
                {"slot": 0, "label": "name", "type": "string"},
                {"slot": 1, "label": "symbol", "type": "string"},
                {"slot": 2, "label": "supply", "type": "balance"},
                {"slot": 3, "label": "seeder", "type": "string"}
            ],
            "returns": [], "catches": []}},
        {"ptr": 5, "kind": "routine", "deps": [3], "data": {"name": "Transfer!", "kind": "invoke", "mutable": true,
            "accepts": [
                {"slot": 0, "label": "beneficiary", "type": "address"},
                {"slot": 1, "label": "amount", "type": "balance"}
            ],
            "returns": [{"slot": 0, "label": "ok", "type": "bool"}],
            "catches": ["InsufficientBalance"]}},
        {"ptr": 6, "kind": "routine", "deps": [3], "data": {"name": "BalanceOf", "kind": "invoke", "mutable": false,
            "accepts": [{"slot": 0, "label": "addr", "type": "address"}],
            "returns": [{"slot": 0, "label": "balance", "type": "balance"}],
            "catches": []}},
        {"ptr": 7, "kind": "event", "deps": [], "data": {"name": "Transfer", "topics": 2, "fields": [
            {"slot": 0, "label": "from", "type": "address"},
            {"slot": 1, "label": "to", "type": "address"},
            {"slot": 2, "label": "amount", "type": "balance"}
        ]}}
    ]
}"#;

fn participant(fill: u8) -> ParticipantId {
    Identifier::compose(IdTag::new(IdKind::Participant, 0).unwrap(), 0, [0; 2], [fill; 24], 0)
        .try_into()
        .unwrap()
}

fn logic_id(fill: u8) -> LogicId {
    Identifier::compose(IdTag::new(IdKind::Logic, 0).unwrap(), 0, [0; 2], [fill; 24], 0)
        .try_into()
        .unwrap()
}

fn sender() -> Sender {
    Sender {
        address: participant(0x48),
        sequence_id: 0,
        key_id: 0,
    }
}

struct EchoSigner(ParticipantId);

impl Signer for EchoSigner {
    fn address(&self) -> ParticipantId { self.0 }

    fn key_id(&self) -> u64 { 0 }

    fn sign(&self, digest: &[u8; 32]) -> Result<Signature, SignerError> {
        Ok(Signature {
            algo: SigAlgo::EcdsaS256,
            payload: digest.to_vec(),
        })
    }

    fn verify(&self, digest: &[u8; 32], signature: &Signature) -> Result<bool, SignerError> {
        Ok(signature.payload == digest)
    }
}

struct ScriptedTransport(RefCell<Vec<Result<Json, RpcError>>>);

impl ScriptedTransport {
    fn replying<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<Json, RpcError>>,
        I::IntoIter: DoubleEndedIterator,
    {
        ScriptedTransport(RefCell::new(responses.into_iter().rev().collect()))
    }
}

impl Transport for ScriptedTransport {
    fn request(&self, _method: &str, _params: Json) -> Result<Json, RpcError> {
        self.0.borrow_mut().pop().expect("unexpected RPC call")
    }
}

#[test]
fn seeder_arguments_encode_as_document() {
    let logic = Logic::from_json(TOKEN_MANIFEST).unwrap();
    let coder = ManifestCoder::new(&logic);
    let args = [
        Value::from("MOI-Token"),
        Value::from("MOI"),
        Value::from(100_000_000u64),
        Value::from("ffcd8ee6a29ec442dbbf9c6124dd3aeb833ef58052237d521654740857716b34"),
    ];
    let calldata = coder.encode_arguments("Seeder!", &args).unwrap();
    // Document wire form with labels ascending; the symbol value lands last
    assert_eq!(calldata[0], 0x0D);
    assert!(calldata.ends_with(b"MOI"));
    assert_eq!(calldata, coder.encode_arguments("Seeder!", &args).unwrap());
}

#[test]
fn state_and_exception_vectors_decode() {
    let logic = Logic::from_json(TOKEN_MANIFEST).unwrap();
    let coder = ManifestCoder::new(&logic);
    let (_, state) = logic.state(StateMode::Persistent).unwrap();

    assert_eq!(coder.decode_state("0x0652494f", "name", &state.fields).unwrap(), Some(Value::from("RIO")));
    assert_eq!(coder.decode_state("0x", "name", &state.fields).unwrap(), None);
    assert_eq!(coder.decode_output("BalanceOf", "0x").unwrap(), None);

    let mut exception = vec![0x0E, 0x4F, 0x06, 0x66, 0xAE, 0x03];
    exception.extend_from_slice(b"string");
    exception.extend_from_slice(b"Something went wrong");
    exception.extend_from_slice(&[0x3F, 0x06, 0xB6, 0x01]);
    exception.extend_from_slice(b"function1()");
    exception.extend_from_slice(b"function2()");
    let decoded = ManifestCoder::decode_exception(&encode_hex(&exception)).unwrap().unwrap();
    assert_eq!(decoded.class, "string");
    assert_eq!(decoded.data, "Something went wrong");
    assert_eq!(decoded.trace, vec!["function1()".to_owned(), "function2()".to_owned()]);
}

#[test]
fn routine_surface_is_explicit_data() {
    let logic = Logic::from_json(TOKEN_MANIFEST).unwrap();
    let coder = ManifestCoder::new(&logic);
    let transfer = logic.routine("Transfer!").unwrap();
    assert!(transfer.is_mutable());
    assert_eq!(transfer.accepts().len(), 2);
    assert_eq!(transfer.returns()[0].label, "ok");
    assert_eq!(transfer.catches(), ["InsufficientBalance".to_owned()]);
    let balance_of = logic.routine("BalanceOf").unwrap();
    assert!(!balance_of.is_mutable());
    assert!(logic.routine("Burn!").is_none());

    // The call surface is data plus two explicit codec entry points
    let calldata = transfer
        .calldata(&coder, &[
            Value::from(participant(0x11).to_byte_array().to_vec()),
            Value::from(25u64),
        ])
        .unwrap();
    assert_eq!(calldata, coder.encode_arguments("Transfer!", &[
        Value::from(participant(0x11).to_byte_array().to_vec()),
        Value::from(25u64),
    ])
    .unwrap());
    let ok = polo::serialize(&Value::structure([("ok", Value::from(true))]), &Schema::structure([(
        "ok",
        Schema::Bool,
    )]))
    .unwrap();
    let result = transfer.decode_result(&coder, &encode_hex(&ok)).unwrap().unwrap();
    assert_eq!(result.field("ok"), Some(&Value::from(true)));
    assert_eq!(transfer.decode_result(&coder, "0x").unwrap(), None);
}

#[test]
fn storage_keys_are_deterministic_and_typed() {
    let logic = Logic::from_json(TOKEN_MANIFEST).unwrap();
    let holder = participant(0x11);

    let path = [
        Accessor::Property("balances".to_owned()),
        Accessor::Property(holder.to_string()),
    ];
    let a = StorageKeyBuilder::derive(&logic, StateMode::Persistent, &path).unwrap();
    let b = StorageKeyBuilder::derive(&logic, StateMode::Persistent, &path).unwrap();
    assert_eq!(a, b);

    let other = StorageKeyBuilder::derive(&logic, StateMode::Persistent, &[
        Accessor::Property("balances".to_owned()),
        Accessor::Property(participant(0x12).to_string()),
    ])
    .unwrap();
    assert_ne!(a, other);

    // Typed descent through array(Allowance) into a class field
    StorageKeyBuilder::persistent(&logic)
        .unwrap()
        .field("allowances")
        .unwrap()
        .index(0)
        .unwrap()
        .field("spender")
        .unwrap()
        .finish();

    assert!(StorageKeyBuilder::persistent(&logic).unwrap().field("supply").unwrap().index(0).is_err());
}

#[test]
fn deploy_and_invoke_interaction_lifecycle() {
    let logic = Logic::from_json(TOKEN_MANIFEST).unwrap();
    let coder = ManifestCoder::new(&logic);
    let registry = OpRegistry::standard();
    let signer = EchoSigner(participant(0x48));

    // Deploy: manifest bytes plus Seeder! calldata
    let manifest_bytes = ManifestCoder::encode_manifest(logic.manifest()).unwrap();
    let calldata = coder
        .encode_arguments("Seeder!", &[
            Value::from("MOI-Token"),
            Value::from("MOI"),
            Value::from(100_000_000u64),
            Value::from("seeder"),
        ])
        .unwrap();
    let deploy = InteractionRequest::new(sender(), 1, 2000).add_operation(Operation::LogicDeploy(LogicDeploy {
        manifest: manifest_bytes,
        callsite: "Seeder!".to_owned(),
        calldata,
        interfaces: None,
    }));
    assert_eq!(deploy.validate(&registry), None);
    let signed = sign_interaction(&deploy, &signer, &registry).unwrap();
    assert!(signer.verify(&ix_digest(&signed.interaction), &signed.signatures[0].signature).unwrap());

    let provider = Provider::new(ScriptedTransport::replying([
        Ok(json!({"hash": "0xabcd"})),
        Ok(Json::Null),
        Ok(json!({"status": 0, "fuel_used": 1800, "result": "0x"})),
    ]));
    let hash = provider.submit(&signed).unwrap();
    assert_eq!(hash, "0xabcd");
    let receipt = provider
        .wait_for_result(&hash, RetryPolicy {
            interval: core::time::Duration::from_millis(1),
            retries: 3,
        })
        .unwrap();
    assert_eq!(receipt.status, 0);

    // Invoke: one operation, sender plus the logic address as participants
    let invoke = InteractionRequest::new(sender(), 1, 200)
        .add_operation(Operation::LogicInvoke(LogicInvoke {
            logic_id: logic_id(0x10),
            callsite: "Transfer!".to_owned(),
            calldata: coder
                .encode_arguments("Transfer!", &[
                    Value::from(participant(0x11).to_byte_array().to_vec()),
                    Value::from(25u64),
                ])
                .unwrap(),
            interfaces: None,
        }))
        .add_participant(IxParticipant {
            address: *participant(0x11),
            lock_type: LockType::Read,
            notary: false,
        });
    let participants = invoke.gather_participants();
    assert_eq!(participants.len(), 3);
    assert_eq!(participants[1].address, *logic_id(0x10));
    assert_eq!(participants[2].lock_type, LockType::Read);
    let encoded = invoke.encode(&registry).unwrap();
    assert_eq!(encoded, invoke.encode(&registry).unwrap());
}

#[test]
fn asset_create_operation_matches_pinned_vector() {
    let registry = OpRegistry::standard();
    let op = Operation::AssetCreate(AssetCreate {
        symbol: "MOI".to_owned(),
        supply: 500,
        standard: 0,
        dimension: 0,
        is_stateful: false,
        is_logical: false,
        logic: None,
    });
    let encoded = registry.descriptor(OpType::AssetCreate).unwrap().encode(&op).unwrap();
    assert_eq!(encode_hex(&encoded), "0x0e7f063353535151504d4f4901f4");
}

#[test]
fn manifest_survives_binary_roundtrip_and_rpc() {
    let logic = Logic::from_json(TOKEN_MANIFEST).unwrap();
    let encoded = ManifestCoder::encode_manifest(logic.manifest()).unwrap();
    let decoded = ManifestCoder::decode_manifest(&encoded).unwrap();
    assert_eq!(&decoded, logic.manifest());

    let provider = Provider::new(ScriptedTransport::replying([Ok(Json::String(encode_hex(&encoded)))]));
    let fetched = provider.logic_manifest(&logic_id(0x10)).unwrap();
    assert_eq!(&fetched, logic.manifest());
    // The fetched manifest indexes and resolves exactly like the original
    let refetched = Logic::with(fetched).unwrap();
    assert!(refetched.routine("Seeder!").is_some());
}

#[test]
fn variant_identifiers_derive_purely() {
    let base = logic_id(0x10);
    let index = NonZeroU32::new(3).unwrap();
    let variant = base.derive_variant(index);
    assert_eq!(variant, base.derive_variant(index));
    assert!(variant.is_variant());
    assert_eq!(variant.variant(), 3);
    assert_eq!(variant.fingerprint(), base.fingerprint());
}

#[test]
fn arguments_decode_back_as_labelled_struct() {
    let logic = Logic::from_json(TOKEN_MANIFEST).unwrap();
    let coder = ManifestCoder::new(&logic);
    let routine = logic.routine("Transfer!").unwrap();
    let beneficiary = participant(0x11).to_byte_array().to_vec();
    let calldata = coder
        .encode_arguments("Transfer!", &[Value::from(beneficiary.clone()), Value::from(25u64)])
        .unwrap();
    let decoded = coder
        .decode_field_output(routine.accepts(), &encode_hex(&calldata), "test")
        .unwrap()
        .unwrap();
    assert_eq!(decoded.field("beneficiary").and_then(Value::as_bytes), Some(&beneficiary[..]));
    assert_eq!(decoded.field("amount").and_then(Value::as_uint), Some(25));

    let constant = decode_hex("0x064d4f49").unwrap();
    assert_eq!(polo::deserialize(&constant, &Schema::Str).unwrap(), Value::from("MOI"));
}
