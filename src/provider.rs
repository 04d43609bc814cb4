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

//! Provider façade over an opaque JSON-RPC transport.
//!
//! The transport is a collaborator, not part of this SDK: anything able to carry
//! `request(method, params)` pairs (HTTP, WebSocket, a test double) plugs in through the
//! [`Transport`] trait. The provider turns encoded structures from the core into `(method,
//! params)` pairs and parses the results back.

use core::time::Duration;
use std::thread;

use amplify::hex;
use ixreq::{InteractionRequest, IxError, OpRegistry};
use log::debug;
use moiapi::{decode_hex, CoderError, LogicId, Manifest, ManifestCoder, StorageKey};
use serde_json::{json, Value as Json};

use crate::signer::SignedInteraction;

/// JSON-RPC level failure: either a transport breakdown or an error object returned by the node.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Json>,
}

/// Opaque JSON-RPC transport: `request(method, params) -> result | error`.
pub trait Transport {
    fn request(&self, method: &str, params: Json) -> Result<Json, RpcError>;
}

/// Fixed-delay, bounded-count polling policy for interaction finalization.
///
/// Polling is a plain bounded loop on the calling thread: when the caller gives up, no background
/// timer outlives the call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            interval: Duration::from_secs(1),
            retries: 30,
        }
    }
}

/// Result of simulating an interaction without submitting it.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Simulation {
    /// Fuel the execution would consume.
    pub effort: u64,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Receipt of a finalized interaction.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct IxReceipt {
    pub status: u64,
    pub fuel_used: u64,
    /// Hex payload of routine outputs, fed into the manifest coder by the caller.
    #[serde(default)]
    pub result: Option<String>,
}

/// Error of a provider call.
#[derive(Debug, Display, Error, From)]
pub enum ProviderError {
    #[from]
    #[display(inner)]
    Rpc(RpcError),

    #[from]
    #[display(inner)]
    Ix(IxError),

    #[from]
    #[display(inner)]
    Coder(CoderError),

    #[from]
    #[display(inner)]
    Hex(hex::Error),

    #[display("malformed RPC response: {0}")]
    MalformedResponse(String),

    #[display("interaction {0} did not finalize within the polling budget")]
    Timeout(String),
}

/// RPC provider: builds `(method, params)` pairs from encoded core structures and parses results.
pub struct Provider<T: Transport> {
    transport: T,
}

impl<T: Transport> Provider<T> {
    pub fn new(transport: T) -> Self { Provider { transport } }

    pub fn transport(&self) -> &T { &self.transport }

    /// Submits a signed interaction; returns the interaction hash assigned by the node.
    pub fn submit(&self, signed: &SignedInteraction) -> Result<String, ProviderError> {
        let signatures: Vec<Json> = signed
            .signatures
            .iter()
            .map(|sig| {
                json!({
                    "address": sig.address.to_string(),
                    "key_id": sig.key_id,
                    "algorithm": sig.signature.algo.to_string(),
                    "signature": sig.signature.to_string(),
                })
            })
            .collect();
        debug!("moi.Submit: {} signature(s)", signatures.len());
        let result = self.transport.request("moi.Submit", json!([{
            "interaction": signed.interaction_hex(),
            "signatures": signatures,
        }]))?;
        result
            .get("hash")
            .and_then(Json::as_str)
            .map(str::to_owned)
            .ok_or_else(|| ProviderError::MalformedResponse(s!("moi.Submit result carries no hash")))
    }

    /// Encodes and simulates an unsigned interaction request.
    pub fn simulate(&self, request: &InteractionRequest, registry: &OpRegistry) -> Result<Simulation, ProviderError> {
        let encoded = request.encode(registry)?;
        debug!("moi.Simulate: {} operation(s)", request.operations.len());
        let result = self.transport.request("moi.Simulate", json!([{
            "interaction": moiapi::encode_hex(&encoded),
        }]))?;
        serde_json::from_value(result).map_err(|err| ProviderError::MalformedResponse(err.to_string()))
    }

    /// Fetches and decodes the manifest of a deployed logic.
    pub fn logic_manifest(&self, logic_id: &LogicId) -> Result<Manifest, ProviderError> {
        debug!("moi.LogicManifest: {logic_id}");
        let result = self.transport.request("moi.LogicManifest", json!([{
            "logic_id": logic_id.to_string(),
        }]))?;
        let payload = result
            .as_str()
            .ok_or_else(|| ProviderError::MalformedResponse(s!("moi.LogicManifest result is not a hex string")))?;
        Ok(ManifestCoder::decode_manifest(&decode_hex(payload)?)?)
    }

    /// Reads one slot of a logic's state store. The returned hex payload feeds
    /// [`ManifestCoder::decode_state`]; the empty payload `"0x"` means the slot is unset.
    pub fn logic_storage(&self, logic_id: &LogicId, key: &StorageKey) -> Result<String, ProviderError> {
        debug!("moi.LogicStorage: {logic_id} @ {key}");
        let result = self.transport.request("moi.LogicStorage", json!([{
            "logic_id": logic_id.to_string(),
            "storage_key": key.to_string(),
        }]))?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ProviderError::MalformedResponse(s!("moi.LogicStorage result is not a hex string")))
    }

    /// The receipt of an interaction, or `None` while it is not yet finalized.
    pub fn receipt(&self, hash: &str) -> Result<Option<IxReceipt>, ProviderError> {
        let result = self.transport.request("moi.Receipt", json!([{ "hash": hash }]))?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(|err| ProviderError::MalformedResponse(err.to_string()))
    }

    /// Polls for a receipt with a fixed delay and bounded retry count.
    pub fn wait_for_result(&self, hash: &str, policy: RetryPolicy) -> Result<IxReceipt, ProviderError> {
        for attempt in 0..policy.retries {
            if let Some(receipt) = self.receipt(hash)? {
                return Ok(receipt);
            }
            debug!("interaction {hash} not finalized yet (attempt {attempt})");
            thread::sleep(policy.interval);
        }
        Err(ProviderError::Timeout(hash.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use ixreq::{AssetTransfer, Operation, Sender};
    use moiapi::{EngineKind, IdKind, IdTag, Identifier, Logic, StateMode, StorageKeyBuilder};

    use super::*;
    use crate::signer::{sign_interaction, SigAlgo, Signature, Signer, SignerError};

    /// Transport double: replays canned responses and records the calls it sees.
    struct MockTransport {
        calls: RefCell<Vec<(String, Json)>>,
        responses: RefCell<Vec<Result<Json, RpcError>>>,
    }

    impl MockTransport {
        fn replying<I>(responses: I) -> Self
        where
            I: IntoIterator<Item = Result<Json, RpcError>>,
            I::IntoIter: DoubleEndedIterator,
        {
            MockTransport {
                calls: RefCell::new(vec![]),
                responses: RefCell::new(responses.into_iter().rev().collect()),
            }
        }
    }

    impl Transport for MockTransport {
        fn request(&self, method: &str, params: Json) -> Result<Json, RpcError> {
            self.calls.borrow_mut().push((method.to_owned(), params));
            self.responses.borrow_mut().pop().expect("unexpected RPC call")
        }
    }

    struct NullSigner(moiapi::ParticipantId);

    impl Signer for NullSigner {
        fn address(&self) -> moiapi::ParticipantId { self.0 }

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

    fn participant(fill: u8) -> moiapi::ParticipantId {
        Identifier::compose(IdTag::new(IdKind::Participant, 0).unwrap(), 0, [0; 2], [fill; 24], 0)
            .try_into()
            .unwrap()
    }

    fn asset(fill: u8) -> moiapi::AssetId {
        Identifier::compose(IdTag::new(IdKind::Asset, 0).unwrap(), 0, [0; 2], [fill; 24], 0)
            .try_into()
            .unwrap()
    }

    fn logic_id(fill: u8) -> LogicId {
        Identifier::compose(IdTag::new(IdKind::Logic, 0).unwrap(), 0, [0; 2], [fill; 24], 0)
            .try_into()
            .unwrap()
    }

    fn request() -> InteractionRequest {
        let sender = Sender {
            address: participant(0x48),
            sequence_id: 0,
            key_id: 0,
        };
        InteractionRequest::new(sender, 1, 200).add_operation(Operation::AssetTransfer(AssetTransfer {
            asset_id: asset(0xAA),
            beneficiary: participant(0x11),
            amount: 5,
        }))
    }

    #[test]
    fn submit_sends_hex_envelope_and_returns_hash() {
        let registry = OpRegistry::standard();
        let signed = sign_interaction(&request(), &NullSigner(participant(0x48)), &registry).unwrap();
        let transport = MockTransport::replying([Ok(json!({"hash": "0xfeed"}))]);
        let provider = Provider::new(transport);
        let hash = provider.submit(&signed).unwrap();
        assert_eq!(hash, "0xfeed");

        let calls = provider.transport().calls.borrow();
        let (method, params) = &calls[0];
        assert_eq!(method, "moi.Submit");
        let interaction = params[0]["interaction"].as_str().unwrap();
        assert!(interaction.starts_with("0x0e"));
        assert_eq!(params[0]["signatures"][0]["algorithm"], "ECDSA_S256");
    }

    #[test]
    fn simulate_parses_result() {
        let transport = MockTransport::replying([Ok(json!({"effort": 42, "result": "0x"}))]);
        let provider = Provider::new(transport);
        let simulation = provider.simulate(&request(), &OpRegistry::standard()).unwrap();
        assert_eq!(simulation.effort, 42);
        assert_eq!(simulation.result.as_deref(), Some("0x"));
        assert_eq!(simulation.error, None);
    }

    #[test]
    fn logic_manifest_roundtrips_through_rpc_hex() {
        let json = r#"{
            "syntax": 1,
            "engine": {"kind": "PISA", "flags": []},
            "elements": [
                {"ptr": 0, "kind": "state", "data": {"mode": "persistent", "fields": [
                    {"slot": 0, "label": "name", "type": "string"}
                ]}}
            ]
        }"#;
        let logic = Logic::from_json(json).unwrap();
        let encoded = ManifestCoder::encode_manifest(logic.manifest()).unwrap();
        let transport = MockTransport::replying([Ok(Json::String(moiapi::encode_hex(&encoded)))]);
        let provider = Provider::new(transport);
        let manifest = provider.logic_manifest(&logic_id(0x10)).unwrap();
        assert_eq!(&manifest, logic.manifest());
        assert_eq!(manifest.engine.kind, EngineKind::Pisa);
    }

    #[test]
    fn logic_storage_fetches_slot_payload() {
        let json = r#"{
            "syntax": 1,
            "engine": {"kind": "PISA", "flags": []},
            "elements": [
                {"ptr": 0, "kind": "state", "data": {"mode": "persistent", "fields": [
                    {"slot": 0, "label": "name", "type": "string"}
                ]}}
            ]
        }"#;
        let logic = Logic::from_json(json).unwrap();
        let key = StorageKeyBuilder::persistent(&logic).unwrap().field("name").unwrap().finish();
        let transport = MockTransport::replying([Ok(Json::String(s!("0x0652494f")))]);
        let provider = Provider::new(transport);
        let payload = provider.logic_storage(&logic_id(0x10), &key).unwrap();

        let coder = moiapi::ManifestCoder::new(&logic);
        let (_, state) = logic.state(StateMode::Persistent).unwrap();
        let value = coder.decode_state(&payload, "name", &state.fields).unwrap();
        assert_eq!(value, Some(polo::Value::from("RIO")));
    }

    #[test]
    fn wait_for_result_polls_until_receipt() {
        let transport = MockTransport::replying([
            Ok(Json::Null),
            Ok(Json::Null),
            Ok(json!({"status": 0, "fuel_used": 180, "result": "0x"})),
        ]);
        let provider = Provider::new(transport);
        let policy = RetryPolicy {
            interval: Duration::from_millis(1),
            retries: 5,
        };
        let receipt = provider.wait_for_result("0xfeed", policy).unwrap();
        assert_eq!(receipt.fuel_used, 180);
        assert_eq!(provider.transport().calls.borrow().len(), 3);
    }

    #[test]
    fn wait_for_result_times_out_after_bounded_retries() {
        let transport = MockTransport::replying(vec![Ok(Json::Null); 3]);
        let provider = Provider::new(transport);
        let policy = RetryPolicy {
            interval: Duration::from_millis(1),
            retries: 3,
        };
        assert!(matches!(provider.wait_for_result("0xfeed", policy), Err(ProviderError::Timeout(_))));
        assert_eq!(provider.transport().calls.borrow().len(), 3);
    }

    #[test]
    fn rpc_errors_propagate() {
        let transport = MockTransport::replying([Err(RpcError {
            code: -32000,
            message: s!("nonce too low"),
            data: None,
        })]);
        let provider = Provider::new(transport);
        let err = provider.receipt("0xfeed").unwrap_err();
        assert!(matches!(err, ProviderError::Rpc(RpcError { code: -32000, .. })));
    }
}
