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

//! Interaction signing over an opaque signature capability.
//!
//! Elliptic-curve arithmetic stays outside this SDK: a [`Signer`] implementation brings its own
//! curve and key handling, and this module only validates, encodes, digests and hands the digest
//! over.

use core::fmt::{self, Display, Formatter};

use ixreq::{InteractionRequest, OpRegistry, Violation};
use log::trace;
use moiapi::{encode_hex, ParticipantId};
use sha2::{Digest, Sha256};

/// Signature algorithm enumerants of the protocol.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[non_exhaustive]
#[repr(u8)]
pub enum SigAlgo {
    #[display("ECDSA_S256")]
    EcdsaS256 = 0,
}

/// An opaque signature produced by a [`Signer`].
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Signature {
    pub algo: SigAlgo,
    pub payload: Vec<u8>,
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&encode_hex(&self.payload)) }
}

/// Error reported by a signer implementation.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
pub enum SignerError {
    #[display("signing key is unavailable: {0}")]
    Unavailable(String),

    #[display("signer rejected the digest: {0}")]
    Rejected(String),
}

/// Opaque signing capability bound to one participant key.
///
/// Implementations wrap a raw private key obtained from the wallet collaborator (see
/// [`crate::Keystore`]) or an external secret store; this SDK never sees key material.
pub trait Signer {
    /// The participant the key belongs to.
    fn address(&self) -> ParticipantId;

    /// Index of the key within the participant's key set.
    fn key_id(&self) -> u64;

    fn sign(&self, digest: &[u8; 32]) -> Result<Signature, SignerError>;

    fn verify(&self, digest: &[u8; 32], signature: &Signature) -> Result<bool, SignerError>;
}

/// One signature attached to an interaction envelope.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct IxSignature {
    pub address: ParticipantId,
    pub key_id: u64,
    pub signature: Signature,
}

/// A serialized interaction envelope with the signatures authorizing it.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SignedInteraction {
    pub interaction: Vec<u8>,
    pub signatures: Vec<IxSignature>,
}

impl SignedInteraction {
    pub fn interaction_hex(&self) -> String { encode_hex(&self.interaction) }
}

/// Error of [`sign_interaction`].
#[derive(Debug, Display, Error, From)]
pub enum SignError {
    /// The request failed its structural validation pass; nothing was signed.
    #[display("invalid interaction request - {0}")]
    Invalid(Violation),

    #[from]
    #[display(inner)]
    Ix(ixreq::IxError),

    #[from]
    #[display(inner)]
    Signer(SignerError),
}

/// The digest a signer commits to: sha256 of the serialized envelope.
pub fn ix_digest(encoded: &[u8]) -> [u8; 32] { Sha256::digest(encoded).into() }

/// Validates, encodes, digests and signs an interaction request.
///
/// Validation runs first and short-circuits: an invalid request is never signed.
pub fn sign_interaction(
    request: &InteractionRequest,
    signer: &dyn Signer,
    registry: &OpRegistry,
) -> Result<SignedInteraction, SignError> {
    if let Some(violation) = request.validate(registry) {
        return Err(SignError::Invalid(violation));
    }
    let interaction = request.encode(registry)?;
    let digest = ix_digest(&interaction);
    trace!("signing interaction digest {}", encode_hex(&digest));
    let signature = signer.sign(&digest)?;
    Ok(SignedInteraction {
        interaction,
        signatures: vec![IxSignature {
            address: signer.address(),
            key_id: signer.key_id(),
            signature,
        }],
    })
}

#[cfg(test)]
mod tests {
    use ixreq::{AssetTransfer, Operation, Sender};
    use moiapi::{IdKind, IdTag, Identifier};

    use super::*;

    /// Test double: "signs" by xoring the digest with a fixed pad. Deterministic and reversible,
    /// which is all the orchestration layer needs to be exercised.
    struct PadSigner {
        address: ParticipantId,
        pad: u8,
    }

    impl Signer for PadSigner {
        fn address(&self) -> ParticipantId { self.address }

        fn key_id(&self) -> u64 { 0 }

        fn sign(&self, digest: &[u8; 32]) -> Result<Signature, SignerError> {
            Ok(Signature {
                algo: SigAlgo::EcdsaS256,
                payload: digest.iter().map(|byte| byte ^ self.pad).collect(),
            })
        }

        fn verify(&self, digest: &[u8; 32], signature: &Signature) -> Result<bool, SignerError> {
            Ok(self.sign(digest)? == *signature)
        }
    }

    fn participant(fill: u8) -> ParticipantId {
        Identifier::compose(IdTag::new(IdKind::Participant, 0).unwrap(), 0, [0; 2], [fill; 24], 0)
            .try_into()
            .unwrap()
    }

    fn asset(fill: u8) -> moiapi::AssetId {
        Identifier::compose(IdTag::new(IdKind::Asset, 0).unwrap(), 0, [0; 2], [fill; 24], 0)
            .try_into()
            .unwrap()
    }

    fn request() -> InteractionRequest {
        let sender = Sender {
            address: participant(0x48),
            sequence_id: 1,
            key_id: 0,
        };
        InteractionRequest::new(sender, 1, 200).add_operation(Operation::AssetTransfer(AssetTransfer {
            asset_id: asset(0xAA),
            beneficiary: participant(0x11),
            amount: 5,
        }))
    }

    #[test]
    fn signing_is_deterministic_and_verifiable() {
        let registry = OpRegistry::standard();
        let signer = PadSigner {
            address: participant(0x48),
            pad: 0x5A,
        };
        let signed = sign_interaction(&request(), &signer, &registry).unwrap();
        let again = sign_interaction(&request(), &signer, &registry).unwrap();
        assert_eq!(signed, again);
        assert_eq!(signed.signatures.len(), 1);
        assert_eq!(signed.signatures[0].address, participant(0x48));
        let digest = ix_digest(&signed.interaction);
        assert!(signer.verify(&digest, &signed.signatures[0].signature).unwrap());
    }

    #[test]
    fn invalid_requests_are_never_signed() {
        let registry = OpRegistry::standard();
        let signer = PadSigner {
            address: participant(0x48),
            pad: 0x5A,
        };
        let mut bad = request();
        bad.fuel_limit = 0;
        assert!(matches!(sign_interaction(&bad, &signer, &registry), Err(SignError::Invalid(_))));
    }

    #[test]
    fn interaction_hex_is_prefixed() {
        let registry = OpRegistry::standard();
        let signer = PadSigner {
            address: participant(0x48),
            pad: 0x01,
        };
        let signed = sign_interaction(&request(), &signer, &registry).unwrap();
        assert!(signed.interaction_hex().starts_with("0x0e"));
    }
}
